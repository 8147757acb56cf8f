#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]
#![doc = include_str!("../../README.md")]

mod error;
mod rbtree;

pub use error::{DuplicateKey, Error, KeyNotFound};
pub use rbtree::{Iter, Rbtree};
