use thiserror::Error;

/// Returned by [`Rbtree::insert`](crate::Rbtree::insert) when the key is already present. The
/// rejected key is handed back to the caller and the tree is left unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("key is already present in the tree")]
pub struct DuplicateKey<K>(pub K);

impl<K> DuplicateKey<K> {
    /// Recovers the key that could not be inserted.
    pub fn into_key(self) -> K {
        self.0
    }
}

/// Returned by [`Rbtree::delete`](crate::Rbtree::delete) when the key is absent. The tree is left
/// unchanged.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("key not found in the tree")]
pub struct KeyNotFound;

/// Either failure of a tree mutation, for callers that propagate both with `?`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error<K> {
    /// See [`DuplicateKey`].
    #[error(transparent)]
    DuplicateKey(#[from] DuplicateKey<K>),
    /// See [`KeyNotFound`].
    #[error(transparent)]
    KeyNotFound(#[from] KeyNotFound),
}

#[cfg(test)]
mod tests {
    use super::{DuplicateKey, Error, KeyNotFound};

    #[test]
    fn messages() {
        assert_eq!(DuplicateKey(5).to_string(), "key is already present in the tree");
        assert_eq!(KeyNotFound.to_string(), "key not found in the tree");
    }

    #[test]
    fn conversions() {
        let e: Error<u8> = DuplicateKey(3).into();
        assert_eq!(e, Error::DuplicateKey(DuplicateKey(3)));
        assert_eq!(e.to_string(), "key is already present in the tree");

        let e: Error<u8> = KeyNotFound.into();
        assert_eq!(e, Error::KeyNotFound(KeyNotFound));
        assert_eq!(e.to_string(), "key not found in the tree");

        assert_eq!(DuplicateKey("a").into_key(), "a");
    }
}
