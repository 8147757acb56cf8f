use std::iter::FusedIterator;
use std::marker::PhantomData;

use super::node::{Link, Node};

/// An ascending iterator over the keys of an [`Rbtree`](crate::Rbtree).
///
/// Nodes are visited lazily by following successor links, so the iterator holds no stack.
/// Clone it to restart from the same position.
pub struct Iter<'a, K> {
    next: Link<K>,
    remaining: usize,
    marker: PhantomData<&'a K>,
}

impl<K> Iter<'_, K> {
    pub(super) fn new(root: Link<K>, len: usize) -> Self {
        Self {
            next: root.map(Node::leftmost),
            remaining: len,
            marker: PhantomData,
        }
    }
}

unsafe impl<K: Sync> Send for Iter<'_, K> {}
unsafe impl<K: Sync> Sync for Iter<'_, K> {}

impl<K> Clone for Iter<'_, K> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = Node::successor(node);
        self.remaining -= 1;

        // The tree is borrowed for 'a so the node outlives the returned reference.
        Some(unsafe { &(*node.as_ptr()).key })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K> FusedIterator for Iter<'_, K> {}

#[cfg(test)]
mod tests {
    use crate::Rbtree;

    #[test]
    fn empty() {
        let rb: Rbtree<u8> = Rbtree::new();
        let mut it = rb.iter();
        assert_eq!(it.len(), 0);
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn ascending() {
        let mut rb = Rbtree::new();
        for k in [50, 20, 80, 10, 30, 70, 90, 60, 40] {
            rb.insert(k).unwrap();
        }

        let keys: Vec<_> = rb.iter().copied().collect();
        assert_eq!(keys, [10, 20, 30, 40, 50, 60, 70, 80, 90]);

        let mut n = 0;
        for k in &rb {
            assert!(rb.contains(k));
            n += 1;
        }
        assert_eq!(n, rb.len());
    }

    #[test]
    fn restartable() {
        let mut rb = Rbtree::new();
        for k in "hello world".chars().filter(|c| !c.is_whitespace()) {
            let _ = rb.insert(k);
        }

        let mut it = rb.iter();
        assert_eq!(it.len(), 7);
        assert_eq!(it.next(), Some(&'d'));
        assert_eq!(it.next(), Some(&'e'));

        let rest: String = it.clone().collect();
        assert_eq!(rest, "hlorw");
        assert_eq!(it.len(), 5);
        assert_eq!(it.collect::<String>(), "hlorw");

        assert_eq!(rb.iter().collect::<String>(), "dehlorw");
    }
}
