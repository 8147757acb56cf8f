use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::marker::PhantomData;
use std::mem::swap;
use std::ptr::NonNull;

use log::trace;

use crate::{DuplicateKey, KeyNotFound};

mod iter;
mod node;

pub use iter::Iter;
use node::Color::{Black, Red};
use node::{Link, Node};

/// An ordered set of unique keys kept balanced with red-black colouring.
///
/// Every node is red or black, the root is black, no red node has a red child and every path from
/// a node down to an empty link passes through the same number of black nodes. Together these keep
/// the height below `2 * log2(n + 1)`, so [`insert`](Self::insert), [`delete`](Self::delete) and
/// [`contains`](Self::contains) are all `O(log n)`.
///
/// The tree is not internally synchronized. Share it between threads behind a
/// [`RwLock`](std::sync::RwLock): mutations take the write lock, lookups and iteration the read
/// lock.
pub struct Rbtree<K> {
    root: Link<K>,
    len: usize,
    marker: PhantomData<Box<Node<K>>>,
}

unsafe impl<K: Send> Send for Rbtree<K> {}
// Shared references only ever read through the tree.
unsafe impl<K: Sync> Sync for Rbtree<K> {}

impl<K> Default for Rbtree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Drop for Rbtree<K> {
    fn drop(&mut self) {
        if let Some(root) = self.root.take() {
            unsafe { Node::destroy_tree(root) }
        }
    }
}

impl<K> Rbtree<K> {
    /// Creates an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self { root: None, len: 0, marker: PhantomData }
    }

    /// Returns the number of keys in the tree.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree holds no keys.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns an iterator over the keys in ascending order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter::new(self.root, self.len)
    }

    // Points the slot that referred to `old` at `new`. With no parent that slot is the root.
    fn relink(&mut self, parent: Link<K>, old: NonNull<Node<K>>, new: Link<K>) {
        match parent {
            Some(p) => Node::replace_child(p, old, new),
            None => self.root = new,
        }
    }

    fn rotate_left(&mut self, node: NonNull<Node<K>>) {
        let lifted = Node::rotate_left(node);
        self.relink(Node::parent(lifted), node, Some(lifted));
    }

    fn rotate_right(&mut self, node: NonNull<Node<K>>) {
        let lifted = Node::rotate_right(node);
        self.relink(Node::parent(lifted), node, Some(lifted));
    }
}

// c - current
// p - parent
// g - grandparent
// s - sibling
impl<K: Ord> Rbtree<K> {
    fn find_node<Q>(&self, key: &Q) -> Option<NonNull<Node<K>>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut n = self.root?;

        loop {
            let nb = unsafe { n.as_ref() };
            let next = match key.cmp(nb.key.borrow()) {
                Ordering::Equal => break,
                Ordering::Less => nb.left,
                Ordering::Greater => nb.right,
            };

            n = next?;
        }

        Some(n)
    }

    /// Returns `true` if the tree contains `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key).is_some()
    }

    /// Inserts `key` and rebalances.
    ///
    /// # Errors
    /// Returns the key inside [`DuplicateKey`] if an equal key is already present. The tree is
    /// unchanged in that case.
    pub fn insert(&mut self, key: K) -> Result<(), DuplicateKey<K>> {
        let Some(mut p) = self.root else {
            let node = Node::alloc(key, None);
            self.root = Some(node);
            self.len += 1;
            self.fix_after_insert(node);
            return Ok(());
        };

        let left = loop {
            let pb = unsafe { p.as_ref() };
            let (next, left) = match key.cmp(&pb.key) {
                Ordering::Equal => return Err(DuplicateKey(key)),
                Ordering::Less => (pb.left, true),
                Ordering::Greater => (pb.right, false),
            };

            match next {
                None => break left,
                Some(next) => p = next,
            }
        };

        let node = Node::alloc(key, Some(p));
        let pb = unsafe { p.as_mut() };
        if left {
            pb.left = Some(node);
        } else {
            pb.right = Some(node);
        }

        self.len += 1;
        self.fix_after_insert(node);
        Ok(())
    }

    /// Removes `key` and rebalances, returning the key that was stored in the tree.
    ///
    /// # Errors
    /// Returns [`KeyNotFound`] if no equal key is present. The tree is unchanged in that case.
    pub fn delete<Q>(&mut self, key: &Q) -> Result<K, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut n = self.find_node(key).ok_or(KeyNotFound)?;

        let nb = unsafe { n.as_mut() };
        // Ensure the node has at most one child by trading keys with its successor and unlinking
        // the successor instead.
        let n = if let (Some(_), Some(right)) = (nb.left, nb.right) {
            let mut s = Node::leftmost(right);
            swap(&mut nb.key, &mut unsafe { s.as_mut() }.key);
            s
        } else {
            n
        };

        self.unlink(n);
        self.len -= 1;

        // By now there are no other pointers to n and it can be dropped.
        let n = unsafe { Box::from_raw(n.as_ptr()) };
        Ok(n.key)
    }

    // Detaches a node with at most one child, promoting that child into its slot.
    fn unlink(&mut self, n: NonNull<Node<K>>) {
        let nb = unsafe { n.as_ref() };
        let child = match (nb.left, nb.right) {
            (Some(_), Some(_)) => unreachable!(),
            (l, r) => l.or(r),
        };

        if nb.color == Black {
            if Node::link_color(child) == Red {
                // The child takes over the removed black.
                Node::paint(child.expect("Red link cannot be None"), Black);
            } else {
                // Removing n leaves a black deficit on its side. n stands in for the empty link
                // that will replace it until the deficit has been pushed out.
                self.fix_black_node_before_delete(n);
            }
        }

        // The fixup may have rotated n under a different parent.
        let p = Node::parent(n);
        if let Some(mut c) = child {
            unsafe { c.as_mut() }.parent = p;
        }
        self.relink(p, n, child);
    }

    fn fix_after_insert(&mut self, node: NonNull<Node<K>>) {
        let mut c = node;
        loop {
            let Some(mut p) = Node::parent(c) else {
                // We've reached the root, and it cannot be red
                Node::paint(c, Black);
                return;
            };

            if Node::color(p) == Black {
                return;
            }

            let g = Node::parent(p).expect("Red parent cannot be the root");

            if let Some(u) = Node::uncle(c) {
                if Node::color(u) == Red {
                    // The uncle is red, push the redness up to g and continue from there
                    trace!("insert fixup: red uncle, recolouring");
                    Node::paint(p, Black);
                    Node::paint(u, Black);
                    Node::paint(g, Red);
                    c = g;
                    continue;
                }
            }

            // c is on the inside of g, rotate it out so it replaces p
            if Node::is_right_child(p) && Node::is_left_child(c) {
                trace!("insert fixup: inner grandchild, rotating parent right");
                self.rotate_right(p);
                p = c;
            } else if Node::is_left_child(p) && Node::is_right_child(c) {
                trace!("insert fixup: inner grandchild, rotating parent left");
                self.rotate_left(p);
                p = c;
            }

            trace!("insert fixup: outer grandchild, rotating grandparent");
            Node::paint(p, Black);
            Node::paint(g, Red);
            if Node::is_right_child(p) {
                self.rotate_left(g);
            } else {
                self.rotate_right(g);
            }
            return;
        }
    }

    // node is black, attached and one black short compared to its sibling subtree. A non-root
    // node in that position always has a sibling.
    fn fix_black_node_before_delete(&mut self, node: NonNull<Node<K>>) {
        let mut c = node;
        while let Some(p) = Node::parent(c) {
            let left = Node::is_left_child(c);
            let sibling = |c: NonNull<Node<K>>| {
                Node::sibling(c).expect("Non-root black node must have sibling")
            };

            let mut s = sibling(c);
            if Node::color(s) == Red {
                // Make s black and rotate it into p's place so c gets a black sibling
                trace!("delete fixup: red sibling, rotating parent");
                Node::paint(s, Black);
                Node::paint(p, Red);
                if left {
                    self.rotate_left(p);
                } else {
                    self.rotate_right(p);
                }
                s = sibling(c);
            }

            let (near, far) = {
                let sb = unsafe { s.as_ref() };
                if left { (sb.left, sb.right) } else { (sb.right, sb.left) }
            };

            if Node::link_color(near) == Black && Node::link_color(far) == Black {
                Node::paint(s, Red);
                if Node::color(p) == Black {
                    // p, s and both its children are black. Taking a black from s balances p's
                    // subtree but p itself is now short, continue up the tree
                    trace!("delete fixup: black family, moving up");
                    c = p;
                    continue;
                }

                // Swap the redness of p down onto s
                trace!("delete fixup: red parent, recolouring");
                Node::paint(p, Black);
                return;
            }

            if Node::link_color(far) == Black {
                // Only the near child is red, rotate it onto s so the far side is red
                trace!("delete fixup: red near nephew, rotating sibling");
                let near = near.expect("Red link cannot be None");
                Node::paint(near, Black);
                Node::paint(s, Red);
                if left {
                    self.rotate_right(s);
                } else {
                    self.rotate_left(s);
                }
                s = near;
            }

            // s is black with a red far child. Rotate s onto p, taking p's colour, and make both
            // its children black.
            trace!("delete fixup: red far nephew, rotating parent");
            Node::paint(s, Node::color(p));
            Node::paint(p, Black);
            let sb = unsafe { s.as_ref() };
            let far = if left { sb.right } else { sb.left };
            Node::paint(far.expect("Red far child cannot be None"), Black);
            if left {
                self.rotate_left(p);
            } else {
                self.rotate_right(p);
            }
            return;
        }
    }
}

impl<K: Display> Display for Rbtree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            Some(root) => Display::fmt(unsafe { root.as_ref() }, f),
            None => f.write_str("Empty tree."),
        }
    }
}

impl<K: Debug> Debug for Rbtree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, K> IntoIterator for &'a Rbtree<K> {
    type IntoIter = Iter<'a, K>;
    type Item = &'a K;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
impl<K: Ord> Node<K> {
    // Returns (black height, height)
    fn verify(&self) -> (usize, usize) {
        let side = |child: Link<K>, left: bool| match child {
            None => (0, 0, false),
            Some(c) => {
                let cb = unsafe { c.as_ref() };
                assert!(std::ptr::eq(self, cb.parent.unwrap().as_ptr()));

                if left {
                    assert!(cb.key < self.key);
                } else {
                    assert!(cb.key > self.key);
                }

                let (black, height) = cb.verify();
                (black, height, cb.color == Red)
            }
        };

        let (l_black, l_height, l_red) = side(self.left, true);
        let (r_black, r_height, r_red) = side(self.right, false);

        // red nodes cannot have red children
        assert!(self.color == Black || !(l_red || r_red));
        assert_eq!(l_black, r_black);

        let black = if self.color == Red { l_black } else { l_black + 1 };
        (black, 1 + l_height.max(r_height))
    }
}

#[cfg(test)]
impl<K: Ord> Rbtree<K> {
    // Asserts every invariant and returns the height of the tree.
    fn verify(&self) -> usize {
        match self.root {
            None => {
                assert_eq!(self.len, 0);
                0
            }
            Some(root) => {
                let rb = unsafe { root.as_ref() };

                assert!(rb.parent.is_none());
                assert_eq!(rb.color, Black);
                assert_eq!(self.iter().count(), self.len);
                assert!(self.iter().zip(self.iter().skip(1)).all(|(a, b)| a < b));

                let (_, height) = rb.verify();
                height
            }
        }
    }
}
