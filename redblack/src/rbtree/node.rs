use std::fmt::{self, Display};
use std::ptr::NonNull;

// Empty child links count as black.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

pub(crate) type Link<K> = Option<NonNull<Node<K>>>;

// Children are owned by their parent, the parent link is only a back-reference used to walk
// upwards during fixups.
pub(crate) struct Node<K> {
    pub(crate) key: K,
    pub(crate) color: Color,
    pub(crate) parent: Link<K>,
    pub(crate) left: Link<K>,
    pub(crate) right: Link<K>,
}

impl<K> Node<K> {
    // New nodes are always red leaves.
    pub(crate) fn alloc(key: K, parent: Link<K>) -> NonNull<Self> {
        let node = Box::new(Self {
            key,
            color: Color::Red,
            parent,
            left: None,
            right: None,
        });
        NonNull::from(Box::leak(node))
    }

    pub(crate) const fn color(node: NonNull<Self>) -> Color {
        unsafe { node.as_ref() }.color
    }

    pub(crate) const fn link_color(link: Link<K>) -> Color {
        match link {
            Some(node) => Self::color(node),
            None => Color::Black,
        }
    }

    pub(crate) fn paint(mut node: NonNull<Self>, color: Color) {
        unsafe { node.as_mut() }.color = color;
    }

    pub(crate) const fn parent(node: NonNull<Self>) -> Link<K> {
        unsafe { node.as_ref() }.parent
    }

    pub(crate) fn is_left_child(node: NonNull<Self>) -> bool {
        match Self::parent(node) {
            Some(p) => unsafe { p.as_ref() }.left == Some(node),
            None => false,
        }
    }

    pub(crate) fn is_right_child(node: NonNull<Self>) -> bool {
        match Self::parent(node) {
            Some(p) => unsafe { p.as_ref() }.right == Some(node),
            None => false,
        }
    }

    pub(crate) fn sibling(node: NonNull<Self>) -> Link<K> {
        let pb = unsafe { Self::parent(node)?.as_ref() };
        if pb.left == Some(node) { pb.right } else { pb.left }
    }

    pub(crate) fn uncle(node: NonNull<Self>) -> Link<K> {
        Self::sibling(Self::parent(node)?)
    }

    pub(crate) fn leftmost(mut node: NonNull<Self>) -> NonNull<Self> {
        while let Some(l) = unsafe { node.as_ref() }.left {
            node = l;
        }
        node
    }

    // The next node in key order, walking up through parent links when there is no right subtree.
    pub(crate) fn successor(node: NonNull<Self>) -> Link<K> {
        if let Some(right) = unsafe { node.as_ref() }.right {
            return Some(Self::leftmost(right));
        }

        let mut c = node;
        while Self::is_right_child(c) {
            c = Self::parent(c)?;
        }
        Self::parent(c)
    }

    // Points whichever child slot of `parent` held `old` at `new`.
    pub(crate) fn replace_child(mut parent: NonNull<Self>, old: NonNull<Self>, new: Link<K>) {
        let pb = unsafe { parent.as_mut() };
        if pb.left == Some(old) {
            pb.left = new;
        } else {
            debug_assert_eq!(pb.right, Some(old), "Node is not a child of its parent");
            pb.right = new;
        }
    }

    // Right child becomes the new subtree root. The slot that referred to `node` (its parent's
    // child link or the tree root) still points at `node` and must be repointed by the caller at
    // the returned node.
    pub(crate) fn rotate_left(mut node: NonNull<Self>) -> NonNull<Self> {
        let nb = unsafe { node.as_mut() };
        let mut r = nb.right.expect("Tried to make None child into parent");
        let rb = unsafe { r.as_mut() };

        nb.right = rb.left.take();
        if let Some(mut moved) = nb.right {
            unsafe { moved.as_mut() }.parent = Some(node);
        }

        rb.left = Some(node);
        rb.parent = nb.parent.replace(r);
        r
    }

    // Left child becomes the new subtree root, see rotate_left.
    pub(crate) fn rotate_right(mut node: NonNull<Self>) -> NonNull<Self> {
        let nb = unsafe { node.as_mut() };
        let mut l = nb.left.expect("Tried to make None child into parent");
        let lb = unsafe { l.as_mut() };

        nb.left = lb.right.take();
        if let Some(mut moved) = nb.left {
            unsafe { moved.as_mut() }.parent = Some(node);
        }

        lb.right = Some(node);
        lb.parent = nb.parent.replace(l);
        l
    }

    // UNSAFE -- All existing pointers to node except parent pointers from its children must be
    // destroyed.
    pub(crate) unsafe fn destroy_tree(mut node: NonNull<Self>) {
        let cur = unsafe { node.as_mut() };
        cur.parent = None;
        unsafe {
            if let Some(left) = cur.left.take() {
                Self::destroy_tree(left);
            }
            if let Some(right) = cur.right.take() {
                Self::destroy_tree(right);
            }
        }

        // By now, all pointers to this node have been destroyed, it's safe to drop and deallocate
        // it when the function returns.
        unsafe {
            drop(Box::from_raw(node.as_ptr()));
        }
    }
}

// Renders the subtree as `(key* left right)`, with `*` marking red nodes and `_` empty children.
impl<K: Display> Display for Node<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let red = if self.color == Color::Red { "*" } else { "" };
        write!(f, "({}{red} ", self.key)?;

        match self.left {
            Some(left) => Display::fmt(unsafe { left.as_ref() }, f)?,
            None => f.write_str("_")?,
        }

        match self.right {
            Some(right) => Display::fmt(unsafe { right.as_ref() }, f)?,
            None => f.write_str(" _")?,
        }

        f.write_str(")")
    }
}
