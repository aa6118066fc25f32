//! Structural substrate shared by the plain and the balanced tree.
//!
//! Nothing in here looks at balance factors, except `swap_nodes` callers and
//! the consistency check, which read them from the outside.

use std::borrow::Borrow;
use std::cmp::{self, Ordering};
use std::marker::PhantomData;

use crate::node::{Link, LinkPtr, Node, NodePtr};

pub(crate) struct RawTree<K, V> {
    pub(crate) root: Link<K, V>,
    num_nodes: usize,
    marker: PhantomData<Box<Node<K, V>>>,
}

/// Outcome of a structural insert.
pub(crate) enum Leaf<K, V> {
    /// A new leaf has been attached.
    Vacant(NodePtr<K, V>),
    /// The key was present; its value has been replaced.
    Occupied(V),
}

#[allow(clippy::enum_variant_names)]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

// The tree owns all of its nodes, raw links never escape it.
unsafe impl<K: Send, V: Send> Send for RawTree<K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for RawTree<K, V> {}

impl<K, V> RawTree<K, V> {
    pub(crate) const fn new() -> Self {
        Self {
            root: None,
            num_nodes: 0,
            marker: PhantomData,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub(crate) fn len(&self) -> usize {
        self.num_nodes
    }

    pub(crate) fn clear(&mut self) {
        if self.num_nodes > 0 {
            log::debug!("clearing tree with {} nodes", self.num_nodes);
        }
        self.postorder(|node_ptr| unsafe {
            Node::destroy(node_ptr);
        });
        self.root = None;
        self.num_nodes = 0;
    }

    pub(crate) fn smallest(&self) -> Link<K, V> {
        self.root.map(|root_ptr| unsafe { Self::leftmost(root_ptr) })
    }

    pub(crate) fn largest(&self) -> Link<K, V> {
        self.root.map(|root_ptr| unsafe { Self::rightmost(root_ptr) })
    }

    unsafe fn leftmost(mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
        while let Some(left_ptr) = node_ptr.as_ref().left {
            node_ptr = left_ptr;
        }
        node_ptr
    }

    unsafe fn rightmost(mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
        while let Some(right_ptr) = node_ptr.as_ref().right {
            node_ptr = right_ptr;
        }
        node_ptr
    }

    /// Returns the node holding the next smaller key.
    pub(crate) unsafe fn predecessor(node_ptr: NodePtr<K, V>) -> Link<K, V> {
        if let Some(left_ptr) = node_ptr.as_ref().left {
            return Some(Self::rightmost(left_ptr));
        }
        // Climb until we leave a right subtree
        let mut current = node_ptr;
        while let Some(parent_ptr) = current.as_ref().parent {
            if parent_ptr.as_ref().right == Some(current) {
                return Some(parent_ptr);
            }
            current = parent_ptr;
        }
        None
    }

    /// Returns the node holding the next larger key.
    pub(crate) unsafe fn successor(node_ptr: NodePtr<K, V>) -> Link<K, V> {
        if let Some(right_ptr) = node_ptr.as_ref().right {
            return Some(Self::leftmost(right_ptr));
        }
        // Climb until we leave a left subtree
        let mut current = node_ptr;
        while let Some(parent_ptr) = current.as_ref().parent {
            if parent_ptr.as_ref().left == Some(current) {
                return Some(parent_ptr);
            }
            current = parent_ptr;
        }
        None
    }

    /// Detaches a node with at most one child and splices that child into
    /// its slot. Returns the former parent. The node itself is not freed.
    pub(crate) unsafe fn unlink(&mut self, node_ptr: NodePtr<K, V>) -> Link<K, V> {
        let node = node_ptr.as_ref();
        assert!(
            node.left.is_none() || node.right.is_none(),
            "unlink requires a node with at most one child"
        );
        debug_assert!(self.num_nodes >= 1);

        let child = node.left.or(node.right);
        let parent = node.parent;
        if let Some(mut child_ptr) = child {
            child_ptr.as_mut().parent = parent;
        }
        match parent {
            None => self.root = child,
            Some(mut parent_ptr) => {
                if parent_ptr.as_ref().left == Some(node_ptr) {
                    parent_ptr.as_mut().left = child;
                } else {
                    parent_ptr.as_mut().right = child;
                }
            }
        }
        self.num_nodes -= 1;
        parent
    }

    /// Exchanges the positions of two nodes in the tree.
    ///
    /// Every other node keeps its parent and children. Handles the case of
    /// `n1` and `n2` being parent and child of each other.
    pub(crate) unsafe fn swap_nodes(&mut self, mut n1: NodePtr<K, V>, mut n2: NodePtr<K, V>) {
        if n1 == n2 {
            return;
        }

        let n1_parent = n1.as_ref().parent;
        let n1_left = n1.as_ref().left;
        let n1_right = n1.as_ref().right;
        let n1_is_left = Node::is_left_child(n1);

        let n2_parent = n2.as_ref().parent;
        let n2_left = n2.as_ref().left;
        let n2_right = n2.as_ref().right;
        let n2_is_left = Node::is_left_child(n2);

        n1.as_mut().parent = n2_parent;
        n1.as_mut().left = n2_left;
        n1.as_mut().right = n2_right;
        n2.as_mut().parent = n1_parent;
        n2.as_mut().left = n1_left;
        n2.as_mut().right = n1_right;

        // Adjacent nodes would otherwise end up pointing at themselves
        if n1_right == Some(n2) {
            n2.as_mut().right = Some(n1);
            n1.as_mut().parent = Some(n2);
        } else if n2_right == Some(n1) {
            n1.as_mut().right = Some(n2);
            n2.as_mut().parent = Some(n1);
        } else if n1_left == Some(n2) {
            n2.as_mut().left = Some(n1);
            n1.as_mut().parent = Some(n2);
        } else if n2_left == Some(n1) {
            n1.as_mut().left = Some(n2);
            n2.as_mut().parent = Some(n1);
        }

        // Redirect surrounding nodes
        Self::relink(n1_parent, n1_is_left, n1_left, n1_right, n1, n2);
        Self::relink(n2_parent, n2_is_left, n2_left, n2_right, n2, n1);

        if self.root == Some(n1) {
            self.root = Some(n2);
        } else if self.root == Some(n2) {
            self.root = Some(n1);
        }
    }

    // Points the former neighbours of `from` at `to`, skipping `to` itself.
    unsafe fn relink(
        parent: Link<K, V>,
        is_left: bool,
        left: Link<K, V>,
        right: Link<K, V>,
        from: NodePtr<K, V>,
        to: NodePtr<K, V>,
    ) {
        debug_assert!(from != to);
        if let Some(mut parent_ptr) = parent {
            if parent_ptr != to {
                if is_left {
                    parent_ptr.as_mut().left = Some(to);
                } else {
                    parent_ptr.as_mut().right = Some(to);
                }
            }
        }
        if let Some(mut left_ptr) = left {
            if left_ptr != to {
                left_ptr.as_mut().parent = Some(to);
            }
        }
        if let Some(mut right_ptr) = right {
            if right_ptr != to {
                right_ptr.as_mut().parent = Some(to);
            }
        }
    }

    /// Promotes the right child of `node_ptr` into its place.
    /// Balance factors are left untouched.
    pub(crate) unsafe fn rotate_left(&mut self, mut node_ptr: NodePtr<K, V>) {
        let Some(mut right_ptr) = node_ptr.as_ref().right else {
            unreachable!("rotate_left requires a right child");
        };

        node_ptr.as_mut().right = right_ptr.as_ref().left;
        if let Some(mut right_left_ptr) = right_ptr.as_ref().left {
            right_left_ptr.as_mut().parent = Some(node_ptr);
        }

        right_ptr.as_mut().parent = node_ptr.as_ref().parent;
        match node_ptr.as_ref().parent {
            None => self.root = Some(right_ptr),
            Some(mut parent_ptr) => {
                if parent_ptr.as_ref().left == Some(node_ptr) {
                    parent_ptr.as_mut().left = Some(right_ptr);
                } else {
                    parent_ptr.as_mut().right = Some(right_ptr);
                }
            }
        }

        right_ptr.as_mut().left = Some(node_ptr);
        node_ptr.as_mut().parent = Some(right_ptr);
    }

    /// Promotes the left child of `node_ptr` into its place.
    /// Balance factors are left untouched.
    pub(crate) unsafe fn rotate_right(&mut self, mut node_ptr: NodePtr<K, V>) {
        let Some(mut left_ptr) = node_ptr.as_ref().left else {
            unreachable!("rotate_right requires a left child");
        };

        node_ptr.as_mut().left = left_ptr.as_ref().right;
        if let Some(mut left_right_ptr) = left_ptr.as_ref().right {
            left_right_ptr.as_mut().parent = Some(node_ptr);
        }

        left_ptr.as_mut().parent = node_ptr.as_ref().parent;
        match node_ptr.as_ref().parent {
            None => self.root = Some(left_ptr),
            Some(mut parent_ptr) => {
                if parent_ptr.as_ref().left == Some(node_ptr) {
                    parent_ptr.as_mut().left = Some(left_ptr);
                } else {
                    parent_ptr.as_mut().right = Some(left_ptr);
                }
            }
        }

        left_ptr.as_mut().right = Some(node_ptr);
        node_ptr.as_mut().parent = Some(left_ptr);
    }

    /// Number of nodes on the longest path from the root to a leaf,
    /// recomputed from scratch.
    pub(crate) fn height(&self) -> usize {
        let mut height = 0;
        self.subtree_heights(|_, left_height, right_height| {
            height = cmp::max(left_height, right_height) + 1;
        });
        height
    }

    /// Returns whether the subtree heights of every node differ by at most one.
    pub(crate) fn is_balanced(&self) -> bool {
        let mut balanced = true;
        self.subtree_heights(|_, left_height, right_height| {
            balanced &= left_height.abs_diff(right_height) <= 1;
        });
        balanced
    }

    /// Visits every node in post order along with the heights of its left
    /// and right subtree.
    pub(crate) fn subtree_heights<F>(&self, mut f: F)
    where
        F: FnMut(NodePtr<K, V>, usize, usize),
    {
        // Post order finishes both subtrees right before their parent,
        // so pending heights can live on a plain stack.
        let mut heights: Vec<usize> = Vec::new();
        self.postorder(|node_ptr| unsafe {
            let right_height = match node_ptr.as_ref().right {
                None => 0,
                Some(_) => heights.pop().unwrap_or_default(),
            };
            let left_height = match node_ptr.as_ref().left {
                None => 0,
                Some(_) => heights.pop().unwrap_or_default(),
            };
            f(node_ptr, left_height, right_height);
            heights.push(cmp::max(left_height, right_height) + 1);
        });
        debug_assert!(heights.len() <= 1);
    }

    #[cfg(any(test, feature = "consistency_check"))]
    pub(crate) fn preorder<F: FnMut(NodePtr<K, V>)>(&self, f: F) {
        self.traverse(f, |_| {}, |_| {});
    }

    pub(crate) fn postorder<F: FnMut(NodePtr<K, V>)>(&self, f: F) {
        self.traverse(|_| {}, |_| {}, f);
    }

    fn traverse<Pre, In, Post>(&self, mut preorder: Pre, mut inorder: In, mut postorder: Post)
    where
        Pre: FnMut(NodePtr<K, V>),
        In: FnMut(NodePtr<K, V>),
        Post: FnMut(NodePtr<K, V>),
    {
        if let Some(mut node_ptr) = self.root {
            let mut dir = Direction::FromParent;
            loop {
                match dir {
                    Direction::FromParent => {
                        preorder(node_ptr);
                        if let Some(left_ptr) = unsafe { node_ptr.as_ref().left } {
                            node_ptr = left_ptr;
                        } else {
                            dir = Direction::FromLeft;
                        }
                    }
                    Direction::FromLeft => {
                        inorder(node_ptr);
                        if let Some(right_ptr) = unsafe { node_ptr.as_ref().right } {
                            node_ptr = right_ptr;
                            dir = Direction::FromParent;
                        } else {
                            dir = Direction::FromRight;
                        }
                    }
                    Direction::FromRight => {
                        // Post order traversal is used for node deletion,
                        // so make sure not to use node pointer after postorder call.
                        if let Some(parent_ptr) = unsafe { node_ptr.as_ref().parent } {
                            if Some(node_ptr) == unsafe { parent_ptr.as_ref().left } {
                                dir = Direction::FromLeft;
                            } else {
                                dir = Direction::FromRight;
                            }
                            postorder(node_ptr);
                            node_ptr = parent_ptr;
                        } else {
                            postorder(node_ptr);
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl<K: Ord, V> RawTree<K, V> {
    pub(crate) fn find<Q>(&self, key: &Q) -> Link<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;
        while let Some(node_ptr) = current {
            current = unsafe {
                match key.cmp(node_ptr.as_ref().key.borrow()) {
                    Ordering::Equal => break,
                    Ordering::Less => node_ptr.as_ref().left,
                    Ordering::Greater => node_ptr.as_ref().right,
                }
            }
        }
        current
    }

    /// Attaches a new leaf at the position dictated by key order, or
    /// overwrites the value if the key is already present.
    pub(crate) fn insert_leaf(&mut self, key: K, value: V) -> Leaf<K, V> {
        let mut parent: Link<K, V> = None;
        let mut link_ptr: LinkPtr<K, V> = unsafe { LinkPtr::new_unchecked(&mut self.root) };
        unsafe {
            while let Some(mut node_ptr) = *link_ptr.as_ref() {
                link_ptr = match key.cmp(&node_ptr.as_ref().key) {
                    Ordering::Equal => {
                        let old = std::mem::replace(&mut node_ptr.as_mut().value, value);
                        return Leaf::Occupied(old);
                    }
                    Ordering::Less => LinkPtr::new_unchecked(&mut node_ptr.as_mut().left),
                    Ordering::Greater => LinkPtr::new_unchecked(&mut node_ptr.as_mut().right),
                };
                parent = Some(node_ptr);
            }
            let node_ptr = Node::create(parent, key, value);
            *link_ptr.as_mut() = Some(node_ptr);
            self.num_nodes += 1;
            Leaf::Vacant(node_ptr)
        }
    }

    /// Asserts parent links, key order and the node count.
    #[cfg(any(test, feature = "consistency_check"))]
    pub(crate) fn check_links(&self) {
        unsafe {
            // Check root link
            if let Some(root_node_ptr) = self.root {
                assert!(root_node_ptr.as_ref().parent.is_none());
            }

            // Check tree nodes
            let mut num_nodes = 0;
            self.preorder(|node_ptr| {
                // Check link for left child node
                if let Some(left_ptr) = node_ptr.as_ref().left {
                    assert!(left_ptr.as_ref().parent == Some(node_ptr));
                    assert!(left_ptr.as_ref().key < node_ptr.as_ref().key);
                }

                // Check link for right child node
                if let Some(right_ptr) = node_ptr.as_ref().right {
                    assert!(right_ptr.as_ref().parent == Some(node_ptr));
                    assert!(right_ptr.as_ref().key > node_ptr.as_ref().key);
                }

                num_nodes += 1;
            });

            // Check in-order sequence is strictly ascending
            let mut current = self.smallest();
            while let Some(node_ptr) = current {
                current = Self::successor(node_ptr);
                if let Some(next_ptr) = current {
                    assert!(node_ptr.as_ref().key < next_ptr.as_ref().key);
                }
            }

            // Check number of nodes
            assert_eq!(num_nodes, self.num_nodes);
        }
    }
}

impl<K: Clone, V: Clone> Clone for RawTree<K, V> {
    /// Copies the tree node by node, keeping its exact shape and balance factors.
    fn clone(&self) -> Self {
        let mut other = RawTree::new();
        let Some(src_root) = self.root else {
            return other;
        };
        unsafe {
            let mut src_ptr = src_root;
            let mut dst_ptr = Self::clone_node(None, src_ptr);
            other.root = Some(dst_ptr);
            loop {
                if let (Some(src_left), None) = (src_ptr.as_ref().left, dst_ptr.as_ref().left) {
                    let dst_left = Self::clone_node(Some(dst_ptr), src_left);
                    dst_ptr.as_mut().left = Some(dst_left);
                    src_ptr = src_left;
                    dst_ptr = dst_left;
                } else if let (Some(src_right), None) =
                    (src_ptr.as_ref().right, dst_ptr.as_ref().right)
                {
                    let dst_right = Self::clone_node(Some(dst_ptr), src_right);
                    dst_ptr.as_mut().right = Some(dst_right);
                    src_ptr = src_right;
                    dst_ptr = dst_right;
                } else {
                    match (src_ptr.as_ref().parent, dst_ptr.as_ref().parent) {
                        (Some(src_parent), Some(dst_parent)) => {
                            src_ptr = src_parent;
                            dst_ptr = dst_parent;
                        }
                        _ => break,
                    }
                }
            }
        }
        other.num_nodes = self.num_nodes;
        other
    }
}

impl<K: Clone, V: Clone> RawTree<K, V> {
    unsafe fn clone_node(parent: Link<K, V>, src_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
        let src = src_ptr.as_ref();
        let mut node_ptr = Node::create(parent, src.key.clone(), src.value.clone());
        node_ptr.as_mut().balance = src.balance;
        node_ptr
    }
}

impl<K, V> Drop for RawTree<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}
