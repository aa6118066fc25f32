//! Cursors and in-order iterators shared by the map types.

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::node::{Link, Node};
use crate::tree::RawTree;

/// A read-only position inside a tree.
///
/// A cursor either points at an entry or at the end of the sequence.
/// Moving past the last entry lands on the end, moving from the end does nothing.
pub struct Cursor<'a, K, V> {
    current: Link<K, V>,
    marker: PhantomData<&'a Node<K, V>>,
}

impl<'a, K, V> Cursor<'a, K, V> {
    pub(crate) fn new(current: Link<K, V>) -> Self {
        Self {
            current,
            marker: PhantomData,
        }
    }

    /// Returns true if the cursor is past the last entry.
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Returns the key at the cursor position.
    pub fn key(&self) -> Option<&'a K> {
        self.key_value().map(|kv| kv.0)
    }

    /// Returns the value at the cursor position.
    pub fn value(&self) -> Option<&'a V> {
        self.key_value().map(|kv| kv.1)
    }

    /// Returns the entry at the cursor position.
    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        self.current.map(|node_ptr| {
            let node = unsafe { &*node_ptr.as_ptr() };
            (&node.key, &node.value)
        })
    }

    /// Advances to the entry with the next larger key.
    pub fn move_next(&mut self) {
        if let Some(node_ptr) = self.current {
            self.current = unsafe { RawTree::successor(node_ptr) };
        }
    }
}

// Shared access to the tree, like `&'a Node`.
unsafe impl<K: Sync, V: Sync> Send for Cursor<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for Cursor<'_, K, V> {}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        Self::new(self.current)
    }
}

impl<K, V> PartialEq for Cursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current
    }
}

impl<K, V> Eq for Cursor<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Cursor<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key_value() {
            None => f.write_str("Cursor(end)"),
            Some(kv) => f.debug_tuple("Cursor").field(&kv).finish(),
        }
    }
}

/// An iterator over the entries of a map, sorted by key.
pub struct Iter<'a, K, V> {
    front: Link<K, V>,
    back: Link<K, V>,
    remaining: usize,
    marker: PhantomData<&'a Node<K, V>>,
}

/// A mutable iterator over the entries of a map, sorted by key.
pub struct IterMut<'a, K, V> {
    front: Link<K, V>,
    back: Link<K, V>,
    remaining: usize,
    marker: PhantomData<&'a mut Node<K, V>>,
}

/// An iterator over the keys of a map.
pub struct Keys<'a, K, V> {
    iter: Iter<'a, K, V>,
}

/// An iterator over the values of a map.
pub struct Values<'a, K, V> {
    iter: Iter<'a, K, V>,
}

/// A mutable iterator over the values of a map.
pub struct ValuesMut<'a, K, V> {
    iter: IterMut<'a, K, V>,
}

/// An owning iterator over the entries of a map.
pub struct IntoIter<K, V> {
    tree: RawTree<K, V>,
}

unsafe impl<K: Sync, V: Sync> Send for Iter<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for Iter<'_, K, V> {}

// Hands out `&K` and `&mut V`.
unsafe impl<K: Sync, V: Send> Send for IterMut<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for IterMut<'_, K, V> {}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(tree: &'a RawTree<K, V>) -> Self {
        Self {
            front: tree.smallest(),
            back: tree.largest(),
            remaining: tree.len(),
            marker: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node_ptr = self.front?;
        self.remaining -= 1;
        unsafe {
            self.front = RawTree::successor(node_ptr);
            let node = &*node_ptr.as_ptr();
            Some((&node.key, &node.value))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node_ptr = self.back?;
        self.remaining -= 1;
        unsafe {
            self.back = RawTree::predecessor(node_ptr);
            let node = &*node_ptr.as_ptr();
            Some((&node.key, &node.value))
        }
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            front: self.front,
            back: self.back,
            remaining: self.remaining,
            marker: PhantomData,
        }
    }
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(tree: &'a mut RawTree<K, V>) -> Self {
        Self {
            front: tree.smallest(),
            back: tree.largest(),
            remaining: tree.len(),
            marker: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node_ptr = self.front?;
        self.remaining -= 1;
        unsafe {
            self.front = RawTree::successor(node_ptr);
            // Each node is handed out at most once.
            let node = &mut *node_ptr.as_ptr();
            Some((&node.key, &mut node.value))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node_ptr = self.back?;
        self.remaining -= 1;
        unsafe {
            self.back = RawTree::predecessor(node_ptr);
            let node = &mut *node_ptr.as_ptr();
            Some((&node.key, &mut node.value))
        }
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) fn new(iter: Iter<'a, K, V>) -> Self {
        Self { iter }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|kv| kv.0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.iter.next_back().map(|kv| kv.0)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<'a, K, V> Values<'a, K, V> {
    pub(crate) fn new(iter: Iter<'a, K, V>) -> Self {
        Self { iter }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|kv| kv.1)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.iter.next_back().map(|kv| kv.1)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<'a, K, V> ValuesMut<'a, K, V> {
    pub(crate) fn new(iter: IterMut<'a, K, V>) -> Self {
        Self { iter }
    }
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|kv| kv.1)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ValuesMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.iter.next_back().map(|kv| kv.1)
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(tree: RawTree<K, V>) -> Self {
        Self { tree }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        // The smallest node never has a left child, so it unlinks directly.
        let node_ptr = self.tree.smallest()?;
        unsafe {
            self.tree.unlink(node_ptr);
            Some(Node::destroy(node_ptr))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.tree.len(), Some(self.tree.len()))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let node_ptr = self.tree.largest()?;
        unsafe {
            self.tree.unlink(node_ptr);
            Some(Node::destroy(node_ptr))
        }
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}
