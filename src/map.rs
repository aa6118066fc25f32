//! An ordered map implemented with an AVL tree.

use std::borrow::Borrow;
use std::fmt;
use std::iter::FromIterator;
use std::ops::Index;

use crate::error::KeyError;
use crate::iter::{Cursor, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use crate::node::{Node, NodePtr};
use crate::tree::{Leaf, RawTree};

mod rebalance;

/// An ordered map implemented with an AVL tree.
///
/// Every node carries the height difference of its subtrees, which insert and
/// remove keep up to date incrementally. Both run in O(log n) regardless of
/// insertion order.
///
/// ```
/// use avlbst::AvlTreeMap;
/// let mut map = AvlTreeMap::new();
/// map.insert(0, "zero");
/// map.insert(1, "one");
/// map.insert(2, "two");
/// assert_eq!(map.get(&1), Some(&"one"));
/// map.remove(&1);
/// assert!(map.get(&1).is_none());
/// assert!(map.is_balanced());
/// ```
pub struct AvlTreeMap<K, V> {
    pub(crate) tree: RawTree<K, V>,
}

impl<K, V> AvlTreeMap<K, V> {
    /// Creates an empty map.
    /// No memory is allocated until the first item is inserted.
    pub const fn new() -> Self {
        Self {
            tree: RawTree::new(),
        }
    }

    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Clears the map, deallocating all memory.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Returns the number of nodes on the longest path from the root to a leaf.
    ///
    /// Follows the balance factors down the taller side, so this takes
    /// O(log n) instead of visiting every node.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.tree.root;
        while let Some(node_ptr) = current {
            height += 1;
            let node = unsafe { node_ptr.as_ref() };
            current = if node.balance < 0 { node.left } else { node.right };
        }
        height
    }

    /// Recomputes all subtree heights and checks that they differ by at most
    /// one at every node.
    ///
    /// This is a diagnostic; insert and remove never call it.
    pub fn is_balanced(&self) -> bool {
        self.tree.is_balanced()
    }

    /// Returns a cursor positioned at the smallest key.
    pub fn cursor_front(&self) -> Cursor<'_, K, V> {
        Cursor::new(self.tree.smallest())
    }

    /// Returns the entry with the smallest key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.cursor_front().key_value()
    }

    /// Returns the entry with the largest key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        Cursor::new(self.tree.largest()).key_value()
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.tree)
    }

    /// Gets a mutable iterator over the entries of the map, sorted by key.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.tree)
    }

    /// Gets an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    /// Gets an iterator over the values of the map, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }

    /// Gets a mutable iterator over the values of the map, in order by key.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut::new(self.iter_mut())
    }
}

impl<K: Ord, V> AvlTreeMap<K, V> {
    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but the ordering
    /// on the borrowed form *must* match the ordering on the key type.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_key_value(key).map(|kv| kv.1)
    }

    /// Returns references to the key-value pair corresponding to the key.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Cursor::new(self.tree.find(key)).key_value()
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree
            .find(key)
            .map(|node_ptr| unsafe { &mut (*node_ptr.as_ptr()).value })
    }

    /// Returns true if the key is in the map, else false.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find(key).is_some()
    }

    /// Returns the value corresponding to the key or an error if the key is
    /// not in the map.
    pub fn at<Q>(&self, key: &Q) -> Result<&V, KeyError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).ok_or(KeyError)
    }

    /// Mutable counterpart of [`at`](Self::at).
    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V, KeyError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_mut(key).ok_or(KeyError)
    }

    /// Returns a cursor positioned at the key, or at the end if the key is
    /// not in the map.
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Cursor::new(self.tree.find(key))
    }

    /// Inserts a key-value pair into the map.
    /// Returns the previous value if the key was already present; the key
    /// itself is kept and only the value is overwritten.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.tree.insert_leaf(key, value) {
            Leaf::Occupied(old_value) => Some(old_value),
            Leaf::Vacant(node_ptr) => {
                unsafe { self.rebalance_after_insert(node_ptr) };
                None
            }
        }
    }

    /// Removes a key from the map.
    /// Returns the value at the key if the key was previously in the map.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|kv| kv.1)
    }

    /// Removes a key from the map, returning the stored key and value if the
    /// key was previously in the map.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node_ptr = self.tree.find(key)?;
        let entry = unsafe { self.remove_node(node_ptr) };
        debug_assert!(self.tree.find(key).is_none());
        Some(entry)
    }

    unsafe fn remove_node(&mut self, node_ptr: NodePtr<K, V>) -> (K, V) {
        let node = node_ptr.as_ref();
        if node.left.is_some() && node.right.is_some() {
            // Move the node down into its predecessor's slot,
            // where it has at most one child.
            let Some(pred_ptr) = RawTree::predecessor(node_ptr) else {
                unreachable!("node with a left child has a predecessor");
            };
            self.swap_nodes(node_ptr, pred_ptr);
        }

        let diff = match node_ptr.as_ref().parent {
            None => 0,
            Some(_) if Node::is_left_child(node_ptr) => 1,
            Some(_) => -1,
        };
        let parent = self.tree.unlink(node_ptr);
        let entry = Node::destroy(node_ptr);
        if let Some(parent_ptr) = parent {
            self.rebalance_after_remove(parent_ptr, diff);
        }
        entry
    }

    /// Swaps tree positions together with their balance factors, since the
    /// balance belongs to the position and not to the entry.
    unsafe fn swap_nodes(&mut self, mut n1: NodePtr<K, V>, mut n2: NodePtr<K, V>) {
        self.tree.swap_nodes(n1, n2);
        std::mem::swap(&mut n1.as_mut().balance, &mut n2.as_mut().balance);
    }

    /// Asserts parent links, key order, node count and that every stored
    /// balance factor matches the actual subtree heights.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        self.tree.check_links();
        self.tree.subtree_heights(|node_ptr, left_height, right_height| {
            let balance = unsafe { node_ptr.as_ref().balance };
            assert_eq!(
                balance as isize,
                right_height as isize - left_height as isize
            );
            assert!((-1..=1).contains(&balance));
        });
        assert_eq!(self.height(), self.tree.height());
    }
}

impl<K, V> Default for AvlTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for AvlTreeMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for AvlTreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for AvlTreeMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, Q, V> Index<&Q> for AvlTreeMap<K, V>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
{
    type Output = V;

    /// Returns a reference to the value corresponding to the supplied key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &Q) -> &V {
        match self.at(key) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlTreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> IntoIterator for AvlTreeMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.tree)
    }
}

impl<'a, K, V> IntoIterator for &'a AvlTreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut AvlTreeMap<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
