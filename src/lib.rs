//! An ordered map and set backed by an AVL tree.
//!
//! Each node stores the height difference of its two subtrees. Inserts and
//! removals update these balance factors on the way back up from the edit and
//! rotate where a node leans by two, so lookups, inserts and removals stay
//! O(log n) for any insertion order.
//!
//! [`BinarySearchTree`] exposes the same node structure without rebalancing.
//!
//! ```
//! use avlbst::AvlTreeMap;
//! let mut map = AvlTreeMap::new();
//! for key in 1..=7 {
//!     map.insert(key, key * 10);
//! }
//! assert_eq!(map.height(), 3);
//! assert_eq!(map.at(&4), Ok(&40));
//! assert!(map.at(&8).is_err());
//! assert!(map.find(&8).is_end());
//! ```

mod bst;
mod error;
pub mod iter;
mod map;
mod node;
pub mod set;
mod tree;

pub use bst::BinarySearchTree;
pub use error::KeyError;
pub use iter::Cursor;
pub use map::AvlTreeMap;
pub use set::AvlTreeSet;


#[cfg(test)]
mod proptests;
