//! Balance factor maintenance after a single structural edit.
//!
//! Balance factors are `height(right) - height(left)` and are updated
//! incrementally while walking up from the edit site. Subtree heights are
//! never recomputed here.

use super::AvlTreeMap;
use crate::node::NodePtr;

impl<K: Ord, V> AvlTreeMap<K, V> {
    /// Accounts for a freshly attached leaf at its parent and starts the
    /// upward fix-up if the parent's subtree grew.
    pub(super) unsafe fn rebalance_after_insert(&mut self, node_ptr: NodePtr<K, V>) {
        debug_assert_eq!(node_ptr.as_ref().balance, 0);
        let Some(mut parent_ptr) = node_ptr.as_ref().parent else {
            // New root
            return;
        };
        if parent_ptr.as_ref().left == Some(node_ptr) {
            parent_ptr.as_mut().balance -= 1;
        } else {
            parent_ptr.as_mut().balance += 1;
        }
        // Parent was leaning the other way, height unchanged
        if parent_ptr.as_ref().balance == 0 {
            log::trace!("insert fix-up: absorbed at parent");
            return;
        }
        self.insert_fix(parent_ptr, node_ptr);
    }

    /// Propagates a height increase of `parent_ptr`'s subtree upwards.
    /// `current_ptr` is the child of `parent_ptr` whose subtree grew.
    unsafe fn insert_fix(&mut self, mut parent_ptr: NodePtr<K, V>, mut current_ptr: NodePtr<K, V>) {
        while let Some(mut grand_ptr) = parent_ptr.as_ref().parent {
            if grand_ptr.as_ref().left == Some(parent_ptr) {
                grand_ptr.as_mut().balance -= 1;
                match grand_ptr.as_ref().balance {
                    0 => {
                        log::trace!("insert fix-up: absorbed");
                        return;
                    }
                    -1 => {}
                    -2 => {
                        if parent_ptr.as_ref().left == Some(current_ptr) {
                            log::trace!("insert fix-up: single right rotation");
                            self.tree.rotate_right(grand_ptr);
                            parent_ptr.as_mut().balance = 0;
                            grand_ptr.as_mut().balance = 0;
                        } else {
                            log::trace!("insert fix-up: left-right double rotation");
                            let current_balance = current_ptr.as_ref().balance;
                            self.tree.rotate_left(parent_ptr);
                            self.tree.rotate_right(grand_ptr);
                            let (parent_balance, grand_balance) = match current_balance {
                                -1 => (0, 1),
                                0 => (0, 0),
                                1 => (-1, 0),
                                _ => unreachable!("balance factor out of range"),
                            };
                            parent_ptr.as_mut().balance = parent_balance;
                            grand_ptr.as_mut().balance = grand_balance;
                            current_ptr.as_mut().balance = 0;
                        }
                        return;
                    }
                    _ => unreachable!("balance factor out of range"),
                }
            } else {
                grand_ptr.as_mut().balance += 1;
                match grand_ptr.as_ref().balance {
                    0 => {
                        log::trace!("insert fix-up: absorbed");
                        return;
                    }
                    1 => {}
                    2 => {
                        if parent_ptr.as_ref().right == Some(current_ptr) {
                            log::trace!("insert fix-up: single left rotation");
                            self.tree.rotate_left(grand_ptr);
                            parent_ptr.as_mut().balance = 0;
                            grand_ptr.as_mut().balance = 0;
                        } else {
                            log::trace!("insert fix-up: right-left double rotation");
                            let current_balance = current_ptr.as_ref().balance;
                            self.tree.rotate_right(parent_ptr);
                            self.tree.rotate_left(grand_ptr);
                            let (parent_balance, grand_balance) = match current_balance {
                                1 => (0, -1),
                                0 => (0, 0),
                                -1 => (1, 0),
                                _ => unreachable!("balance factor out of range"),
                            };
                            parent_ptr.as_mut().balance = parent_balance;
                            grand_ptr.as_mut().balance = grand_balance;
                            current_ptr.as_mut().balance = 0;
                        }
                        return;
                    }
                    _ => unreachable!("balance factor out of range"),
                }
            }
            // Grandparent's subtree grew as well, keep climbing
            current_ptr = parent_ptr;
            parent_ptr = grand_ptr;
        }
    }

    /// Propagates a height decrease below `node_ptr` upwards.
    ///
    /// `diff` is `1` if the left subtree of `node_ptr` shrank and `-1` if the
    /// right one did; it is added to the stored balance factor.
    pub(super) unsafe fn rebalance_after_remove(&mut self, node_ptr: NodePtr<K, V>, diff: i8) {
        let mut current = Some(node_ptr);
        let mut diff = diff;
        while let Some(mut node_ptr) = current {
            // Where the next step comes from has to be read before rotating.
            let parent = node_ptr.as_ref().parent;
            let next_diff = match parent {
                None => 0,
                Some(parent_ptr) if parent_ptr.as_ref().left == Some(node_ptr) => 1,
                Some(_) => -1,
            };

            let balance = node_ptr.as_ref().balance + diff;
            match (diff, balance) {
                (-1, -2) => {
                    let mut child_ptr = Self::taller_child(node_ptr, balance);
                    match child_ptr.as_ref().balance {
                        -1 => {
                            log::trace!("remove fix-up: single right rotation");
                            self.tree.rotate_right(node_ptr);
                            node_ptr.as_mut().balance = 0;
                            child_ptr.as_mut().balance = 0;
                        }
                        0 => {
                            log::trace!("remove fix-up: single right rotation, height kept");
                            self.tree.rotate_right(node_ptr);
                            node_ptr.as_mut().balance = -1;
                            child_ptr.as_mut().balance = 1;
                            return;
                        }
                        1 => {
                            log::trace!("remove fix-up: left-right double rotation");
                            let Some(mut grand_ptr) = child_ptr.as_ref().right else {
                                unreachable!("right-heavy child has a right child");
                            };
                            let grand_balance = grand_ptr.as_ref().balance;
                            self.tree.rotate_left(child_ptr);
                            self.tree.rotate_right(node_ptr);
                            let (node_balance, child_balance) = match grand_balance {
                                1 => (0, -1),
                                0 => (0, 0),
                                -1 => (1, 0),
                                _ => unreachable!("balance factor out of range"),
                            };
                            node_ptr.as_mut().balance = node_balance;
                            child_ptr.as_mut().balance = child_balance;
                            grand_ptr.as_mut().balance = 0;
                        }
                        _ => unreachable!("balance factor out of range"),
                    }
                }
                (1, 2) => {
                    let mut child_ptr = Self::taller_child(node_ptr, balance);
                    match child_ptr.as_ref().balance {
                        1 => {
                            log::trace!("remove fix-up: single left rotation");
                            self.tree.rotate_left(node_ptr);
                            node_ptr.as_mut().balance = 0;
                            child_ptr.as_mut().balance = 0;
                        }
                        0 => {
                            log::trace!("remove fix-up: single left rotation, height kept");
                            self.tree.rotate_left(node_ptr);
                            node_ptr.as_mut().balance = 1;
                            child_ptr.as_mut().balance = -1;
                            return;
                        }
                        -1 => {
                            log::trace!("remove fix-up: right-left double rotation");
                            let Some(mut grand_ptr) = child_ptr.as_ref().left else {
                                unreachable!("left-heavy child has a left child");
                            };
                            let grand_balance = grand_ptr.as_ref().balance;
                            self.tree.rotate_right(child_ptr);
                            self.tree.rotate_left(node_ptr);
                            let (node_balance, child_balance) = match grand_balance {
                                -1 => (0, 1),
                                0 => (0, 0),
                                1 => (-1, 0),
                                _ => unreachable!("balance factor out of range"),
                            };
                            node_ptr.as_mut().balance = node_balance;
                            child_ptr.as_mut().balance = child_balance;
                            grand_ptr.as_mut().balance = 0;
                        }
                        _ => unreachable!("balance factor out of range"),
                    }
                }
                (-1, -1) | (1, 1) => {
                    // The other side still holds the height
                    log::trace!("remove fix-up: height kept, stopping");
                    node_ptr.as_mut().balance = balance;
                    return;
                }
                (-1, 0) | (1, 0) => {
                    node_ptr.as_mut().balance = 0;
                }
                _ => unreachable!("balance factor out of range"),
            }

            current = parent;
            diff = next_diff;
        }
    }

    /// Picks the child with the taller subtree given the node's effective
    /// balance factor. Equal heights pick the right child.
    unsafe fn taller_child(node_ptr: NodePtr<K, V>, balance: i8) -> NodePtr<K, V> {
        let node = node_ptr.as_ref();
        let child = if balance < 0 { node.left } else { node.right };
        match child {
            Some(child_ptr) => child_ptr,
            None => unreachable!("unbalanced node lacks its taller child"),
        }
    }
}
