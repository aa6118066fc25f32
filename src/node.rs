use std::ptr::NonNull;

pub(crate) type NodePtr<K, V> = NonNull<Node<K, V>>;
pub(crate) type Link<K, V> = Option<NodePtr<K, V>>;
pub(crate) type LinkPtr<K, V> = NonNull<Link<K, V>>;

/// A single tree node.
///
/// Children are owned through the tree, `parent` is a back link used only for
/// walking upwards. `balance` is `height(right) - height(left)` and is only
/// maintained by the AVL map; the plain search tree leaves it at zero.
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) parent: Link<K, V>,
    pub(crate) left: Link<K, V>,
    pub(crate) right: Link<K, V>,
    pub(crate) balance: i8,
}

impl<K, V> Node<K, V> {
    pub(crate) fn create(parent: Link<K, V>, key: K, value: V) -> NodePtr<K, V> {
        let boxed = Box::new(Node {
            key,
            value,
            parent,
            left: None,
            right: None,
            balance: 0,
        });
        unsafe { NodePtr::new_unchecked(Box::into_raw(boxed)) }
    }

    /// Frees the node and hands back its entry.
    ///
    /// # Safety
    ///
    /// `node_ptr` must have been returned by `create` and must no longer be
    /// reachable from any live node.
    pub(crate) unsafe fn destroy(node_ptr: NodePtr<K, V>) -> (K, V) {
        let boxed = Box::from_raw(node_ptr.as_ptr());
        (boxed.key, boxed.value)
    }

    /// Returns whether `node_ptr` hangs off the left of its parent.
    /// False for the root.
    pub(crate) unsafe fn is_left_child(node_ptr: NodePtr<K, V>) -> bool {
        match node_ptr.as_ref().parent {
            None => false,
            Some(parent_ptr) => parent_ptr.as_ref().left == Some(node_ptr),
        }
    }
}
