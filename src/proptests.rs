use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

use crate::tests::{raw_tree, swapped, topology};

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, u32),
    Remove(u16),
    Get(u16),
}

fn key_strategy() -> impl Strategy<Value = u16> + Clone {
    // Small key space so removes and overwrites actually hit
    0u16..512
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        50 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        30 => key.clone().prop_map(Op::Remove),
        20 => key.clone().prop_map(Op::Get),
    ];
    prop::collection::vec(op, 0..=600)
}

fn height_bound(len: usize) -> f64 {
    1.45 * ((len + 2) as f64).log2()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_avl_equivalence(ops in ops_strategy()) {
        let mut map: AvlTreeMap<u16, u32> = AvlTreeMap::new();
        let mut model: BTreeMap<u16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    prop_assert_eq!(map.insert(key, value), model.insert(key, value));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(map.remove(&key), model.remove(&key));
                    prop_assert!(map.find(&key).is_end());
                }
                Op::Get(key) => {
                    prop_assert_eq!(map.get(&key), model.get(&key));
                    prop_assert_eq!(map.at(&key).ok(), model.get(&key));
                }
            }

            map.check_consistency();
            prop_assert!(map.is_balanced());
            prop_assert_eq!(map.len(), model.len());
            prop_assert!((map.height() as f64) <= height_bound(map.len()));
        }

        let got: Vec<(u16, u32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u16, u32)> = model.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_bst_equivalence(ops in ops_strategy()) {
        let mut tree: BinarySearchTree<u16, u32> = BinarySearchTree::new();
        let mut model: BTreeMap<u16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    prop_assert_eq!(tree.insert(key, value), model.insert(key, value));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(tree.remove(&key), model.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(tree.get(&key), model.get(&key));
                }
            }
            prop_assert_eq!(tree.len(), model.len());
        }

        tree.check_consistency();
        let got: Vec<u16> = tree.keys().copied().collect();
        let expected: Vec<u16> = model.keys().copied().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_insert_all_remove_all(keys in prop::collection::vec(any::<i32>(), 0..300), seed in any::<u64>()) {
        use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

        let mut map = AvlTreeMap::new();
        for &key in &keys {
            map.insert(key, ());
            prop_assert!(map.is_balanced());
        }

        let mut unique = keys.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(map.keys().copied().collect::<Vec<_>>(), unique.clone());

        unique.shuffle(&mut StdRng::seed_from_u64(seed));
        for key in &unique {
            prop_assert_eq!(map.remove(key), Some(()));
            map.check_consistency();
            prop_assert!(map.is_balanced());
        }
        prop_assert!(map.is_empty());
        prop_assert_eq!(map.height(), 0);
    }

    #[test]
    fn prop_swap_nodes(keys in prop::collection::btree_set(any::<i32>(), 1..64), a in any::<prop::sample::Index>(), b in any::<prop::sample::Index>()) {
        let keys: Vec<i32> = keys.into_iter().collect();
        // Insert in a scrambled but deterministic order to get varied shapes
        let mut order = keys.clone();
        order.sort_by_key(|key| key.wrapping_mul(0x9E37_79B9u32 as i32));
        let mut tree = raw_tree(&order);

        let a = *a.get(&keys);
        let b = *b.get(&keys);
        let before = topology(&tree);
        let (Some(a_ptr), Some(b_ptr)) = (tree.find(&a), tree.find(&b)) else {
            panic!("keys to swap must be in the tree");
        };
        unsafe { tree.swap_nodes(a_ptr, b_ptr) };
        prop_assert_eq!(topology(&tree), swapped(&before, a, b));

        unsafe { tree.swap_nodes(a_ptr, b_ptr) };
        prop_assert_eq!(topology(&tree), before);
        tree.check_links();
    }
}

#[test]
fn exhaustive_insert_remove_small_set() {
    fn for_each_permutation(items: &mut Vec<i32>, k: usize, f: &mut impl FnMut(&[i32])) {
        if k == items.len() {
            f(items.as_slice());
            return;
        }
        for i in k..items.len() {
            items.swap(k, i);
            for_each_permutation(items, k + 1, f);
            items.swap(k, i);
        }
    }

    let mut keys: Vec<i32> = (0..6).collect();
    for_each_permutation(&mut keys, 0, &mut |perm| {
        let mut map = AvlTreeMap::new();
        for &key in perm {
            map.insert(key, key);
            map.check_consistency();
        }
        assert_eq!(map.height(), 3);

        // Remove in the same order the keys went in
        for &key in perm {
            assert_eq!(map.remove(&key), Some(key));
            map.check_consistency();
        }
        assert!(map.is_empty());
    });
}
