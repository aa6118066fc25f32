use avlbst::{AvlTreeMap, AvlTreeSet, BinarySearchTree};

fn main() {
    let mut map = AvlTreeMap::new();
    map.insert(0, "zero");
    map.insert(1, "one");
    map.insert(2, "two");
    map.insert(2, "two");
    map.insert(3, "three");
    map.insert(4, "four");
    map.insert(5, "five");
    assert_eq!(map.get(&1), Some(&"one"));
    map.remove(&1);
    assert!(map.get(&1).is_none());
    assert!(map.at(&1).is_err());

    for (k, v) in &map {
        println!("{k} => {v}");
    }

    let mut cursor = map.find(&3);
    while let Some((k, v)) = cursor.key_value() {
        println!("from 3: {k} => {v}");
        cursor.move_next();
    }

    let mut set = AvlTreeSet::new();
    for x in 0..5 {
        set.insert(x);
    }
    assert!(set.contains(&1));
    set.remove(&1);
    assert!(!set.contains(&1));

    print!("{{ ");
    for x in &set {
        print!("{x}, ");
    }
    println!("}}");

    let mut balanced = AvlTreeMap::new();
    let mut plain = BinarySearchTree::new();
    for x in 0..1_000 {
        balanced.insert(x, ());
        plain.insert(x, ());
    }
    println!(
        "height after 1000 ascending inserts: avl {}, plain {}",
        balanced.height(),
        plain.height()
    );
}
