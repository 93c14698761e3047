//! A full leaf splits exactly once into two leaves under the root.

use crate::btree::node::Node;
use crate::e2e_tests::helpers::{
    SMALL_BLOCK, all_keys, create_index, insert_all, key, leaves, memory_store,
};

#[test]
fn test_slots_ascending_keys_split_once() {
    let mut store = memory_store(512, 64);
    let mut index = create_index(&mut store);
    let slots = u32::try_from(index.geometry().leaf_slots()).expect("slots");

    insert_all(&mut index, 0..slots);

    let Node::Root(root) = index.read_node(index.root_block()).expect("read") else {
        panic!("root block is not a root");
    };
    assert_eq!(root.keys.len(), 1);
    assert_eq!(root.children.len(), 2);

    let leaves = leaves(&mut index);
    assert_eq!(leaves.len(), 2);
    // Lower half keeps ceil(slots / 2).
    assert_eq!(leaves[0].1.entries.len(), slots.div_ceil(2) as usize);
    assert_eq!(leaves[1].1.entries.len(), (slots / 2) as usize);
    // The separator is a copy of the right leaf's first key.
    assert_eq!(root.keys[0], leaves[1].1.entries[0].key);

    let expected: Vec<Vec<u8>> = (0..slots).map(key).collect();
    assert_eq!(all_keys(&mut index), expected);
    index.sanity_check().expect("sane");
}

#[test]
fn test_one_short_of_slots_does_not_split() {
    let mut store = memory_store(512, 64);
    let mut index = create_index(&mut store);
    let max = u32::try_from(index.geometry().max_leaf_keys()).expect("max");

    insert_all(&mut index, 0..max);

    assert_eq!(leaves(&mut index).len(), 1);
    assert_eq!(index.free_block_count().expect("free"), 64 - 3);
}

#[test]
fn test_interior_split_moves_median_up() {
    let mut store = memory_store(SMALL_BLOCK, 64);
    let mut index = create_index(&mut store);

    // Leaf splits at 5, 8, 11 fill the root with 3 keys; the split at 14
    // pushes a fourth key in and the root splits.
    insert_all(&mut index, 1..=14);

    let Node::Root(root) = index.read_node(index.root_block()).expect("read") else {
        panic!("root block is not a root");
    };
    assert_eq!(root.keys, vec![key(10)]);

    let mut halves = Vec::new();
    for child in &root.children {
        let Node::Interior(node) = index.read_node(*child).expect("read") else {
            panic!("child {child} is not an interior node");
        };
        halves.push(node.keys);
    }
    // The median is in neither half.
    assert_eq!(halves, vec![vec![key(4), key(7)], vec![key(13)]]);
    index.sanity_check().expect("sane");
}
