//! Rejected inserts and repeated lookups leave the tree unchanged.

use crate::btree::{BTreeError, DisplayFormat};
use crate::e2e_tests::helpers::{SMALL_BLOCK, create_index, insert_all, key, memory_store, value};

#[test]
fn test_conflict_leaves_tree_unchanged() {
    let mut store = memory_store(SMALL_BLOCK, 256);
    let mut index = create_index(&mut store);
    insert_all(&mut index, 1..=30);

    let before = index.display(DisplayFormat::Depth).expect("display");
    let free_before = index.free_block_count().expect("free");

    for n in 1..=30 {
        assert!(matches!(
            index.insert(&key(n), b"xxxxxxxx"),
            Err(BTreeError::Conflict)
        ));
    }

    assert_eq!(index.display(DisplayFormat::Depth).expect("display"), before);
    assert_eq!(index.free_block_count().expect("free"), free_before);
    assert_eq!(index.key_count(), 30);
}

#[test]
fn test_conflict_in_full_leaf_allocates_nothing() {
    let mut store = memory_store(SMALL_BLOCK, 64);
    let mut index = create_index(&mut store);
    // One leaf holding its maximum of four keys.
    insert_all(&mut index, 1..=4);
    let free_before = index.free_block_count().expect("free");

    assert!(matches!(
        index.insert(&key(2), &value(2)),
        Err(BTreeError::Conflict)
    ));
    assert_eq!(index.free_block_count().expect("free"), free_before);
}

#[test]
fn test_lookup_is_idempotent() {
    let mut store = memory_store(SMALL_BLOCK, 256);
    let mut index = create_index(&mut store);
    insert_all(&mut index, 1..=25);
    let before = index.display(DisplayFormat::DepthDot).expect("display");

    for n in 1..=25 {
        let first = index.lookup(&key(n)).expect("lookup");
        let second = index.lookup(&key(n)).expect("lookup");
        assert_eq!(first, second);
    }

    assert_eq!(index.display(DisplayFormat::DepthDot).expect("display"), before);
}
