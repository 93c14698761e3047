//! Height grows when the first leaf splits and whenever the root splits.

use crate::btree::{BTreeError, BTreeIndex, Layout};
use crate::e2e_tests::helpers::{
    SMALL_BLOCK, create_index, insert_all, key, leaves, memory_store, value,
};

/// 8-byte keys with 100-byte values in 572-byte blocks: leaves hold at most
/// 4 keys while the root has room for 32.
const WIDE: Layout = Layout::new(8, 100);
const WIDE_BLOCK: usize = 572;

fn wide_value(n: u32) -> Vec<u8> {
    let mut v = value(n);
    v.resize(WIDE.value_size, b'.');
    v
}

#[test]
fn test_ascending_one_to_twenty_grows_once() {
    let mut store = memory_store(WIDE_BLOCK, 64);
    let mut index = BTreeIndex::attach(&mut store, 0, WIDE, true).expect("attach");
    assert_eq!(index.geometry().max_leaf_keys(), 4);
    assert_eq!(index.height().expect("height"), 1);

    let mut changes = Vec::new();
    let mut height = 1;
    for n in 1..=20 {
        index.insert(&key(n), &wide_value(n)).expect("insert");

        let now = index.height().expect("height");
        if now != height {
            changes.push((n, height, now));
            height = now;
        }

        index.sanity_check().expect("sane after every insert");
        for (block, leaf) in leaves(&mut index) {
            assert!(
                leaf.entries.len() <= 4,
                "leaf {block} holds {} keys",
                leaf.entries.len()
            );
        }
    }

    // The 5th key splits the only leaf and gives the root its first key.
    assert_eq!(changes, vec![(5, 1, 2)]);

    for n in 1..=20 {
        assert_eq!(index.lookup(&key(n)).expect("lookup"), wide_value(n));
    }
    assert!(matches!(index.lookup(&key(21)), Err(BTreeError::NotFound)));
}

#[test]
fn test_root_split_adds_a_level() {
    let mut store = memory_store(SMALL_BLOCK, 64);
    let mut index = create_index(&mut store);
    assert_eq!(index.geometry().max_leaf_keys(), 4);
    assert_eq!(index.geometry().max_interior_keys(), 3);

    let mut heights = Vec::new();
    for n in 1..=20 {
        index.insert(&key(n), &value(n)).expect("insert");
        heights.push(index.height().expect("height"));
    }

    // 2 once the first leaf splits at key 5, 3 once the root splits at key 14.
    let mut expected = vec![1; 4];
    expected.extend([2; 9]);
    expected.extend([3; 7]);
    assert_eq!(heights, expected);
    index.sanity_check().expect("sane");
}

#[test]
fn test_deep_tree_stays_consistent() {
    let mut store = memory_store(SMALL_BLOCK, 2048);
    let mut index = create_index(&mut store);

    insert_all(&mut index, 1..=400);

    assert!(index.height().expect("height") >= 4);
    index.sanity_check().expect("sane");
    assert_eq!(index.key_count(), 400);
    for n in (1..=400).step_by(7) {
        assert_eq!(index.lookup(&key(n)).expect("lookup"), value(n));
    }
}

#[test]
fn test_descending_inserts() {
    let mut store = memory_store(SMALL_BLOCK, 1024);
    let mut index = create_index(&mut store);

    insert_all(&mut index, (1..=200).rev());

    index.sanity_check().expect("sane");
    for n in 1..=200 {
        assert_eq!(index.lookup(&key(n)).expect("lookup"), value(n));
    }
}
