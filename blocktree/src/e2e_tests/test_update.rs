//! Updates overwrite values in place and never change the tree's shape.

use crate::btree::BTreeError;
use crate::e2e_tests::helpers::{SMALL_BLOCK, create_index, insert_all, key, memory_store};

#[test]
fn test_update_after_splits() {
    let mut store = memory_store(SMALL_BLOCK, 256);
    let mut index = create_index(&mut store);
    insert_all(&mut index, 1..=40);

    let height = index.height().expect("height");
    let root = index.root_block();
    let free = index.free_block_count().expect("free");

    for n in 1..=40 {
        let new_value = format!("u{n:07}").into_bytes();
        index.update(&key(n), &new_value).expect("update");
    }

    for n in 1..=40 {
        assert_eq!(
            index.lookup(&key(n)).expect("lookup"),
            format!("u{n:07}").into_bytes()
        );
    }
    assert_eq!(index.height().expect("height"), height);
    assert_eq!(index.root_block(), root);
    assert_eq!(index.free_block_count().expect("free"), free);
    assert_eq!(index.key_count(), 40);
    index.sanity_check().expect("sane");
}

#[test]
fn test_update_separator_key() {
    let mut store = memory_store(SMALL_BLOCK, 64);
    let mut index = create_index(&mut store);
    // Splitting at key 5 copies key 4 up as the separator.
    insert_all(&mut index, 1..=5);

    index.update(&key(4), b"newvalue").expect("update");
    assert_eq!(index.lookup(&key(4)).expect("lookup"), b"newvalue");
}

#[test]
fn test_update_unknown_key() {
    let mut store = memory_store(SMALL_BLOCK, 64);
    let mut index = create_index(&mut store);
    insert_all(&mut index, 1..=10);

    assert!(matches!(
        index.update(&key(11), b"newvalue"),
        Err(BTreeError::NotFound)
    ));
}
