//! Running out of blocks fails cleanly.

use crate::btree::BTreeError;
use crate::e2e_tests::helpers::{SMALL_BLOCK, create_index, key, memory_store, value};

#[test]
fn test_insert_until_no_space() {
    let mut store = memory_store(SMALL_BLOCK, 12);
    let mut index = create_index(&mut store);

    let mut inserted = 0;
    let failure = loop {
        match index.insert(&key(inserted), &value(inserted)) {
            Ok(()) => inserted += 1,
            Err(e) => break e,
        }
        assert!(inserted < 1000, "store never filled up");
    };

    assert!(matches!(failure, BTreeError::NoSpace));
    assert!(inserted > 4);
    assert_eq!(index.key_count(), u64::from(inserted));

    index.sanity_check().expect("tree intact after NoSpace");
    for n in 0..inserted {
        assert_eq!(index.lookup(&key(n)).expect("lookup"), value(n));
    }
    assert!(matches!(
        index.lookup(&key(inserted)),
        Err(BTreeError::NotFound)
    ));

    // Still out of space on retry, and still intact.
    assert!(matches!(
        index.insert(&key(inserted), &value(inserted)),
        Err(BTreeError::NoSpace)
    ));
    index.sanity_check().expect("tree intact after retry");
}

#[test]
fn test_first_insert_without_free_blocks() {
    // Superblock and root only.
    let mut store = memory_store(512, 2);
    let mut index = create_index(&mut store);

    assert!(matches!(
        index.insert(&key(1), &value(1)),
        Err(BTreeError::NoSpace)
    ));
    assert_eq!(index.height().expect("height"), 1);
    index.sanity_check().expect("sane");
}
