//! Five keys into a fresh 8/8/512 index.

use crate::btree::{BTreeError, DisplayFormat};
use crate::e2e_tests::helpers::{create_index, memory_store};

const KEYS: [&[u8; 8]; 5] = [b"00000001", b"00000002", b"00000003", b"00000004", b"00000005"];
const VALUES: [&[u8; 8]; 5] = [b"value001", b"value002", b"value003", b"value004", b"value005"];

#[test]
fn test_insert_and_lookup_five_keys() {
    let mut store = memory_store(512, 64);
    let mut index = create_index(&mut store);

    for (key, value) in KEYS.iter().zip(VALUES) {
        index.insert(*key, value).expect("insert");
    }

    for (key, value) in KEYS.iter().zip(VALUES) {
        assert_eq!(index.lookup(*key).expect("lookup"), value);
    }
    assert_eq!(index.key_count(), 5);
    index.sanity_check().expect("sane");
}

#[test]
fn test_reinsert_conflicts() {
    let mut store = memory_store(512, 64);
    let mut index = create_index(&mut store);

    for (key, value) in KEYS.iter().zip(VALUES) {
        index.insert(*key, value).expect("insert");
    }

    for key in KEYS {
        assert!(matches!(
            index.insert(key, b"another!"),
            Err(BTreeError::Conflict)
        ));
    }
    assert_eq!(index.lookup(b"00000003").expect("lookup"), b"value003");
}

#[test]
fn test_missing_key_not_found() {
    let mut store = memory_store(512, 64);
    let mut index = create_index(&mut store);

    for (key, value) in KEYS.iter().zip(VALUES) {
        index.insert(*key, value).expect("insert");
    }

    assert!(matches!(
        index.lookup(b"00000000"),
        Err(BTreeError::NotFound)
    ));
    assert!(matches!(
        index.lookup(b"00000006"),
        Err(BTreeError::NotFound)
    ));
}

#[test]
fn test_single_leaf_layout() {
    let mut store = memory_store(512, 64);
    let mut index = create_index(&mut store);

    for (key, value) in KEYS.iter().zip(VALUES).rev() {
        index.insert(*key, value).expect("insert");
    }

    assert_eq!(index.height().expect("height"), 1);
    assert_eq!(
        index.display(DisplayFormat::SortedKeyValue).expect("display"),
        "(00000001,value001)\n(00000002,value002)\n(00000003,value003)\n\
         (00000004,value004)\n(00000005,value005)\n"
    );
}
