//! A file-backed index survives detach, close and reopen.

use tempfile::tempdir;

use crate::btree::{BTreeError, BTreeIndex, Layout};
use crate::e2e_tests::helpers::{LAYOUT, SMALL_BLOCK, insert_all, key, value};
use crate::store::FileStore;

#[test]
fn test_reopen_file_store() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("index.db");

    let root = {
        let mut store = FileStore::create(&path, SMALL_BLOCK, 256).expect("create store");
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");
        insert_all(&mut index, 1..=100);
        let root = index.root_block();
        index.detach().expect("detach");
        store.sync().expect("sync");
        root
    };

    let mut store = FileStore::open(&path, SMALL_BLOCK).expect("open store");
    let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, false).expect("mount");

    assert_eq!(index.root_block(), root);
    assert_eq!(index.key_count(), 100);
    index.sanity_check().expect("sane");
    for n in 1..=100 {
        assert_eq!(index.lookup(&key(n)).expect("lookup"), value(n));
    }

    // Keep growing after the reopen.
    insert_all(&mut index, 101..=150);
    index.sanity_check().expect("sane");
}

#[test]
fn test_mount_with_different_layout() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("index.db");

    {
        let mut store = FileStore::create(&path, 512, 16).expect("create store");
        BTreeIndex::attach(&mut store, 0, LAYOUT, true)
            .expect("attach")
            .detach()
            .expect("detach");
    }

    let mut store = FileStore::open(&path, 512).expect("open store");
    let result = BTreeIndex::attach(&mut store, 0, Layout::new(16, 8), false);
    assert!(matches!(
        result,
        Err(BTreeError::LayoutMismatch {
            field: "key_size",
            ..
        })
    ));
}

#[test]
fn test_mount_with_different_block_size() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("index.db");

    {
        let mut store = FileStore::create(&path, 512, 16).expect("create store");
        BTreeIndex::attach(&mut store, 0, LAYOUT, true)
            .expect("attach")
            .detach()
            .expect("detach");
    }

    // 8192 bytes read back as 32 blocks of 256.
    let mut store = FileStore::open(&path, 256).expect("open store");
    assert!(BTreeIndex::attach(&mut store, 0, LAYOUT, false).is_err());
}
