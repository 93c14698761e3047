//! Attaching at a block other than 0.

use crate::btree::{BTreeIndex, Layout};
use crate::e2e_tests::helpers::{LAYOUT, insert_all, key, memory_store, value};
use crate::store::{Block, BlockStore};

#[test]
fn test_blocks_before_attach_point_untouched() {
    let mut store = memory_store(512, 64);
    {
        let mut index = BTreeIndex::attach(&mut store, 10, LAYOUT, true).expect("attach");
        assert_eq!(index.root_block(), 11);
        insert_all(&mut index, 1..=100);
        index.sanity_check().expect("sane");
        assert_eq!(index.detach().expect("detach"), 10);
    }

    for block in 0..10 {
        assert_eq!(store.read_block(block).expect("read"), Block::zeroed(512));
        assert!(!store.is_allocated(block));
    }

    let mut index = BTreeIndex::attach(&mut store, 10, LAYOUT, false).expect("mount");
    assert_eq!(index.lookup(&key(77)).expect("lookup"), value(77));
}

#[test]
fn test_attach_with_wider_values() {
    let mut store = memory_store(512, 64);
    {
        let mut index = BTreeIndex::attach(&mut store, 32, Layout::new(8, 16), true)
            .expect("attach");
        index.insert(&key(1), b"sixteen-byte-val").expect("insert");
        index.detach().expect("detach");
    }

    let mut index = BTreeIndex::attach(&mut store, 32, Layout::new(8, 16), false).expect("mount");
    assert_eq!(index.lookup(&key(1)).expect("lookup"), b"sixteen-byte-val");
    // Superblock, root and one leaf.
    assert_eq!(index.free_block_count().expect("free"), 64 - 32 - 3);
}
