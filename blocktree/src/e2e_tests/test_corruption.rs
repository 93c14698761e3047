//! Damaged blocks and store faults surface as errors, never as wrong data.

use crate::btree::node::NodeError;
use crate::btree::{BTreeError, BTreeIndex, DisplayFormat};
use crate::e2e_tests::helpers::{
    LAYOUT, SMALL_BLOCK, create_index, insert_all, key, memory_store, value,
};
use crate::store::{BlockStore, FaultConfig, MemoryStore, StoreError};

#[test]
fn test_flipped_byte_in_leaf() {
    let mut store = memory_store(512, 32);
    let mut index = create_index(&mut store);
    insert_all(&mut index, 1..=10);

    let leaf = index.descend(&key(5)).expect("descend").leaf.expect("leaf").0;
    let mut raw = index.store.read_block(leaf).expect("read");
    raw.as_bytes_mut()[40] ^= 0x04;
    index.store.write_block(leaf, &raw).expect("write");

    assert!(matches!(
        index.lookup(&key(5)),
        Err(BTreeError::Node(NodeError::ChecksumMismatch { .. }))
    ));
    assert!(matches!(
        index.sanity_check(),
        Err(BTreeError::Node(NodeError::ChecksumMismatch { .. }))
    ));
}

#[test]
fn test_corrupted_superblock_refuses_mount() {
    let mut store = memory_store(512, 32);
    {
        let mut index = create_index(&mut store);
        insert_all(&mut index, 1..=3);
        index.detach().expect("detach");
    }

    let mut raw = store.read_block(0).expect("read");
    raw.as_bytes_mut()[33] ^= 0xFF;
    store.write_block(0, &raw).expect("write");

    assert!(matches!(
        BTreeIndex::attach(&mut store, 0, LAYOUT, false),
        Err(BTreeError::Node(NodeError::ChecksumMismatch { .. }))
    ));
}

#[test]
fn test_injected_read_errors() {
    let mut store = MemoryStore::with_faults(512, 32, 1, FaultConfig::no_faults());
    {
        let mut index = create_index(&mut store);
        insert_all(&mut index, 1..=3);
        index.detach().expect("detach");
    }

    store.set_fault_config(FaultConfig {
        read_error_rate: 1.0,
        ..FaultConfig::default()
    });
    assert!(matches!(
        BTreeIndex::attach(&mut store, 0, LAYOUT, false),
        Err(BTreeError::Store(StoreError::InjectedFault(_)))
    ));
}

#[test]
fn test_random_corruption_is_detected() {
    let mut store = MemoryStore::with_faults(512, 32, 9, FaultConfig::no_faults());
    {
        let mut index = create_index(&mut store);
        insert_all(&mut index, 1..=20);
        index.detach().expect("detach");
    }

    // Mount cleanly, then corrupt every read.
    let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, false).expect("mount");
    index.store.set_fault_config(FaultConfig::always_corrupt());

    for n in 1..=20 {
        match index.lookup(&key(n)) {
            Err(BTreeError::Node(NodeError::ChecksumMismatch { .. })) => {}
            // Flips that cancel out leave the block intact.
            Ok(v) => assert_eq!(v, value(n)),
            Err(e) => panic!("unexpected error for key {n}: {e}"),
        }
    }
    assert!(index.store.stats().corrupted_reads >= 20);
}

#[test]
fn test_failed_write_surfaces_store_error() {
    let mut store = memory_store(512, 32);
    let mut index = create_index(&mut store);
    insert_all(&mut index, 1..=3);

    index.store.set_fault_config(FaultConfig::failing_writes());
    assert!(matches!(
        index.insert(&key(4), &value(4)),
        Err(BTreeError::Store(StoreError::InjectedFault(_)))
    ));
}

#[test]
fn test_failed_split_write_loses_no_blocks() {
    let mut store = memory_store(SMALL_BLOCK, 16);
    {
        let mut index = create_index(&mut store);
        insert_all(&mut index, 1..=4);
        let before = index.display(DisplayFormat::Depth).expect("display");
        assert_eq!(index.free_block_count().expect("free"), 13);

        // The leaf is full, so key 5 needs a split.
        index.store.set_fault_config(FaultConfig::failing_writes());
        assert!(matches!(
            index.insert(&key(5), &value(5)),
            Err(BTreeError::Store(StoreError::InjectedFault(_)))
        ));
        index.store.set_fault_config(FaultConfig::no_faults());

        assert_eq!(index.free_block_count().expect("free"), 13);
        assert_eq!(index.display(DisplayFormat::Depth).expect("display"), before);
        assert_eq!(index.key_count(), 4);
        index.sanity_check().expect("sane after failed insert");
        index.detach().expect("detach");
    }

    let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, false).expect("mount");
    assert_eq!(index.free_block_count().expect("free"), 13);
    index.sanity_check().expect("sane after remount");

    index.insert(&key(5), &value(5)).expect("insert once writes succeed");
    assert_eq!(index.lookup(&key(5)).expect("lookup"), value(5));
    index.sanity_check().expect("sane after split");
}

#[test]
fn test_failed_first_insert_loses_no_blocks() {
    let mut store = memory_store(SMALL_BLOCK, 8);
    let mut index = create_index(&mut store);

    index.store.set_fault_config(FaultConfig::failing_writes());
    assert!(index.insert(&key(1), &value(1)).is_err());
    index.store.set_fault_config(FaultConfig::no_faults());

    assert_eq!(index.free_block_count().expect("free"), 6);
    assert_eq!(index.height().expect("height"), 1);
    index.sanity_check().expect("sane");
}

#[test]
fn test_torn_writes_never_return_wrong_values() {
    let mut store = MemoryStore::with_faults(SMALL_BLOCK, 16, 11, FaultConfig::no_faults());
    let mut index = create_index(&mut store);
    insert_all(&mut index, 1..=4);

    let updated = |n: u32| format!("u{n:07}").into_bytes();
    index.store.set_fault_config(FaultConfig::torn_writes());
    for n in 1..=4 {
        match index.update(&key(n), &updated(n)) {
            Ok(()) | Err(BTreeError::Node(NodeError::ChecksumMismatch { .. })) => {}
            Err(e) => panic!("unexpected error updating key {n}: {e}"),
        }
    }
    index.store.set_fault_config(FaultConfig::no_faults());
    assert!(index.store.stats().torn_writes > 0);

    // A torn block either kept only zero bytes past the cut, and so reads
    // back intact, or fails its checksum.
    for n in 1..=4 {
        match index.lookup(&key(n)) {
            Ok(v) => assert_eq!(v, updated(n)),
            Err(BTreeError::Node(NodeError::ChecksumMismatch { .. })) => {}
            Err(e) => panic!("unexpected error for key {n}: {e}"),
        }
    }
}
