//! Seeded random insertion orders keep the order and capacity invariants.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::btree::DisplayFormat;
use crate::e2e_tests::helpers::{
    SMALL_BLOCK, all_keys, create_index, insert_all, key, leaves, memory_store, value,
};

fn shuffled(count: u32, seed: u64) -> Vec<u32> {
    let mut keys: Vec<u32> = (0..count).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(seed));
    keys
}

#[test]
fn test_random_order_default_geometry() {
    let mut store = memory_store(512, 1024);
    let mut index = create_index(&mut store);
    let order = shuffled(1000, 42);

    insert_all(&mut index, order.iter().copied());

    index.sanity_check().expect("sane");
    let expected: Vec<Vec<u8>> = (0..1000).map(key).collect();
    assert_eq!(all_keys(&mut index), expected);

    let slots = index.geometry().leaf_slots();
    for (block, leaf) in leaves(&mut index) {
        assert!(leaf.entries.len() < slots, "leaf {block} overflowed");
    }
    for n in order {
        assert_eq!(index.lookup(&key(n)).expect("lookup"), value(n));
    }
}

#[test]
fn test_random_order_small_geometry_many_seeds() {
    for seed in 0..8 {
        let mut store = memory_store(SMALL_BLOCK, 1024);
        let mut index = create_index(&mut store);

        insert_all(&mut index, shuffled(150, seed));

        index
            .sanity_check()
            .unwrap_or_else(|e| panic!("seed {seed}: {e}"));
        let expected: Vec<Vec<u8>> = (0..150).map(key).collect();
        assert_eq!(all_keys(&mut index), expected, "seed {seed}");
    }
}

#[test]
fn test_sorted_dump_is_ascending() {
    let mut store = memory_store(SMALL_BLOCK, 512);
    let mut index = create_index(&mut store);
    insert_all(&mut index, shuffled(60, 7));

    let dump = index.display(DisplayFormat::SortedKeyValue).expect("display");
    let lines: Vec<&str> = dump.lines().collect();
    assert_eq!(lines.len(), 60);
    assert!(lines.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(lines[0], "(00000000,v0000000)");
}
