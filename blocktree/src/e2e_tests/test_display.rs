//! Display formats over a multi-level tree.

use crate::btree::{BTreeIndex, DisplayFormat};
use crate::e2e_tests::helpers::{
    LAYOUT, SMALL_BLOCK, create_index, insert_all, leaves, memory_store,
};

#[test]
fn test_depth_lists_every_node_once() {
    let mut store = memory_store(SMALL_BLOCK, 128);
    let mut index = create_index(&mut store);
    insert_all(&mut index, 1..=20);

    let text = index.display(DisplayFormat::Depth).expect("display");
    let lines: Vec<&str> = text.lines().collect();

    let leaf_count = leaves(&mut index).len();
    assert_eq!(lines.iter().filter(|l| l.contains(": Leaf:")).count(), leaf_count);
    assert!(lines[0].starts_with(&format!("{}: Interior:", index.root_block())));
    assert!(text.contains("00000020 v0000020"));
}

#[test]
fn test_dot_has_one_edge_per_child() {
    let mut store = memory_store(SMALL_BLOCK, 128);
    let mut index = create_index(&mut store);
    insert_all(&mut index, 1..=20);

    let dot = index.display(DisplayFormat::DepthDot).expect("display");
    let vertices = dot.lines().filter(|l| l.contains("[ label=")).count();
    let edges = dot.lines().filter(|l| l.contains(" -> ")).count();

    assert!(dot.starts_with("digraph tree {\n"));
    assert!(dot.ends_with("}\n"));
    // A tree has one edge fewer than it has vertices.
    assert_eq!(edges, vertices - 1);
}

#[test]
fn test_sorted_dump_skips_interior_nodes() {
    let mut store = memory_store(SMALL_BLOCK, 128);
    let mut index = create_index(&mut store);
    insert_all(&mut index, 1..=20);

    let dump = index.display(DisplayFormat::SortedKeyValue).expect("display");
    assert_eq!(dump.lines().count(), 20);
    assert!(dump.lines().all(|l| l.starts_with('(') && l.ends_with(')')));
}

#[test]
fn test_display_is_read_only() {
    let mut store = memory_store(SMALL_BLOCK, 128);
    {
        let mut index = create_index(&mut store);
        insert_all(&mut index, 1..=20);
        index.detach().expect("detach");
    }
    store.reset_stats();

    let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, false).expect("mount");
    for format in [
        DisplayFormat::Depth,
        DisplayFormat::DepthDot,
        DisplayFormat::SortedKeyValue,
    ] {
        index.display(format).expect("display");
    }

    assert_eq!(index.store.stats().writes, 0);
}
