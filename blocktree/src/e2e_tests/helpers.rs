//! Common helpers for end-to-end tests.

use crate::btree::node::{LeafNode, Node};
use crate::btree::{BTreeIndex, Layout};
use crate::store::{BlockId, BlockStore, MemoryStore};

/// 8-byte keys and values, as in the reference scenario.
pub const LAYOUT: Layout = Layout::new(8, 8);

/// Block size giving 5 leaf slots and 4 interior slots for [`LAYOUT`]:
/// leaves hold at most 4 keys and interior nodes at most 3.
pub const SMALL_BLOCK: usize = 112;

/// Zero-padded decimal key, e.g. `00000042`.
pub fn key(n: u32) -> Vec<u8> {
    format!("{n:08}").into_bytes()
}

/// Value paired with [`key`] in most tests.
pub fn value(n: u32) -> Vec<u8> {
    format!("v{n:07}").into_bytes()
}

/// A fault-free in-memory store.
pub fn memory_store(block_size: usize, block_count: u64) -> MemoryStore {
    MemoryStore::new(block_size, block_count)
}

/// Create an index at block 0.
pub fn create_index<S: BlockStore>(store: &mut S) -> BTreeIndex<'_, S> {
    BTreeIndex::attach(store, 0, LAYOUT, true).expect("Failed to create index")
}

/// Insert `key(n)` / `value(n)` for every `n`.
pub fn insert_all<S: BlockStore>(index: &mut BTreeIndex<'_, S>, keys: impl IntoIterator<Item = u32>) {
    for n in keys {
        index
            .insert(&key(n), &value(n))
            .unwrap_or_else(|e| panic!("insert of key {n} failed: {e}"));
    }
}

/// Every leaf in left-to-right order.
pub fn leaves<S: BlockStore>(index: &mut BTreeIndex<'_, S>) -> Vec<(BlockId, LeafNode)> {
    let mut out = Vec::new();
    let mut stack = vec![index.root_block()];

    while let Some(block) = stack.pop() {
        match index.read_node(block).expect("Failed to read node") {
            Node::Root(node) | Node::Interior(node) => {
                stack.extend(node.children.iter().rev());
            }
            Node::Leaf(leaf) => out.push((block, leaf)),
            other => panic!("unexpected {} node at block {block}", other.node_type()),
        }
    }
    out
}

/// All keys in leaf order.
pub fn all_keys<S: BlockStore>(index: &mut BTreeIndex<'_, S>) -> Vec<Vec<u8>> {
    leaves(index)
        .into_iter()
        .flat_map(|(_, leaf)| leaf.entries.into_iter().map(|e| e.key))
        .collect()
}
