//! Insertion with split propagation.
//!
//! The descent records every interior node on the path. After the pair is
//! placed in its leaf, overflow is resolved bottom-up by popping that stack:
//! each split hands one separator and one new right sibling to the parent.
//! When the root itself splits, the old root block becomes a plain interior
//! node and a new root is allocated above it.
//!
//! All blocks a split chain needs are taken from the free list before any
//! node is rewritten, so `NoSpace` leaves the tree untouched. A write
//! failure before the chain is linked in also leaves it untouched, and the
//! reserved blocks go back on the free list.

use crate::btree::node::{InteriorNode, KeyValuePair, LeafNode, Node};
use crate::btree::superblock::Superblock;
use crate::btree::tree::{BTreeError, BTreeIndex};
use crate::store::{BlockId, BlockStore};

impl<S: BlockStore> BTreeIndex<'_, S> {
    /// Insert a new key.
    ///
    /// Returns [`BTreeError::Conflict`] if the key is already present; the
    /// tree is not modified in that case.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), BTreeError> {
        self.check_key(key)?;
        self.check_value(value)?;

        let descent = self.descend(key)?;
        let mut ancestors = descent.ancestors;
        let pair = KeyValuePair::new(key.to_vec(), value.to_vec());

        let Some((leaf_block, mut leaf)) = descent.leaf else {
            let (root_block, root) = ancestors.pop().ok_or(BTreeError::Insane {
                block: self.superblock.root,
                reason: "descent recorded no root",
            })?;
            return self.insert_first(root_block, root, pair);
        };

        let slot = match leaf.find(key) {
            Ok(_) => return Err(BTreeError::Conflict),
            Err(slot) => slot,
        };

        let reserved = self.allocate_nodes(self.blocks_needed(&leaf, &ancestors))?;
        leaf.entries.insert(slot, pair);

        let mut fresh = reserved.clone();
        let shrunk = match self.link(leaf_block, leaf, ancestors, &mut fresh) {
            Ok(shrunk) => shrunk,
            Err(e) => {
                self.release_unused(reserved);
                return Err(e);
            }
        };
        for (block, node) in shrunk {
            self.write_node(block, &node)?;
        }

        self.record_insert()
    }

    /// Make the grown leaf, and any new siblings its split chain needs,
    /// reachable from the root.
    ///
    /// New blocks are written first and a single parent (or superblock)
    /// write links them in. Nodes that split keep their old contents on
    /// disk until then; their shrunk halves are returned for the caller to
    /// write. On error nothing reserved is reachable.
    fn link(
        &mut self,
        leaf_block: BlockId,
        mut leaf: LeafNode,
        ancestors: Vec<(BlockId, InteriorNode)>,
        fresh: &mut Vec<BlockId>,
    ) -> Result<Vec<(BlockId, Node)>, BTreeError> {
        if leaf.entries.len() < self.geometry.leaf_slots() {
            self.write_node(leaf_block, &Node::Leaf(leaf))?;
            return Ok(Vec::new());
        }

        let (separator, right) = leaf.split();
        let right_block = take_block(fresh, leaf_block)?;
        self.write_node(right_block, &Node::Leaf(right))?;
        tracing::debug!(leaf = leaf_block, right = right_block, "split leaf");

        let mut shrunk = vec![(leaf_block, Node::Leaf(leaf))];
        self.promote(ancestors, separator, right_block, fresh, &mut shrunk)?;
        Ok(shrunk)
    }

    /// First key of an empty tree: one leaf under the root.
    fn insert_first(
        &mut self,
        root_block: BlockId,
        mut root: InteriorNode,
        pair: KeyValuePair,
    ) -> Result<(), BTreeError> {
        let leaf_block = self.allocate_node()?;
        let leaf = LeafNode {
            entries: vec![pair],
        };

        root.children.push(leaf_block);
        let linked = self
            .write_node(leaf_block, &Node::Leaf(leaf))
            .and_then(|()| self.write_node(root_block, &Node::Root(root)));
        if let Err(e) = linked {
            self.release_unused(vec![leaf_block]);
            return Err(e);
        }
        tracing::debug!(root = root_block, leaf = leaf_block, "created first leaf");

        self.record_insert()
    }

    /// Push a separator and its right sibling up the ancestor stack until a
    /// parent absorbs it or a new root is created.
    fn promote(
        &mut self,
        mut ancestors: Vec<(BlockId, InteriorNode)>,
        mut separator: Vec<u8>,
        mut right_child: BlockId,
        fresh: &mut Vec<BlockId>,
        shrunk: &mut Vec<(BlockId, Node)>,
    ) -> Result<(), BTreeError> {
        loop {
            let (block, mut node) = ancestors.pop().ok_or(BTreeError::Insane {
                block: right_child,
                reason: "split with no parent to absorb it",
            })?;
            let is_root = ancestors.is_empty();

            node.insert(separator, right_child);
            if node.keys.len() < self.geometry.interior_slots() {
                let node = if is_root {
                    Node::Root(node)
                } else {
                    Node::Interior(node)
                };
                return self.write_node(block, &node);
            }

            let (median, right) = node.split();
            let right_block = take_block(fresh, block)?;
            self.write_node(right_block, &Node::Interior(right))?;
            shrunk.push((block, Node::Interior(node)));

            if is_root {
                let new_root = take_block(fresh, block)?;
                let root = InteriorNode::with_children(block, median, right_block);
                self.write_node(new_root, &Node::Root(root))?;
                self.commit_superblock(Superblock {
                    root: new_root,
                    ..self.superblock
                })?;

                tracing::debug!(
                    old_root = block,
                    right = right_block,
                    new_root,
                    "split root"
                );
                return Ok(());
            }

            tracing::debug!(node = block, right = right_block, "split interior node");
            separator = median;
            right_child = right_block;
        }
    }

    /// Blocks the split chain triggered by inserting into `leaf` will use.
    ///
    /// A full leaf needs one block, each full ancestor above it one more,
    /// and a full root two (its right half and the new root).
    fn blocks_needed(&self, leaf: &LeafNode, ancestors: &[(BlockId, InteriorNode)]) -> usize {
        if leaf.entries.len() < self.geometry.max_leaf_keys() {
            return 0;
        }

        let mut needed = 1;
        for (depth, (_, node)) in ancestors.iter().enumerate().rev() {
            if node.keys.len() < self.geometry.max_interior_keys() {
                return needed;
            }
            needed += if depth == 0 { 2 } else { 1 };
        }
        needed
    }

    fn record_insert(&mut self) -> Result<(), BTreeError> {
        self.commit_superblock(Superblock {
            key_count: self.superblock.key_count + 1,
            ..self.superblock
        })
    }
}

fn take_block(fresh: &mut Vec<BlockId>, splitting: BlockId) -> Result<BlockId, BTreeError> {
    fresh.pop().ok_or(BTreeError::Insane {
        block: splitting,
        reason: "split needs more blocks than were reserved",
    })
}

#[cfg(test)]
mod tests {
    use crate::btree::node::Node;
    use crate::btree::tree::{BTreeError, BTreeIndex, Layout};
    use crate::store::MemoryStore;

    const LAYOUT: Layout = Layout::new(8, 8);

    fn key(n: u32) -> Vec<u8> {
        format!("{n:08}").into_bytes()
    }

    #[test]
    fn test_first_insert_creates_leaf() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");

        index.insert(&key(1), b"value001").expect("insert");

        assert_eq!(index.height().expect("height"), 1);
        assert_eq!(index.key_count(), 1);
        let Node::Root(root) = index.read_node(index.root_block()).expect("read") else {
            panic!("root block is not a root");
        };
        assert!(root.keys.is_empty());
        assert_eq!(root.children, vec![2]);
    }

    #[test]
    fn test_duplicate_insert_conflicts() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");

        index.insert(&key(1), b"value001").expect("insert");
        assert!(matches!(
            index.insert(&key(1), b"value002"),
            Err(BTreeError::Conflict)
        ));
        assert_eq!(index.lookup(&key(1)).expect("lookup"), b"value001");
        assert_eq!(index.key_count(), 1);
    }

    #[test]
    fn test_leaf_split_promotes_into_root() {
        let mut store = MemoryStore::new(512, 16);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");
        let slots = index.geometry().leaf_slots();

        for i in 0..u32::try_from(slots).expect("slots") {
            index.insert(&key(i), b"valueXXX").expect("insert");
        }

        let Node::Root(root) = index.read_node(index.root_block()).expect("read") else {
            panic!("root block is not a root");
        };
        assert_eq!(root.keys.len(), 1);
        assert_eq!(root.children.len(), 2);
        assert_eq!(index.height().expect("height"), 2);
    }

    #[test]
    fn test_no_space_leaves_tree_intact() {
        // Blocks: superblock, root, one leaf. The first split has nowhere to go.
        let mut store = MemoryStore::new(512, 3);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");
        let max = u32::try_from(index.geometry().max_leaf_keys()).expect("max");

        for i in 0..max {
            index.insert(&key(i), b"valueXXX").expect("insert");
        }
        assert!(matches!(
            index.insert(&key(max), b"valueXXX"),
            Err(BTreeError::NoSpace)
        ));

        index.sanity_check().expect("tree intact");
        assert_eq!(index.key_count(), u64::from(max));
        assert!(matches!(index.lookup(&key(max)), Err(BTreeError::NotFound)));
    }

    #[test]
    fn test_wrong_sizes_rejected() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");

        assert!(matches!(
            index.insert(b"key", b"value001"),
            Err(BTreeError::KeySize { .. })
        ));
        assert!(matches!(
            index.insert(&key(1), b"v"),
            Err(BTreeError::ValueSize { .. })
        ));
    }
}
