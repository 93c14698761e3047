//! The index handle.
//!
//! A [`BTreeIndex`] is attached to a block store at the block holding its
//! superblock. It keeps the superblock and geometry in memory; every node is
//! read from the store when an operation needs it and written back before the
//! operation returns.

use crate::btree::allocator::format;
use crate::btree::node::{Geometry, Node, NodeError};
use crate::btree::superblock::Superblock;
use crate::store::{BlockId, BlockStore, StoreError};

/// Fixed key and value sizes of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub key_size: usize,
    pub value_size: usize,
}

impl Layout {
    #[must_use]
    pub const fn new(key_size: usize, value_size: usize) -> Self {
        Self {
            key_size,
            value_size,
        }
    }
}

/// A B-tree index backed by a block store.
pub struct BTreeIndex<'a, S: BlockStore> {
    pub(crate) store: &'a mut S,
    pub(crate) superblock_block: BlockId,
    pub(crate) superblock: Superblock,
    pub(crate) geometry: Geometry,
}

impl<'a, S: BlockStore> BTreeIndex<'a, S> {
    /// Attach to an index whose superblock lives at `initial_block`.
    ///
    /// With `create`, the store is formatted from `initial_block` to its last
    /// block: superblock, empty root, and a free list of everything else.
    /// Without it, the existing superblock is read and must match `layout`
    /// and the store's block size.
    pub fn attach(
        store: &'a mut S,
        initial_block: BlockId,
        layout: Layout,
        create: bool,
    ) -> Result<Self, BTreeError> {
        let block_size = store.block_size();

        if create {
            let geometry = Geometry::new(layout.key_size, layout.value_size, block_size)?;
            let superblock = format(store, initial_block, &geometry)?;

            tracing::info!(
                superblock = initial_block,
                root = superblock.root,
                key_size = layout.key_size,
                value_size = layout.value_size,
                block_size,
                leaf_slots = geometry.leaf_slots(),
                interior_slots = geometry.interior_slots(),
                "formatted index"
            );

            return Ok(Self {
                store,
                superblock_block: initial_block,
                superblock,
                geometry,
            });
        }

        let block = store.read_block(initial_block)?;
        let superblock = Superblock::from_block(&block).inspect_err(|e| {
            tracing::warn!(block = initial_block, "cannot read superblock: {e}");
        })?;

        check_layout("key_size", superblock.key_size, layout.key_size)?;
        check_layout("value_size", superblock.value_size, layout.value_size)?;
        check_layout("block_size", superblock.block_size, block_size)?;
        let geometry = superblock.geometry()?;

        tracing::info!(
            superblock = initial_block,
            root = superblock.root,
            key_count = superblock.key_count,
            "mounted index"
        );

        Ok(Self {
            store,
            superblock_block: initial_block,
            superblock,
            geometry,
        })
    }

    /// Persist the superblock and release the store.
    ///
    /// Returns the block the index can be re-attached at.
    pub fn detach(mut self) -> Result<BlockId, BTreeError> {
        self.write_superblock()?;
        tracing::debug!(superblock = self.superblock_block, "detached index");
        Ok(self.superblock_block)
    }

    /// Remove a key. Not supported.
    pub fn delete(&mut self, key: &[u8]) -> Result<(), BTreeError> {
        self.check_key(key)?;
        Err(BTreeError::Unimplemented("delete"))
    }

    /// Block number of the current root.
    #[must_use]
    pub const fn root_block(&self) -> BlockId {
        self.superblock.root
    }

    /// Block number of the superblock.
    #[must_use]
    pub const fn superblock_block(&self) -> BlockId {
        self.superblock_block
    }

    /// Number of successful inserts recorded in the superblock.
    #[must_use]
    pub const fn key_count(&self) -> u64 {
        self.superblock.key_count
    }

    #[must_use]
    pub const fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Number of levels on a root-to-leaf path.
    ///
    /// A root without keys routes straight to its only leaf and is not a
    /// level of its own, so an index stays at height 1 until its first leaf
    /// splits and a separator lands in the root.
    pub fn height(&mut self) -> Result<usize, BTreeError> {
        let mut height = 1;
        let mut current = self.superblock.root;

        loop {
            match self.read_node(current)? {
                Node::Root(node) | Node::Interior(node) => {
                    let Some(&child) = node.children.first() else {
                        return Ok(height);
                    };
                    if !node.keys.is_empty() {
                        height += 1;
                    }
                    current = child;
                }
                Node::Leaf(_) => return Ok(height),
                other => {
                    return Err(BTreeError::BadType {
                        block: current,
                        found: other.node_type() as u8,
                    });
                }
            }
        }
    }

    pub(crate) fn read_node(&mut self, block: BlockId) -> Result<Node, BTreeError> {
        let raw = self.store.read_block(block)?;
        Node::decode(&raw, &self.geometry).map_err(|e| {
            if matches!(e, NodeError::ChecksumMismatch { .. }) {
                tracing::warn!(block, "checksum mismatch: {e}");
            }
            BTreeError::Node(e)
        })
    }

    pub(crate) fn write_node(&mut self, block: BlockId, node: &Node) -> Result<(), BTreeError> {
        let raw = node.encode(&self.geometry);
        self.store.write_block(block, &raw).inspect_err(|e| {
            tracing::warn!(block, "block write failed: {e}");
        })?;
        Ok(())
    }

    pub(crate) fn write_superblock(&mut self) -> Result<(), BTreeError> {
        self.commit_superblock(self.superblock)
    }

    /// Persist `updated`, then adopt it. A failed write leaves the
    /// in-memory superblock as it was.
    pub(crate) fn commit_superblock(&mut self, updated: Superblock) -> Result<(), BTreeError> {
        self.write_node(self.superblock_block, &Node::Superblock(updated))?;
        self.superblock = updated;
        Ok(())
    }

    pub(crate) fn check_key(&self, key: &[u8]) -> Result<(), BTreeError> {
        if key.len() != self.geometry.key_size() {
            return Err(BTreeError::KeySize {
                expected: self.geometry.key_size(),
                actual: key.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_value(&self, value: &[u8]) -> Result<(), BTreeError> {
        if value.len() != self.geometry.value_size() {
            return Err(BTreeError::ValueSize {
                expected: self.geometry.value_size(),
                actual: value.len(),
            });
        }
        Ok(())
    }
}

impl<S: BlockStore> std::fmt::Debug for BTreeIndex<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BTreeIndex")
            .field("superblock_block", &self.superblock_block)
            .field("superblock", &self.superblock)
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}

fn check_layout(field: &'static str, stored: u32, requested: usize) -> Result<(), BTreeError> {
    if stored as usize != requested {
        return Err(BTreeError::LayoutMismatch {
            field,
            stored: stored as usize,
            requested,
        });
    }
    Ok(())
}

/// Errors from index operations.
#[derive(Debug)]
pub enum BTreeError {
    /// The key is not in the index.
    NotFound,
    /// The key is already in the index.
    Conflict,
    /// The free list is empty.
    NoSpace,
    /// The operation is not supported.
    Unimplemented(&'static str),
    /// A node is structurally impossible where it was found.
    Insane { block: BlockId, reason: &'static str },
    /// A block is reachable more than once.
    InnerLoop { block: BlockId },
    /// A node holds as many keys as it has slots.
    NodeOverflow {
        block: BlockId,
        key_count: usize,
        slots: usize,
    },
    /// Keys under a node are not strictly increasing.
    BadOrder { block: BlockId },
    /// A node of the wrong type was found.
    BadType { block: BlockId, found: u8 },
    /// A key of the wrong length was passed in.
    KeySize { expected: usize, actual: usize },
    /// A value of the wrong length was passed in.
    ValueSize { expected: usize, actual: usize },
    /// The stored index was formatted with a different layout.
    LayoutMismatch {
        field: &'static str,
        stored: usize,
        requested: usize,
    },
    /// Block store error.
    Store(StoreError),
    /// Node codec error.
    Node(NodeError),
}

impl std::fmt::Display for BTreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Conflict => write!(f, "key already exists"),
            Self::NoSpace => write!(f, "no free blocks"),
            Self::Unimplemented(op) => write!(f, "{op} is not implemented"),
            Self::Insane { block, reason } => write!(f, "block {block}: {reason}"),
            Self::InnerLoop { block } => write!(f, "block {block} is reachable twice"),
            Self::NodeOverflow {
                block,
                key_count,
                slots,
            } => write!(f, "block {block} holds {key_count} keys in {slots} slots"),
            Self::BadOrder { block } => write!(f, "keys under block {block} are out of order"),
            Self::BadType { block, found } => {
                write!(f, "block {block} has unexpected node type {found}")
            }
            Self::KeySize { expected, actual } => {
                write!(f, "key is {actual} bytes, expected {expected}")
            }
            Self::ValueSize { expected, actual } => {
                write!(f, "value is {actual} bytes, expected {expected}")
            }
            Self::LayoutMismatch {
                field,
                stored,
                requested,
            } => write!(f, "index has {field} {stored}, requested {requested}"),
            Self::Store(e) => write!(f, "store error: {e}"),
            Self::Node(e) => write!(f, "node error: {e}"),
        }
    }
}

impl std::error::Error for BTreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Node(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for BTreeError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<NodeError> for BTreeError {
    fn from(e: NodeError) -> Self {
        Self::Node(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FaultConfig, MemoryStore};

    const LAYOUT: Layout = Layout::new(8, 8);

    #[test]
    fn test_attach_create_formats_store() {
        let mut store = MemoryStore::new(512, 16);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");

        assert_eq!(index.superblock_block(), 0);
        assert_eq!(index.root_block(), 1);
        assert_eq!(index.key_count(), 0);
        assert_eq!(index.height().expect("height"), 1);
        assert_eq!(index.free_block_count().expect("free count"), 14);
    }

    #[test]
    fn test_attach_at_offset() {
        let mut store = MemoryStore::new(512, 16);
        let index = BTreeIndex::attach(&mut store, 4, LAYOUT, true).expect("attach");
        assert_eq!(index.root_block(), 5);
        assert_eq!(index.detach().expect("detach"), 4);

        let index = BTreeIndex::attach(&mut store, 4, LAYOUT, false).expect("mount");
        assert_eq!(index.root_block(), 5);
    }

    #[test]
    fn test_mount_rejects_other_layout() {
        let mut store = MemoryStore::new(512, 16);
        BTreeIndex::attach(&mut store, 0, LAYOUT, true)
            .expect("attach")
            .detach()
            .expect("detach");

        let result = BTreeIndex::attach(&mut store, 0, Layout::new(8, 16), false);
        assert!(matches!(
            result,
            Err(BTreeError::LayoutMismatch {
                field: "value_size",
                stored: 8,
                requested: 16
            })
        ));
    }

    #[test]
    fn test_mount_unformatted_store() {
        let mut store = MemoryStore::new(512, 16);
        let result = BTreeIndex::attach(&mut store, 0, LAYOUT, false);
        assert!(matches!(
            result,
            Err(BTreeError::Node(NodeError::ChecksumMismatch { .. }))
        ));
    }

    #[test]
    fn test_attach_rejects_tiny_blocks() {
        let mut store = MemoryStore::new(64, 16);
        let result = BTreeIndex::attach(&mut store, 0, LAYOUT, true);
        assert!(matches!(
            result,
            Err(BTreeError::Node(NodeError::TooFewSlots { .. }))
        ));
    }

    #[test]
    fn test_attach_needs_room_for_root() {
        let mut store = MemoryStore::new(512, 1);
        let result = BTreeIndex::attach(&mut store, 0, LAYOUT, true);
        assert!(matches!(result, Err(BTreeError::NoSpace)));
    }

    #[test]
    fn test_attach_past_end_of_store() {
        let mut store = MemoryStore::new(512, 16);
        for block in [16, u64::MAX] {
            assert!(matches!(
                BTreeIndex::attach(&mut store, block, LAYOUT, true),
                Err(BTreeError::NoSpace)
            ));
        }
        assert_eq!(store.stats().writes, 0);
    }

    #[test]
    fn test_failed_superblock_write_keeps_snapshot() {
        let mut store = MemoryStore::new(512, 16);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");
        let before = index.superblock;

        index.store.set_fault_config(FaultConfig::failing_writes());
        let mut updated = before;
        updated.key_count += 1;
        assert!(index.commit_superblock(updated).is_err());
        assert_eq!(index.superblock, before);
    }

    #[test]
    fn test_delete_is_unimplemented() {
        let mut store = MemoryStore::new(512, 16);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");

        assert!(matches!(
            index.delete(b"00000001"),
            Err(BTreeError::Unimplemented("delete"))
        ));
    }

    #[test]
    fn test_wrong_key_size() {
        let mut store = MemoryStore::new(512, 16);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");

        assert!(matches!(
            index.delete(b"short"),
            Err(BTreeError::KeySize {
                expected: 8,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(BTreeError::Conflict.to_string(), "key already exists");
        let e = BTreeError::NodeOverflow {
            block: 3,
            key_count: 30,
            slots: 30,
        };
        assert!(e.to_string().contains("block 3"));
    }
}
