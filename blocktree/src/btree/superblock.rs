//! Superblock structure and serialization.
//!
//! The superblock sits at the block the index was attached at. It uses the
//! common node header (type, checksum, sizes, and the root pointer in the
//! link field) followed by index-wide metadata.

use crate::btree::node::{Geometry, HEADER_SIZE, NodeError, NodeHeader, NodeType, verify_checksum};
use crate::store::{Block, BlockId};

/// Magic number identifying a blocktree index: "BTREEIDX"
pub const MAGIC: [u8; 8] = *b"BTREEIDX";

/// Current format version.
pub const FORMAT_VERSION: u32 = 1;

/// Superblock body offsets, after the common header.
mod offsets {
    use super::HEADER_SIZE;

    pub const FREE_LIST_HEAD: usize = HEADER_SIZE;
    pub const KEY_COUNT: usize = HEADER_SIZE + 8;
    pub const MAGIC: usize = HEADER_SIZE + 16;
    pub const FORMAT_VERSION: usize = HEADER_SIZE + 24;
    pub const END: usize = HEADER_SIZE + 28;
}

/// Index-wide metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    /// Key size in bytes.
    pub key_size: u32,
    /// Value size in bytes.
    pub value_size: u32,
    /// Block size the index was formatted with.
    pub block_size: u32,
    /// Block number of the root node.
    pub root: BlockId,
    /// Head of the free block list, 0 when empty.
    pub free_list_head: BlockId,
    /// Number of keys inserted. Advisory; not verified by the checker.
    pub key_count: u64,
}

impl Superblock {
    /// Bytes a superblock occupies, header included.
    pub const ENCODED_SIZE: usize = offsets::END;

    /// Superblock for a freshly formatted index.
    #[must_use]
    pub const fn new(geometry: &Geometry, root: BlockId, free_list_head: BlockId) -> Self {
        let header = NodeHeader::for_geometry(NodeType::Superblock, geometry, 0, root);
        Self {
            key_size: header.key_size,
            value_size: header.value_size,
            block_size: header.block_size,
            root,
            free_list_head,
            key_count: 0,
        }
    }

    /// Geometry recorded in the superblock.
    pub fn geometry(&self) -> Result<Geometry, NodeError> {
        Geometry::new(
            self.key_size as usize,
            self.value_size as usize,
            self.block_size as usize,
        )
    }

    /// Serialize into a sealed block of `block_size` bytes.
    #[must_use]
    pub fn to_block(&self) -> Block {
        let mut block = Block::zeroed(self.block_size as usize);

        NodeHeader {
            node_type: NodeType::Superblock,
            key_size: self.key_size,
            value_size: self.value_size,
            block_size: self.block_size,
            key_count: 0,
            link: self.root,
        }
        .write(&mut block);

        block.write_u64(offsets::FREE_LIST_HEAD, self.free_list_head);
        block.write_u64(offsets::KEY_COUNT, self.key_count);
        block.write_bytes(offsets::MAGIC, &MAGIC);
        block.write_u32(offsets::FORMAT_VERSION, FORMAT_VERSION);

        block.seal();
        block
    }

    /// Deserialize a superblock.
    ///
    /// Only the block itself is needed, so this works before the geometry
    /// is known.
    pub fn from_block(block: &Block) -> Result<Self, NodeError> {
        if block.len() < Self::ENCODED_SIZE {
            return Err(NodeError::SizeOutOfRange {
                field: "block_size",
                value: block.len(),
            });
        }
        verify_checksum(block)?;

        let header = NodeHeader::read(block)?;
        if header.node_type != NodeType::Superblock {
            return Err(NodeError::InvalidNodeType(header.node_type as u8));
        }

        let mut magic = [0u8; 8];
        magic.copy_from_slice(block.read_bytes(offsets::MAGIC, 8));
        if magic != MAGIC {
            return Err(NodeError::InvalidMagic(magic));
        }

        let format_version = block.read_u32(offsets::FORMAT_VERSION);
        if format_version != FORMAT_VERSION {
            return Err(NodeError::UnsupportedVersion(format_version));
        }

        Ok(Self {
            key_size: header.key_size,
            value_size: header.value_size,
            block_size: header.block_size,
            root: header.link,
            free_list_head: block.read_u64(offsets::FREE_LIST_HEAD),
            key_count: block.read_u64(offsets::KEY_COUNT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::btree::node::{InteriorNode, Node};

    fn geometry() -> Geometry {
        Geometry::new(8, 8, 512).expect("geometry")
    }

    #[test]
    fn test_superblock_roundtrip() {
        let mut sb = Superblock::new(&geometry(), 1, 2);
        sb.key_count = 42;

        let block = sb.to_block();
        let restored = Superblock::from_block(&block).expect("decode");

        assert_eq!(restored, sb);
        assert_eq!(restored.geometry().expect("geometry"), geometry());
    }

    #[test]
    fn test_superblock_via_node_codec() {
        let sb = Superblock::new(&geometry(), 5, 6);
        let block = Node::Superblock(sb).encode(&geometry());

        assert_eq!(
            Node::decode(&block, &geometry()).expect("decode"),
            Node::Superblock(sb)
        );
    }

    #[test]
    fn test_invalid_magic() {
        let mut block = Superblock::new(&geometry(), 1, 0).to_block();
        block.write_bytes(offsets::MAGIC, b"BADMAGIC");
        block.seal();

        assert_eq!(
            Superblock::from_block(&block),
            Err(NodeError::InvalidMagic(*b"BADMAGIC"))
        );
    }

    #[test]
    fn test_unsupported_version() {
        let mut block = Superblock::new(&geometry(), 1, 0).to_block();
        block.write_u32(offsets::FORMAT_VERSION, 99);
        block.seal();

        assert_eq!(
            Superblock::from_block(&block),
            Err(NodeError::UnsupportedVersion(99))
        );
    }

    #[test]
    fn test_rejects_tree_node() {
        let block = Node::Root(InteriorNode::default()).encode(&geometry());

        assert_eq!(
            Superblock::from_block(&block),
            Err(NodeError::InvalidNodeType(NodeType::Root as u8))
        );
    }

    #[test]
    fn test_rejects_unformatted_block() {
        let block = Block::zeroed(512);
        assert!(matches!(
            Superblock::from_block(&block),
            Err(NodeError::ChecksumMismatch { .. })
        ));
    }
}
