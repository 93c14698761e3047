//! B-tree node types and serialization.
//!
//! Every formatted block decodes into one [`Node`]. The in-memory
//! form is a sum type with one arm per node kind; the on-disk form shares a
//! single 32-byte header across all kinds.
//!
//! Header layout (little-endian):
//! - `node_type`: 1 byte
//! - `flags`: 1 byte (reserved, 0)
//! - `checksum`: 4 bytes (CRC32 of the block with this field zeroed)
//! - reserved: 2 bytes
//! - `key_size`: 4 bytes
//! - `value_size`: 4 bytes
//! - `block_size`: 4 bytes
//! - `key_count`: 4 bytes
//! - `link`: 8 bytes (superblock: root block, free block: next free block)
//!
//! Bodies start right after the header. An interior node stores its first
//! child pointer followed by `(key, child)` pairs; a leaf stores
//! `(key, value)` pairs.

// Sizes are validated to fit in u32 when the geometry is built.
#![allow(clippy::cast_possible_truncation)]

use crate::btree::superblock::Superblock;
use crate::store::{Block, BlockId};

/// Size of the shared node header in bytes.
pub const HEADER_SIZE: usize = 32;

/// Size of an on-disk block pointer.
pub const POINTER_SIZE: usize = 8;

/// Header field offsets.
mod offsets {
    pub const NODE_TYPE: usize = 0;
    pub const FLAGS: usize = 1;
    pub const KEY_SIZE: usize = 8;
    pub const VALUE_SIZE: usize = 12;
    pub const BLOCK_SIZE: usize = 16;
    pub const KEY_COUNT: usize = 20;
    pub const LINK: usize = 24;
}

/// Node type discriminant stored in the first header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    Superblock = 1,
    Root = 2,
    Interior = 3,
    Leaf = 4,
    Unallocated = 5,
}

impl TryFrom<u8> for NodeType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Superblock),
            2 => Ok(Self::Root),
            3 => Ok(Self::Interior),
            4 => Ok(Self::Leaf),
            5 => Ok(Self::Unallocated),
            _ => Err(value),
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Superblock => "superblock",
            Self::Root => "root",
            Self::Interior => "interior",
            Self::Leaf => "leaf",
            Self::Unallocated => "unallocated",
        };
        f.write_str(name)
    }
}

/// Key, value and block sizes of one tree, and the slot counts derived from
/// them.
///
/// Slot counts are computed here and nowhere else, so the codec, the
/// insertion engine and the checker always agree on when a node is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    key_size: usize,
    value_size: usize,
    block_size: usize,
}

impl Geometry {
    /// Smallest slot count that still lets a split leave both halves
    /// non-empty.
    pub const MIN_SLOTS: usize = 3;

    /// Build a geometry, rejecting layouts that cannot hold a working tree.
    pub fn new(key_size: usize, value_size: usize, block_size: usize) -> Result<Self, NodeError> {
        let too_large = |field: &'static str, value: usize| {
            if u32::try_from(value).is_err() {
                Err(NodeError::SizeOutOfRange { field, value })
            } else {
                Ok(())
            }
        };
        too_large("key_size", key_size)?;
        too_large("value_size", value_size)?;
        too_large("block_size", block_size)?;

        if key_size == 0 {
            return Err(NodeError::SizeOutOfRange {
                field: "key_size",
                value: key_size,
            });
        }
        if block_size < Superblock::ENCODED_SIZE {
            return Err(NodeError::SizeOutOfRange {
                field: "block_size",
                value: block_size,
            });
        }

        let geometry = Self {
            key_size,
            value_size,
            block_size,
        };
        let (leaf, interior) = (geometry.leaf_slots(), geometry.interior_slots());
        if leaf < Self::MIN_SLOTS || interior < Self::MIN_SLOTS {
            return Err(NodeError::TooFewSlots {
                leaf,
                interior,
                minimum: Self::MIN_SLOTS,
            });
        }
        Ok(geometry)
    }

    #[must_use]
    pub const fn key_size(&self) -> usize {
        self.key_size
    }

    #[must_use]
    pub const fn value_size(&self) -> usize {
        self.value_size
    }

    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of `(key, value)` slots in a leaf block.
    #[must_use]
    pub const fn leaf_slots(&self) -> usize {
        self.block_size.saturating_sub(HEADER_SIZE) / (self.key_size + self.value_size)
    }

    /// Number of `(key, child)` slots in an interior block. One extra
    /// leading child pointer is reserved ahead of them.
    #[must_use]
    pub const fn interior_slots(&self) -> usize {
        self.block_size.saturating_sub(HEADER_SIZE + POINTER_SIZE)
            / (self.key_size + POINTER_SIZE)
    }

    /// Most keys a leaf may hold between operations (always `slots - 1`).
    #[must_use]
    pub const fn max_leaf_keys(&self) -> usize {
        self.leaf_slots() - 1
    }

    /// Most keys an interior node may hold between operations.
    #[must_use]
    pub const fn max_interior_keys(&self) -> usize {
        self.interior_slots() - 1
    }
}

/// Header information shared by all node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeader {
    pub node_type: NodeType,
    pub key_size: u32,
    pub value_size: u32,
    pub block_size: u32,
    pub key_count: u32,
    pub link: BlockId,
}

impl NodeHeader {
    /// Header for a tree node of the given geometry.
    #[must_use]
    pub const fn for_geometry(
        node_type: NodeType,
        geometry: &Geometry,
        key_count: usize,
        link: BlockId,
    ) -> Self {
        Self {
            node_type,
            key_size: geometry.key_size as u32,
            value_size: geometry.value_size as u32,
            block_size: geometry.block_size as u32,
            key_count: key_count as u32,
            link,
        }
    }

    /// Read a node header from a block.
    pub fn read(block: &Block) -> Result<Self, NodeError> {
        let raw = block.read_u8(offsets::NODE_TYPE);
        let node_type = NodeType::try_from(raw).map_err(NodeError::InvalidNodeType)?;

        Ok(Self {
            node_type,
            key_size: block.read_u32(offsets::KEY_SIZE),
            value_size: block.read_u32(offsets::VALUE_SIZE),
            block_size: block.read_u32(offsets::BLOCK_SIZE),
            key_count: block.read_u32(offsets::KEY_COUNT),
            link: block.read_u64(offsets::LINK),
        })
    }

    /// Write the header into a block. The checksum is stamped separately.
    pub fn write(&self, block: &mut Block) {
        block.write_u8(offsets::NODE_TYPE, self.node_type as u8);
        block.write_u8(offsets::FLAGS, 0);
        block.write_u32(offsets::KEY_SIZE, self.key_size);
        block.write_u32(offsets::VALUE_SIZE, self.value_size);
        block.write_u32(offsets::BLOCK_SIZE, self.block_size);
        block.write_u32(offsets::KEY_COUNT, self.key_count);
        block.write_u64(offsets::LINK, self.link);
    }

    fn matches(&self, geometry: &Geometry) -> bool {
        self.key_size as usize == geometry.key_size
            && self.value_size as usize == geometry.value_size
            && self.block_size as usize == geometry.block_size
    }
}

/// A key/value pair moved as one unit when leaf slots shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValuePair {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl KeyValuePair {
    #[must_use]
    pub const fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { key, value }
    }
}

/// A root or interior node.
///
/// Stores N routing keys and N+1 child pointers.
/// `children[i]` covers keys < `keys[i]`;
/// `children[N]` covers keys >= `keys[N-1]`.
///
/// The root alone may be empty (no keys and no children), which is how an
/// empty tree is represented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteriorNode {
    pub keys: Vec<Vec<u8>>,
    pub children: Vec<BlockId>,
}

impl InteriorNode {
    /// An interior node with one routing key and two children.
    #[must_use]
    pub fn with_children(left_child: BlockId, key: Vec<u8>, right_child: BlockId) -> Self {
        Self {
            keys: vec![key],
            children: vec![left_child, right_child],
        }
    }

    /// Whether the node has nowhere to descend.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Index of the child that covers `key`.
    ///
    /// A key equal to a routing key belongs to the child on its right.
    #[must_use]
    pub fn child_index(&self, key: &[u8]) -> usize {
        self.keys.partition_point(|k| k.as_slice() <= key)
    }

    /// Child block that covers `key`, or `None` for an empty root.
    #[must_use]
    pub fn child_for(&self, key: &[u8]) -> Option<BlockId> {
        self.children.get(self.child_index(key)).copied()
    }

    /// Insert a promoted key and the block to its right.
    pub fn insert(&mut self, key: Vec<u8>, right_child: BlockId) {
        let idx = self.child_index(&key);
        self.keys.insert(idx, key);
        self.children.insert(idx + 1, right_child);
    }

    /// Split an overfull node around its median.
    ///
    /// The median moves up: it is returned and kept in neither half. `self`
    /// keeps the lower keys; the returned node holds the upper keys.
    #[must_use]
    pub fn split(&mut self) -> (Vec<u8>, Self) {
        let mid = self.keys.len() / 2;

        let right_keys = self.keys.split_off(mid + 1);
        let right_children = self.children.split_off(mid + 1);
        let median = self.keys.pop().unwrap_or_default();

        (
            median,
            Self {
                keys: right_keys,
                children: right_children,
            },
        )
    }

    fn read_body(block: &Block, geometry: &Geometry, key_count: usize) -> Self {
        let mut keys = Vec::with_capacity(key_count);
        let mut children = Vec::with_capacity(key_count + 1);
        if key_count == 0 {
            // An empty root stores no child.
            let first = block.read_u64(HEADER_SIZE);
            if first != 0 {
                children.push(first);
            }
            return Self { keys, children };
        }

        let mut offset = HEADER_SIZE;
        children.push(block.read_u64(offset));
        offset += POINTER_SIZE;

        for _ in 0..key_count {
            keys.push(block.read_bytes(offset, geometry.key_size).to_vec());
            offset += geometry.key_size;
            children.push(block.read_u64(offset));
            offset += POINTER_SIZE;
        }

        Self { keys, children }
    }

    fn write_body(&self, block: &mut Block, geometry: &Geometry) {
        let mut offset = HEADER_SIZE;
        if let Some(first) = self.children.first() {
            block.write_u64(offset, *first);
        }
        offset += POINTER_SIZE;

        for (key, child) in self.keys.iter().zip(self.children.iter().skip(1)) {
            block.write_bytes(offset, key);
            offset += geometry.key_size;
            block.write_u64(offset, *child);
            offset += POINTER_SIZE;
        }
    }
}

/// A leaf node: sorted, unique key/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafNode {
    pub entries: Vec<KeyValuePair>,
}

impl LeafNode {
    /// Find a key: `Ok(slot)` if present, `Err(slot)` where it would go.
    pub fn find(&self, key: &[u8]) -> Result<usize, usize> {
        self.entries.binary_search_by(|e| e.key.as_slice().cmp(key))
    }

    /// Get a value by key.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.find(key)
            .ok()
            .map(|i| self.entries[i].value.as_slice())
    }

    /// Keys in slot order.
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.iter().map(|e| e.key.as_slice())
    }

    /// Split an overfull leaf.
    ///
    /// `self` keeps the first `ceil(len / 2)` pairs. The first key of the
    /// returned right half is copied up as the separator.
    #[must_use]
    pub fn split(&mut self) -> (Vec<u8>, Self) {
        let mid = self.entries.len().div_ceil(2);
        let right_entries = self.entries.split_off(mid);
        let separator = right_entries
            .first()
            .map(|e| e.key.clone())
            .unwrap_or_default();

        (
            separator,
            Self {
                entries: right_entries,
            },
        )
    }

    fn read_body(block: &Block, geometry: &Geometry, key_count: usize) -> Self {
        let slot = geometry.key_size + geometry.value_size;
        let entries = (0..key_count)
            .map(|i| {
                let offset = HEADER_SIZE + i * slot;
                KeyValuePair {
                    key: block.read_bytes(offset, geometry.key_size).to_vec(),
                    value: block
                        .read_bytes(offset + geometry.key_size, geometry.value_size)
                        .to_vec(),
                }
            })
            .collect();

        Self { entries }
    }

    fn write_body(&self, block: &mut Block, geometry: &Geometry) {
        let slot = geometry.key_size + geometry.value_size;
        for (i, entry) in self.entries.iter().enumerate() {
            let offset = HEADER_SIZE + i * slot;
            block.write_bytes(offset, &entry.key);
            block.write_bytes(offset + geometry.key_size, &entry.value);
        }
    }
}

/// A block on the free list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
    /// Next free block, 0 at the end of the list.
    pub next: BlockId,
}

/// The decoded contents of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Superblock(Superblock),
    Root(InteriorNode),
    Interior(InteriorNode),
    Leaf(LeafNode),
    Free(FreeBlock),
}

impl Node {
    #[must_use]
    pub const fn node_type(&self) -> NodeType {
        match self {
            Self::Superblock(_) => NodeType::Superblock,
            Self::Root(_) => NodeType::Root,
            Self::Interior(_) => NodeType::Interior,
            Self::Leaf(_) => NodeType::Leaf,
            Self::Free(_) => NodeType::Unallocated,
        }
    }

    /// Decode a block.
    ///
    /// Verifies the checksum, the discriminant, that the block was written
    /// for this geometry, and that the key count fits in the block.
    pub fn decode(block: &Block, geometry: &Geometry) -> Result<Self, NodeError> {
        verify_checksum(block)?;
        let header = NodeHeader::read(block)?;

        if header.node_type == NodeType::Superblock {
            return Superblock::from_block(block).map(Self::Superblock);
        }
        if !header.matches(geometry) {
            return Err(NodeError::GeometryMismatch {
                key_size: header.key_size,
                value_size: header.value_size,
                block_size: header.block_size,
            });
        }

        let key_count = header.key_count as usize;
        let limit = match header.node_type {
            NodeType::Leaf => geometry.leaf_slots(),
            _ => geometry.interior_slots(),
        };
        if key_count > limit {
            return Err(NodeError::KeyCountOutOfRange { key_count, limit });
        }

        Ok(match header.node_type {
            NodeType::Root => Self::Root(InteriorNode::read_body(block, geometry, key_count)),
            NodeType::Interior => {
                Self::Interior(InteriorNode::read_body(block, geometry, key_count))
            }
            NodeType::Leaf => Self::Leaf(LeafNode::read_body(block, geometry, key_count)),
            NodeType::Unallocated | NodeType::Superblock => {
                Self::Free(FreeBlock { next: header.link })
            }
        })
    }

    /// Encode into a fresh, sealed block.
    #[must_use]
    pub fn encode(&self, geometry: &Geometry) -> Block {
        let mut block = Block::zeroed(geometry.block_size);
        let node_type = self.node_type();

        match self {
            Self::Superblock(superblock) => return superblock.to_block(),
            Self::Root(node) | Self::Interior(node) => {
                NodeHeader::for_geometry(node_type, geometry, node.keys.len(), 0)
                    .write(&mut block);
                node.write_body(&mut block, geometry);
            }
            Self::Leaf(leaf) => {
                NodeHeader::for_geometry(node_type, geometry, leaf.entries.len(), 0)
                    .write(&mut block);
                leaf.write_body(&mut block, geometry);
            }
            Self::Free(free) => {
                NodeHeader::for_geometry(node_type, geometry, 0, free.next).write(&mut block);
            }
        }

        block.seal();
        block
    }
}

/// Check the stored CRC32 against the block contents.
pub fn verify_checksum(block: &Block) -> Result<(), NodeError> {
    let expected = block.stored_checksum();
    let actual = block.compute_checksum();
    if expected != actual {
        return Err(NodeError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}

/// Errors that can occur when decoding or laying out nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// Unknown node type byte.
    InvalidNodeType(u8),
    /// Stored checksum does not match the block contents.
    ChecksumMismatch { expected: u32, actual: u32 },
    /// The block was written for a different key/value/block size.
    GeometryMismatch {
        key_size: u32,
        value_size: u32,
        block_size: u32,
    },
    /// The header claims more keys than the block can physically hold.
    KeyCountOutOfRange { key_count: usize, limit: usize },
    /// A size is zero, too small or does not fit the on-disk field.
    SizeOutOfRange { field: &'static str, value: usize },
    /// The block is too small for a usable fan-out.
    TooFewSlots {
        leaf: usize,
        interior: usize,
        minimum: usize,
    },
    /// The superblock magic is wrong.
    InvalidMagic([u8; 8]),
    /// The superblock format version is not supported.
    UnsupportedVersion(u32),
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNodeType(v) => write!(f, "invalid node type: 0x{v:02x}"),
            Self::ChecksumMismatch { expected, actual } => {
                write!(f, "checksum mismatch: expected {expected:#010x}, got {actual:#010x}")
            }
            Self::GeometryMismatch {
                key_size,
                value_size,
                block_size,
            } => write!(
                f,
                "node written for key size {key_size}, value size {value_size}, block size {block_size}"
            ),
            Self::KeyCountOutOfRange { key_count, limit } => {
                write!(f, "key count {key_count} exceeds block limit {limit}")
            }
            Self::SizeOutOfRange { field, value } => write!(f, "{field} out of range: {value}"),
            Self::TooFewSlots {
                leaf,
                interior,
                minimum,
            } => write!(
                f,
                "block holds {leaf} leaf slots and {interior} interior slots, need at least {minimum}"
            ),
            Self::InvalidMagic(magic) => {
                write!(f, "invalid magic number: {:?}", String::from_utf8_lossy(magic))
            }
            Self::UnsupportedVersion(v) => write!(f, "unsupported format version: {v}"),
        }
    }
}

impl std::error::Error for NodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> Geometry {
        Geometry::new(8, 8, 512).expect("geometry")
    }

    fn key(n: u8) -> Vec<u8> {
        vec![n; 8]
    }

    #[test]
    fn test_slot_counts() {
        let g = geometry();
        // (512 - 32) / 16
        assert_eq!(g.leaf_slots(), 30);
        // (512 - 40) / 16
        assert_eq!(g.interior_slots(), 29);
        assert_eq!(g.max_leaf_keys(), 29);
        assert_eq!(g.max_interior_keys(), 28);
    }

    #[test]
    fn test_geometry_rejects_tiny_blocks() {
        assert!(matches!(
            Geometry::new(8, 8, 64),
            Err(NodeError::TooFewSlots { .. })
        ));
        assert!(matches!(
            Geometry::new(0, 8, 512),
            Err(NodeError::SizeOutOfRange { field: "key_size", .. })
        ));
    }

    #[test]
    fn test_node_type_conversion() {
        assert_eq!(NodeType::try_from(2), Ok(NodeType::Root));
        assert_eq!(NodeType::try_from(4), Ok(NodeType::Leaf));
        assert!(NodeType::try_from(0).is_err());
        assert!(NodeType::try_from(0xFF).is_err());
    }

    #[test]
    fn test_interior_node_roundtrip() {
        let g = geometry();
        let node = Node::Interior(InteriorNode {
            keys: vec![key(1), key(2), key(3)],
            children: vec![10, 20, 30, 40],
        });

        let block = node.encode(&g);
        assert_eq!(Node::decode(&block, &g).expect("decode"), node);
    }

    #[test]
    fn test_empty_root_roundtrip() {
        let g = geometry();
        let root = Node::Root(InteriorNode::default());

        let decoded = Node::decode(&root.encode(&g), &g).expect("decode");
        let Node::Root(node) = decoded else {
            panic!("expected root, got {decoded:?}");
        };
        assert!(node.is_empty());
        assert!(node.keys.is_empty());
    }

    #[test]
    fn test_root_with_single_child_roundtrip() {
        let g = geometry();
        let root = Node::Root(InteriorNode {
            keys: Vec::new(),
            children: vec![7],
        });

        assert_eq!(Node::decode(&root.encode(&g), &g).expect("decode"), root);
    }

    #[test]
    fn test_leaf_node_roundtrip() {
        let g = geometry();
        let leaf = Node::Leaf(LeafNode {
            entries: vec![
                KeyValuePair::new(key(1), b"value001".to_vec()),
                KeyValuePair::new(key(2), b"value002".to_vec()),
            ],
        });

        assert_eq!(Node::decode(&leaf.encode(&g), &g).expect("decode"), leaf);
    }

    #[test]
    fn test_free_block_shares_link_field() {
        let g = geometry();
        let block = Node::Free(FreeBlock { next: 99 }).encode(&g);

        let header = NodeHeader::read(&block).expect("header");
        assert_eq!(header.node_type, NodeType::Unallocated);
        assert_eq!(header.link, 99);
        assert_eq!(
            Node::decode(&block, &g).expect("decode"),
            Node::Free(FreeBlock { next: 99 })
        );
    }

    #[test]
    fn test_decode_rejects_corruption() {
        let g = geometry();
        let mut block = Node::Leaf(LeafNode::default()).encode(&g);
        block.as_bytes_mut()[100] ^= 0x10;

        assert!(matches!(
            Node::decode(&block, &g),
            Err(NodeError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let g = geometry();
        let mut block = Node::Leaf(LeafNode::default()).encode(&g);
        block.write_u8(0, 0x42);
        block.seal();

        assert_eq!(
            Node::decode(&block, &g),
            Err(NodeError::InvalidNodeType(0x42))
        );
    }

    #[test]
    fn test_decode_rejects_other_geometry() {
        let written = Geometry::new(8, 8, 512).expect("geometry");
        let reading = Geometry::new(8, 16, 512).expect("geometry");
        let block = Node::Leaf(LeafNode::default()).encode(&written);

        assert!(matches!(
            Node::decode(&block, &reading),
            Err(NodeError::GeometryMismatch { value_size: 8, .. })
        ));
    }

    #[test]
    fn test_interior_child_routing() {
        let node = InteriorNode {
            keys: vec![key(10), key(20), key(30)],
            children: vec![100, 200, 300, 400],
        };

        assert_eq!(node.child_for(&key(5)), Some(100));
        // Equal keys route right.
        assert_eq!(node.child_for(&key(10)), Some(200));
        assert_eq!(node.child_for(&key(15)), Some(200));
        assert_eq!(node.child_for(&key(30)), Some(400));
        assert_eq!(node.child_for(&key(35)), Some(400));
        assert_eq!(InteriorNode::default().child_for(&key(1)), None);
    }

    #[test]
    fn test_interior_insert_places_right_child() {
        let mut node = InteriorNode::with_children(100, key(20), 200);
        node.insert(key(10), 150);
        node.insert(key(30), 250);

        assert_eq!(node.keys, vec![key(10), key(20), key(30)]);
        assert_eq!(node.children, vec![100, 150, 200, 250]);
    }

    #[test]
    fn test_leaf_split_copies_separator() {
        let mut leaf = LeafNode {
            entries: (1..=5u8).map(|i| KeyValuePair::new(key(i), vec![i; 8])).collect(),
        };

        let (separator, right) = leaf.split();

        assert_eq!(leaf.entries.len(), 3);
        assert_eq!(right.entries.len(), 2);
        assert_eq!(separator, key(4));
        assert_eq!(right.entries[0].key, separator);
    }

    #[test]
    fn test_interior_split_moves_median() {
        let mut node = InteriorNode {
            keys: (1..=5u8).map(key).collect(),
            children: vec![10, 20, 30, 40, 50, 60],
        };

        let (median, right) = node.split();

        assert_eq!(median, key(3));
        assert_eq!(node.keys, vec![key(1), key(2)]);
        assert_eq!(node.children, vec![10, 20, 30]);
        assert_eq!(right.keys, vec![key(4), key(5)]);
        assert_eq!(right.children, vec![40, 50, 60]);
    }
}
