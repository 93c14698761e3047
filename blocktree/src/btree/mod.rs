//! Disk-backed B+tree index over fixed-size keys and values.
//!
//! Keys are compared bytewise. Values live only in leaves; interior nodes
//! hold copies of leaf keys for routing. The tree keeps no node cache: every
//! operation reads the nodes it needs from the block store and writes back
//! the ones it changes.
//!
//! Block usage, starting at the attach block:
//! - the superblock (layout, root pointer, free list head, key count)
//! - the root, which may be empty
//! - interior and leaf nodes
//! - free blocks, chained into a list

mod allocator;
mod check;
mod display;
mod insert;
pub mod node;
mod search;
pub mod superblock;
mod tree;

pub use display::DisplayFormat;
pub use node::{Geometry, NodeError, NodeType};
pub use superblock::Superblock;
pub use tree::{BTreeError, BTreeIndex, Layout};
