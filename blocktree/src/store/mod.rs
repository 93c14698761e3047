//! Block store abstraction.
//!
//! The B-tree engine never touches files directly. It consumes a
//! [`BlockStore`]: fixed-size block reads and writes addressed by block
//! number, plus advisory allocation hooks the store may use for bookkeeping
//! (dirty tracking, space accounting).
//!
//! Two implementations ship with the crate:
//! - [`MemoryStore`]: in-memory blocks with seeded fault injection, used by tests
//! - [`FileStore`]: blocks laid out back to back in a single file

mod block;
mod file;
mod memory;

pub use block::{Block, CHECKSUM_OFFSET};
pub use file::FileStore;
pub use memory::{FaultConfig, MemoryStore, MemoryStoreStats};

/// A block identifier (0-indexed block number).
pub type BlockId = u64;

/// Errors that can occur during block store operations.
#[derive(Debug)]
pub enum StoreError {
    /// I/O error.
    Io(std::io::Error),
    /// Block out of bounds.
    BlockOutOfBounds { block: BlockId, block_count: u64 },
    /// A buffer of the wrong size was handed to `write_block`.
    WrongBlockSize { expected: usize, actual: usize },
    /// The backing file is not a whole number of blocks.
    TruncatedFile { len: u64, block_size: usize },
    /// Injected fault for simulation.
    InjectedFault(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::BlockOutOfBounds { block, block_count } => write!(
                f,
                "block {block} out of bounds (block count: {block_count})"
            ),
            Self::WrongBlockSize { expected, actual } => {
                write!(f, "wrong block size: expected {expected}, got {actual}")
            }
            Self::TruncatedFile { len, block_size } => write!(
                f,
                "file length {len} is not a multiple of block size {block_size}"
            ),
            Self::InjectedFault(msg) => write!(f, "injected fault: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Abstraction over fixed-size block storage.
///
/// # Implementation Notes
///
/// Implementations must ensure:
/// - `read_block` returns the last written content for a block
/// - every returned block is exactly `block_size()` bytes
/// - `write_block` rejects buffers of any other size
///
/// The allocation hooks are advisory. The engine never consults a return
/// value from them.
pub trait BlockStore {
    /// Size of every block in bytes.
    fn block_size(&self) -> usize;

    /// Total number of blocks in the store.
    fn block_count(&self) -> u64;

    /// Read a block.
    fn read_block(&mut self, block: BlockId) -> Result<Block, StoreError>;

    /// Write a block.
    fn write_block(&mut self, block: BlockId, data: &Block) -> Result<(), StoreError>;

    /// The engine has taken `block` off its free list.
    fn notify_allocate(&mut self, block: BlockId);

    /// The engine has returned `block` to its free list.
    fn notify_deallocate(&mut self, block: BlockId);
}

/// Bounds check shared by the bundled stores.
pub(crate) fn check_bounds(block: BlockId, block_count: u64) -> Result<(), StoreError> {
    if block >= block_count {
        return Err(StoreError::BlockOutOfBounds { block, block_count });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let e = StoreError::BlockOutOfBounds {
            block: 10,
            block_count: 5,
        };
        assert!(e.to_string().contains("block 10"));
        assert!(e.to_string().contains("block count: 5"));

        let e = StoreError::InjectedFault("test fault".to_string());
        assert!(e.to_string().contains("test fault"));
    }

    #[test]
    fn test_check_bounds() {
        assert!(check_bounds(4, 5).is_ok());
        assert!(matches!(
            check_bounds(5, 5),
            Err(StoreError::BlockOutOfBounds { block: 5, .. })
        ));
    }
}
