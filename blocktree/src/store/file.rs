//! File-backed block store.
//!
//! Block `n` occupies bytes `n * block_size .. (n + 1) * block_size` of a
//! single file. The file is sized once at creation; the store never grows.

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::store::{Block, BlockId, BlockStore, StoreError, check_bounds};

/// A [`BlockStore`] over a single file.
pub struct FileStore {
    file: File,
    path: PathBuf,
    block_size: usize,
    block_count: u64,
    /// Blocks reported allocated since the store was opened.
    allocated: BTreeSet<BlockId>,
}

impl FileStore {
    /// Create a new file of `block_count` zeroed blocks.
    ///
    /// Returns an error if the file already exists.
    pub fn create(path: &Path, block_size: usize, block_count: u64) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        file.set_len(block_count * block_size as u64)?;
        file.sync_all()?;

        tracing::info!(
            path = %path.display(),
            block_size,
            block_count,
            "created block file"
        );

        Ok(Self {
            file,
            path: path.to_path_buf(),
            block_size,
            block_count,
            allocated: BTreeSet::new(),
        })
    }

    /// Open an existing block file.
    ///
    /// The block count is derived from the file length.
    pub fn open(path: &Path, block_size: usize) -> Result<Self, StoreError> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        let len = file.metadata()?.len();
        let block_size_u64 = block_size as u64;
        if block_size == 0 || len % block_size_u64 != 0 {
            return Err(StoreError::TruncatedFile { len, block_size });
        }

        Ok(Self {
            file,
            path: path.to_path_buf(),
            block_size,
            block_count: len / block_size_u64,
            allocated: BTreeSet::new(),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sync all pending writes to disk.
    pub fn sync(&self) -> Result<(), StoreError> {
        self.file.sync_all().map_err(StoreError::Io)
    }

    /// Number of allocation notifications not yet matched by a deallocation.
    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.allocated.len()
    }

    const fn offset(&self, block: BlockId) -> u64 {
        block * self.block_size as u64
    }
}

impl BlockStore for FileStore {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn block_count(&self) -> u64 {
        self.block_count
    }

    fn read_block(&mut self, block: BlockId) -> Result<Block, StoreError> {
        check_bounds(block, self.block_count)?;

        let mut data = Block::zeroed(self.block_size);
        self.file.seek(SeekFrom::Start(self.offset(block)))?;
        self.file.read_exact(data.as_bytes_mut())?;

        Ok(data)
    }

    fn write_block(&mut self, block: BlockId, data: &Block) -> Result<(), StoreError> {
        check_bounds(block, self.block_count)?;

        if data.len() != self.block_size {
            return Err(StoreError::WrongBlockSize {
                expected: self.block_size,
                actual: data.len(),
            });
        }

        self.file.seek(SeekFrom::Start(self.offset(block)))?;
        self.file.write_all(data.as_bytes())?;

        Ok(())
    }

    fn notify_allocate(&mut self, block: BlockId) {
        self.allocated.insert(block);
    }

    fn notify_deallocate(&mut self, block: BlockId) {
        self.allocated.remove(&block);
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("block_size", &self.block_size)
            .field("block_count", &self.block_count)
            .finish_non_exhaustive()
    }
}
