//! In-memory block store with fault injection.
//!
//! Blocks live in a `Vec` sized up front. Faults can be injected at the
//! block boundary:
//! - read and write errors
//! - bit flips on read
//! - torn writes (the tail of the block is lost)
//!
//! All randomness comes from a seeded RNG, so the same seed reproduces the
//! same fault pattern.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::store::{Block, BlockId, BlockStore, StoreError, check_bounds};

/// Configuration for fault injection.
#[derive(Debug, Clone, Default)]
pub struct FaultConfig {
    /// Probability of a read error (0.0 - 1.0).
    pub read_error_rate: f64,
    /// Probability of a write error (0.0 - 1.0).
    pub write_error_rate: f64,
    /// Probability of block corruption on read (0.0 - 1.0).
    pub corruption_rate: f64,
    /// Probability of a torn write (0.0 - 1.0).
    pub torn_write_rate: f64,
}

impl FaultConfig {
    /// No faults.
    #[must_use]
    pub fn no_faults() -> Self {
        Self::default()
    }

    /// Every read returns a corrupted block.
    #[must_use]
    pub const fn always_corrupt() -> Self {
        Self {
            read_error_rate: 0.0,
            write_error_rate: 0.0,
            corruption_rate: 1.0,
            torn_write_rate: 0.0,
        }
    }

    /// Every write fails.
    #[must_use]
    pub const fn failing_writes() -> Self {
        Self {
            read_error_rate: 0.0,
            write_error_rate: 1.0,
            corruption_rate: 0.0,
            torn_write_rate: 0.0,
        }
    }

    /// Every write is torn.
    #[must_use]
    pub const fn torn_writes() -> Self {
        Self {
            read_error_rate: 0.0,
            write_error_rate: 0.0,
            corruption_rate: 0.0,
            torn_write_rate: 1.0,
        }
    }
}

/// Statistics about store operations.
#[derive(Debug, Default, Clone)]
pub struct MemoryStoreStats {
    /// Number of block reads.
    pub reads: u64,
    /// Number of block writes.
    pub writes: u64,
    /// Number of allocation notifications.
    pub allocations: u64,
    /// Number of deallocation notifications.
    pub deallocations: u64,
    /// Number of injected read errors.
    pub injected_read_errors: u64,
    /// Number of injected write errors.
    pub injected_write_errors: u64,
    /// Number of corrupted blocks returned.
    pub corrupted_reads: u64,
    /// Number of torn writes.
    pub torn_writes: u64,
}

/// An in-memory [`BlockStore`].
///
/// Not thread-safe; the engine drives it from a single writer.
pub struct MemoryStore {
    blocks: Vec<Block>,
    block_size: usize,
    /// Blocks the engine has reported as allocated.
    allocated: BTreeSet<BlockId>,
    fault_config: FaultConfig,
    rng: StdRng,
    stats: MemoryStoreStats,
}

impl MemoryStore {
    /// Create a fault-free store of `block_count` zeroed blocks.
    #[must_use]
    pub fn new(block_size: usize, block_count: u64) -> Self {
        Self::with_faults(block_size, block_count, 0, FaultConfig::default())
    }

    /// Create a store with the given fault configuration and RNG seed.
    #[must_use]
    pub fn with_faults(
        block_size: usize,
        block_count: u64,
        seed: u64,
        fault_config: FaultConfig,
    ) -> Self {
        assert!(block_size > 0, "block size must be positive");
        let blocks = (0..block_count).map(|_| Block::zeroed(block_size)).collect();

        Self {
            blocks,
            block_size,
            allocated: BTreeSet::new(),
            fault_config,
            rng: StdRng::seed_from_u64(seed),
            stats: MemoryStoreStats::default(),
        }
    }

    /// Get the current statistics.
    #[must_use]
    pub const fn stats(&self) -> &MemoryStoreStats {
        &self.stats
    }

    /// Reset statistics.
    pub fn reset_stats(&mut self) {
        self.stats = MemoryStoreStats::default();
    }

    /// Update the fault configuration.
    pub fn set_fault_config(&mut self, config: FaultConfig) {
        self.fault_config = config;
    }

    /// Whether the engine has reported `block` as allocated.
    #[must_use]
    pub fn is_allocated(&self, block: BlockId) -> bool {
        self.allocated.contains(&block)
    }

    /// Number of blocks currently reported as allocated.
    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.allocated.len()
    }

    fn should_inject_fault(&mut self, rate: f64) -> bool {
        if rate <= 0.0 {
            return false;
        }
        self.rng.random::<f64>() < rate
    }

    /// Flip 1-8 random bits.
    fn corrupt_block(&mut self, block: &mut Block) {
        let num_flips = self.rng.random_range(1..=8);
        for _ in 0..num_flips {
            let byte_offset = self.rng.random_range(0..self.block_size);
            let bit = self.rng.random_range(0..8u8);
            block.as_bytes_mut()[byte_offset] ^= 1 << bit;
        }
    }

    /// Zero everything past a random cutoff.
    fn tear_write(&mut self, block: &mut Block) {
        let cutoff = self.rng.random_range(0..self.block_size);
        for byte in block.as_bytes_mut().iter_mut().skip(cutoff) {
            *byte = 0;
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn index(block: BlockId) -> usize {
        block as usize
    }
}

impl BlockStore for MemoryStore {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn block_count(&self) -> u64 {
        self.blocks.len() as u64
    }

    fn read_block(&mut self, block: BlockId) -> Result<Block, StoreError> {
        self.stats.reads += 1;
        check_bounds(block, self.block_count())?;

        if self.should_inject_fault(self.fault_config.read_error_rate) {
            self.stats.injected_read_errors += 1;
            return Err(StoreError::InjectedFault(format!(
                "simulated read error on block {block}"
            )));
        }

        let mut data = self.blocks[Self::index(block)].clone();

        if self.should_inject_fault(self.fault_config.corruption_rate) {
            self.stats.corrupted_reads += 1;
            self.corrupt_block(&mut data);
        }

        Ok(data)
    }

    fn write_block(&mut self, block: BlockId, data: &Block) -> Result<(), StoreError> {
        self.stats.writes += 1;
        check_bounds(block, self.block_count())?;

        if data.len() != self.block_size {
            return Err(StoreError::WrongBlockSize {
                expected: self.block_size,
                actual: data.len(),
            });
        }

        if self.should_inject_fault(self.fault_config.write_error_rate) {
            self.stats.injected_write_errors += 1;
            return Err(StoreError::InjectedFault(format!(
                "simulated write error on block {block}"
            )));
        }

        let mut to_write = data.clone();
        if self.should_inject_fault(self.fault_config.torn_write_rate) {
            self.stats.torn_writes += 1;
            self.tear_write(&mut to_write);
        }

        self.blocks[Self::index(block)] = to_write;
        Ok(())
    }

    fn notify_allocate(&mut self, block: BlockId) {
        self.stats.allocations += 1;
        self.allocated.insert(block);
    }

    fn notify_deallocate(&mut self, block: BlockId) {
        self.stats.deallocations += 1;
        self.allocated.remove(&block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_back_written_block() {
        let mut store = MemoryStore::new(64, 4);
        let mut block = Block::zeroed(64);
        block.write_bytes(10, b"abc");

        store.write_block(2, &block).expect("write");
        let read = store.read_block(2).expect("read");
        assert_eq!(read.read_bytes(10, 3), b"abc");
        assert_eq!(store.stats().reads, 1);
        assert_eq!(store.stats().writes, 1);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut store = MemoryStore::new(64, 4);
        assert!(matches!(
            store.read_block(4),
            Err(StoreError::BlockOutOfBounds { block: 4, block_count: 4 })
        ));
    }

    #[test]
    fn test_rejects_wrong_size() {
        let mut store = MemoryStore::new(64, 4);
        let result = store.write_block(0, &Block::zeroed(32));
        assert!(matches!(
            result,
            Err(StoreError::WrongBlockSize { expected: 64, actual: 32 })
        ));
    }

    #[test]
    fn test_allocation_bookkeeping() {
        let mut store = MemoryStore::new(64, 4);
        store.notify_allocate(1);
        store.notify_allocate(3);
        assert!(store.is_allocated(1));
        assert_eq!(store.allocated_count(), 2);

        store.notify_deallocate(1);
        assert!(!store.is_allocated(1));
        assert_eq!(store.stats().deallocations, 1);
    }

    #[test]
    fn test_failing_writes() {
        let mut store = MemoryStore::with_faults(64, 4, 7, FaultConfig::failing_writes());
        let result = store.write_block(0, &Block::zeroed(64));
        assert!(matches!(result, Err(StoreError::InjectedFault(_))));
        assert_eq!(store.stats().injected_write_errors, 1);
    }

    #[test]
    fn test_torn_write_zeroes_tail() {
        let mut store = MemoryStore::with_faults(64, 2, 3, FaultConfig::torn_writes());
        let mut block = Block::zeroed(64);
        block.write_bytes(0, &[0xAB; 64]);

        store.write_block(1, &block).expect("torn writes still succeed");
        assert_eq!(store.stats().torn_writes, 1);

        let read = store.read_block(1).expect("read");
        let bytes = read.as_bytes();
        let cutoff = bytes.iter().position(|&b| b == 0).expect("tail was cut");
        assert!(bytes[..cutoff].iter().all(|&b| b == 0xAB));
        assert!(bytes[cutoff..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_corruption_is_deterministic() {
        let read_with_seed = |seed| {
            let mut store = MemoryStore::with_faults(64, 2, seed, FaultConfig::always_corrupt());
            let block = store.read_block(1).expect("read");
            assert_eq!(store.stats().corrupted_reads, 1);
            block
        };

        let a = read_with_seed(42);
        let b = read_with_seed(42);
        assert_eq!(a, b, "same seed should produce the same corruption");
    }
}
