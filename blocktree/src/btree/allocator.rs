//! Free-list block allocator.
//!
//! Unused blocks are threaded into a singly linked list through the `link`
//! field of `Free` nodes. The superblock holds the head; `0` ends the list.
//! Allocation pops the head and deallocation pushes onto it, so both are a
//! single block read plus two writes.

use crate::btree::node::{FreeBlock, Geometry, InteriorNode, Node};
use crate::btree::superblock::Superblock;
use crate::btree::tree::{BTreeError, BTreeIndex};
use crate::store::{BlockId, BlockStore};

/// Format `store` for a new index with its superblock at `superblock_block`.
///
/// Writes an empty root right after the superblock and threads every later
/// block into an ascending free list.
pub(crate) fn format<S: BlockStore>(
    store: &mut S,
    superblock_block: BlockId,
    geometry: &Geometry,
) -> Result<Superblock, BTreeError> {
    let block_count = store.block_count();
    let root = match superblock_block.checked_add(1) {
        Some(root) if root < block_count => root,
        _ => return Err(BTreeError::NoSpace),
    };

    let first_free = root + 1;
    for block in first_free..block_count {
        let next = if block + 1 < block_count { block + 1 } else { 0 };
        store.write_block(block, &Node::Free(FreeBlock { next }).encode(geometry))?;
    }

    store.write_block(root, &Node::Root(InteriorNode::default()).encode(geometry))?;

    let free_list_head = if first_free < block_count { first_free } else { 0 };
    let superblock = Superblock::new(geometry, root, free_list_head);
    store.write_block(superblock_block, &superblock.to_block())?;

    store.notify_allocate(superblock_block);
    store.notify_allocate(root);

    Ok(superblock)
}

impl<S: BlockStore> BTreeIndex<'_, S> {
    /// Take a block off the free list.
    ///
    /// # Panics
    ///
    /// Panics if the free list head is not a free block.
    pub fn allocate_node(&mut self) -> Result<BlockId, BTreeError> {
        let block = self.superblock.free_list_head;
        if block == 0 {
            return Err(BTreeError::NoSpace);
        }

        let next = match self.read_node(block)? {
            Node::Free(free) => free.next,
            other => panic!(
                "free list corrupted: block {block} is a {} node",
                other.node_type()
            ),
        };

        self.commit_superblock(Superblock {
            free_list_head: next,
            ..self.superblock
        })?;
        self.store.notify_allocate(block);

        tracing::debug!(block, next, "allocated block");
        Ok(block)
    }

    /// Return a block to the free list.
    ///
    /// # Panics
    ///
    /// Panics if the block is already free or is the superblock.
    pub fn deallocate_node(&mut self, block: BlockId) -> Result<(), BTreeError> {
        assert_ne!(
            block, self.superblock_block,
            "attempted to free the superblock"
        );

        if let Node::Free(_) = self.read_node(block)? {
            panic!("double free of block {block}");
        }

        self.push_free(block)?;
        tracing::debug!(block, "deallocated block");
        Ok(())
    }

    fn push_free(&mut self, block: BlockId) -> Result<(), BTreeError> {
        let free = Node::Free(FreeBlock {
            next: self.superblock.free_list_head,
        });
        self.write_node(block, &free)?;

        self.commit_superblock(Superblock {
            free_list_head: block,
            ..self.superblock
        })?;
        self.store.notify_deallocate(block);
        Ok(())
    }

    /// Put blocks a failed operation reserved but never linked back on the
    /// free list, most recently allocated last.
    pub(crate) fn release_unused(&mut self, blocks: Vec<BlockId>) {
        for block in blocks.into_iter().rev() {
            if let Err(e) = self.push_free(block) {
                tracing::warn!(block, "cannot return reserved block: {e}");
            }
        }
    }

    /// Take `count` blocks, or none at all if the free list runs out.
    pub(crate) fn allocate_nodes(&mut self, count: usize) -> Result<Vec<BlockId>, BTreeError> {
        let mut blocks = Vec::with_capacity(count);
        for _ in 0..count {
            match self.allocate_node() {
                Ok(block) => blocks.push(block),
                Err(e) => {
                    // Blocks taken so far are untouched; push them back in
                    // reverse so the list is restored in order.
                    while let Some(block) = blocks.pop() {
                        self.push_free(block)?;
                    }
                    return Err(e);
                }
            }
        }
        Ok(blocks)
    }

    /// Number of blocks on the free list.
    pub fn free_block_count(&mut self) -> Result<u64, BTreeError> {
        let limit = self.store.block_count();
        let mut count = 0;
        let mut current = self.superblock.free_list_head;

        while current != 0 {
            if count >= limit {
                return Err(BTreeError::InnerLoop { block: current });
            }
            current = match self.read_node(current)? {
                Node::Free(free) => free.next,
                other => {
                    return Err(BTreeError::BadType {
                        block: current,
                        found: other.node_type() as u8,
                    });
                }
            };
            count += 1;
        }

        Ok(count)
    }
}
