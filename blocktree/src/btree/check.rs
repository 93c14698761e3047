//! Structural consistency checking.
//!
//! Walks every block reachable from the root, then the free list, then
//! makes sure no block was missed by both. Reports the first violation
//! found. Nothing is written.

use std::collections::HashSet;

use crate::btree::node::{Node, NodeError};
use crate::btree::tree::{BTreeError, BTreeIndex};
use crate::store::{BlockId, BlockStore};

impl<S: BlockStore> BTreeIndex<'_, S> {
    /// Verify the tree and free list.
    ///
    /// Checks, in depth-first order:
    /// - no block is reachable twice (`InnerLoop`)
    /// - every node has fewer keys than slots (`NodeOverflow`)
    /// - only the root may be an interior node without keys (`Insane`)
    /// - leaf keys are strictly increasing and fall between the routing
    ///   keys of their parents (`BadOrder`)
    /// - only the expected node types appear (`BadType`)
    /// - every block from the superblock to the end of the store is in the
    ///   tree or on the free list (`Insane`)
    ///
    /// The superblock and free-list blocks count as visited, so a tree node
    /// aliasing either is also an `InnerLoop`.
    pub fn sanity_check(&mut self) -> Result<(), BTreeError> {
        let mut visited = HashSet::from([self.superblock_block]);
        let mut keys = Vec::new();

        self.check_subtree(self.superblock.root, true, &mut visited, &mut keys)?;
        self.check_free_list(&mut visited)?;
        self.check_accounted(&visited)
    }

    fn check_subtree(
        &mut self,
        block: BlockId,
        is_root: bool,
        visited: &mut HashSet<BlockId>,
        keys: &mut Vec<Vec<u8>>,
    ) -> Result<(), BTreeError> {
        if !visited.insert(block) {
            return Err(BTreeError::InnerLoop { block });
        }

        match (self.read_checked(block)?, is_root) {
            (Node::Root(node), true) | (Node::Interior(node), false) => {
                let slots = self.geometry.interior_slots();
                if node.keys.len() >= slots {
                    return Err(BTreeError::NodeOverflow {
                        block,
                        key_count: node.keys.len(),
                        slots,
                    });
                }
                if node.keys.is_empty() && !is_root {
                    return Err(BTreeError::Insane {
                        block,
                        reason: "interior node has no keys",
                    });
                }
                let children_ok = if node.keys.is_empty() {
                    node.children.len() <= 1
                } else {
                    node.children.len() == node.keys.len() + 1
                };
                if !children_ok {
                    return Err(BTreeError::Insane {
                        block,
                        reason: "child count does not match key count",
                    });
                }

                let start = keys.len();
                for (i, &child) in node.children.iter().enumerate() {
                    let child_start = keys.len();
                    self.check_subtree(child, false, visited, keys)?;

                    let below = &keys[child_start..];
                    let lower = i.checked_sub(1).map(|j| node.keys[j].as_slice());
                    let upper = node.keys.get(i).map(Vec::as_slice);
                    let in_range = below.iter().all(|k| {
                        lower.is_none_or(|lo| k.as_slice() >= lo)
                            && upper.is_none_or(|hi| k.as_slice() < hi)
                    });
                    if !in_range {
                        return Err(BTreeError::BadOrder { block });
                    }
                }

                if !keys[start..].windows(2).all(|w| w[0] < w[1]) {
                    return Err(BTreeError::BadOrder { block });
                }
                Ok(())
            }
            (Node::Leaf(leaf), false) => {
                let slots = self.geometry.leaf_slots();
                if leaf.entries.len() >= slots {
                    return Err(BTreeError::NodeOverflow {
                        block,
                        key_count: leaf.entries.len(),
                        slots,
                    });
                }
                if leaf.entries.is_empty() {
                    return Err(BTreeError::Insane {
                        block,
                        reason: "leaf has no keys",
                    });
                }
                keys.extend(leaf.keys().map(<[u8]>::to_vec));
                Ok(())
            }
            (other, _) => Err(BTreeError::BadType {
                block,
                found: other.node_type() as u8,
            }),
        }
    }

    fn check_free_list(&mut self, visited: &mut HashSet<BlockId>) -> Result<(), BTreeError> {
        let mut current = self.superblock.free_list_head;

        while current != 0 {
            if !visited.insert(current) {
                return Err(BTreeError::InnerLoop { block: current });
            }
            current = match self.read_checked(current)? {
                Node::Free(free) => free.next,
                other => {
                    return Err(BTreeError::BadType {
                        block: current,
                        found: other.node_type() as u8,
                    });
                }
            };
        }
        Ok(())
    }

    fn check_accounted(&self, visited: &HashSet<BlockId>) -> Result<(), BTreeError> {
        let block_count = self.store.block_count();
        if let Some(block) = (self.superblock_block..block_count).find(|b| !visited.contains(b)) {
            return Err(BTreeError::Insane {
                block,
                reason: "block is neither in the tree nor on the free list",
            });
        }
        Ok(())
    }

    /// Read a node, reporting an unknown type byte as `BadType`.
    fn read_checked(&mut self, block: BlockId) -> Result<Node, BTreeError> {
        match self.read_node(block) {
            Err(BTreeError::Node(NodeError::InvalidNodeType(found))) => {
                Err(BTreeError::BadType { block, found })
            }
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::btree::node::{FreeBlock, InteriorNode, KeyValuePair, LeafNode, Node, NodeType};
    use crate::btree::tree::{BTreeError, BTreeIndex, Layout};
    use crate::store::MemoryStore;

    const LAYOUT: Layout = Layout::new(8, 8);

    fn leaf(keys: &[&[u8; 8]]) -> Node {
        Node::Leaf(LeafNode {
            entries: keys
                .iter()
                .map(|k| KeyValuePair::new(k.to_vec(), b"valueXXX".to_vec()))
                .collect(),
        })
    }

    #[test]
    fn test_fresh_index_is_sane() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");
        index.sanity_check().expect("sane");
    }

    #[test]
    fn test_detects_loop() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");

        index.write_node(2, &leaf(&[b"00000001"])).expect("write");
        index
            .write_node(1, &Node::Root(InteriorNode::with_children(2, b"00000005".to_vec(), 2)))
            .expect("write");

        assert!(matches!(
            index.sanity_check(),
            Err(BTreeError::InnerLoop { block: 2 })
        ));
    }

    #[test]
    fn test_detects_child_on_free_list() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");

        // Block 2 becomes a leaf without being taken off the free list.
        index.write_node(2, &leaf(&[b"00000001"])).expect("write");
        index
            .write_node(
                1,
                &Node::Root(InteriorNode {
                    keys: Vec::new(),
                    children: vec![2],
                }),
            )
            .expect("write");

        assert!(matches!(
            index.sanity_check(),
            Err(BTreeError::InnerLoop { block: 2 })
        ));
    }

    #[test]
    fn test_detects_bad_order() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");
        let left = index.allocate_node().expect("alloc");
        let right = index.allocate_node().expect("alloc");

        index
            .write_node(left, &leaf(&[b"00000001", b"00000009"]))
            .expect("write");
        index.write_node(right, &leaf(&[b"00000005"])).expect("write");
        index
            .write_node(
                1,
                &Node::Root(InteriorNode::with_children(left, b"00000005".to_vec(), right)),
            )
            .expect("write");

        assert!(matches!(
            index.sanity_check(),
            Err(BTreeError::BadOrder { block: 1 })
        ));
    }

    #[test]
    fn test_detects_key_on_wrong_side_of_separator() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");
        let left = index.allocate_node().expect("alloc");
        let right = index.allocate_node().expect("alloc");

        // Globally increasing, but "00000004" sits right of separator "00000005".
        index.write_node(left, &leaf(&[b"00000001"])).expect("write");
        index.write_node(right, &leaf(&[b"00000004"])).expect("write");
        index
            .write_node(
                1,
                &Node::Root(InteriorNode::with_children(left, b"00000005".to_vec(), right)),
            )
            .expect("write");

        assert!(matches!(
            index.sanity_check(),
            Err(BTreeError::BadOrder { block: 1 })
        ));
    }

    #[test]
    fn test_detects_overflow() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");
        let slots = index.geometry().leaf_slots();
        let child = index.allocate_node().expect("alloc");

        let full = Node::Leaf(LeafNode {
            entries: (0..slots)
                .map(|i| KeyValuePair::new(format!("{i:08}").into_bytes(), b"valueXXX".to_vec()))
                .collect(),
        });
        index.write_node(child, &full).expect("write");
        index
            .write_node(
                1,
                &Node::Root(InteriorNode {
                    keys: Vec::new(),
                    children: vec![child],
                }),
            )
            .expect("write");

        assert!(matches!(
            index.sanity_check(),
            Err(BTreeError::NodeOverflow { key_count, .. }) if key_count == slots
        ));
    }

    #[test]
    fn test_detects_empty_interior() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");
        let interior = index.allocate_node().expect("alloc");

        index
            .write_node(interior, &Node::Interior(InteriorNode::default()))
            .expect("write");
        index
            .write_node(
                1,
                &Node::Root(InteriorNode {
                    keys: Vec::new(),
                    children: vec![interior],
                }),
            )
            .expect("write");

        assert!(matches!(
            index.sanity_check(),
            Err(BTreeError::Insane { block, .. }) if block == interior
        ));
    }

    #[test]
    fn test_detects_bad_type_in_free_list() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");

        index.write_node(3, &leaf(&[b"00000001"])).expect("write");

        assert!(matches!(
            index.sanity_check(),
            Err(BTreeError::BadType { block: 3, found }) if found == NodeType::Leaf as u8
        ));
    }

    #[test]
    fn test_detects_orphaned_block() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");
        index.allocate_node().expect("alloc");

        assert!(matches!(
            index.sanity_check(),
            Err(BTreeError::Insane { block: 2, .. })
        ));
    }

    #[test]
    fn test_ignores_blocks_before_superblock() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 3, LAYOUT, true).expect("attach");
        index.insert(b"00000001", b"valueXXX").expect("insert");
        index.sanity_check().expect("sane");
    }

    #[test]
    fn test_detects_free_list_cycle() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");

        index
            .write_node(4, &Node::Free(FreeBlock { next: 2 }))
            .expect("write");

        assert!(matches!(
            index.sanity_check(),
            Err(BTreeError::InnerLoop { block: 2 })
        ));
    }
}
