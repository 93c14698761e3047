//! Root-to-leaf descent, lookup and in-place update.

use crate::btree::node::{InteriorNode, LeafNode, Node, NodeError};
use crate::btree::tree::{BTreeError, BTreeIndex};
use crate::store::{BlockId, BlockStore};

/// The blocks visited on the way down to the leaf that covers a key.
#[derive(Debug)]
pub(crate) struct Descent {
    /// Root first, the leaf's parent last.
    pub ancestors: Vec<(BlockId, InteriorNode)>,
    /// `None` when the root is empty.
    pub leaf: Option<(BlockId, LeafNode)>,
}

impl<S: BlockStore> BTreeIndex<'_, S> {
    /// Look up the value stored under `key`.
    pub fn lookup(&mut self, key: &[u8]) -> Result<Vec<u8>, BTreeError> {
        self.check_key(key)?;

        let Some((_, leaf)) = self.descend(key)?.leaf else {
            return Err(BTreeError::NotFound);
        };
        leaf.get(key).map(<[u8]>::to_vec).ok_or(BTreeError::NotFound)
    }

    /// Overwrite the value stored under an existing key.
    pub fn update(&mut self, key: &[u8], value: &[u8]) -> Result<(), BTreeError> {
        self.check_key(key)?;
        self.check_value(value)?;

        let Some((block, mut leaf)) = self.descend(key)?.leaf else {
            return Err(BTreeError::NotFound);
        };
        let slot = leaf.find(key).map_err(|_| BTreeError::NotFound)?;

        leaf.entries[slot].value = value.to_vec();
        self.write_node(block, &Node::Leaf(leaf))
    }

    /// Walk from the root to the leaf that covers `key`.
    pub(crate) fn descend(&mut self, key: &[u8]) -> Result<Descent, BTreeError> {
        let mut ancestors = Vec::new();
        let mut current = self.superblock.root;
        let mut at_root = true;

        loop {
            match (self.read_tree_node(current)?, at_root) {
                (Node::Root(node), true) | (Node::Interior(node), false) => {
                    let Some(child) = node.child_for(key) else {
                        if at_root {
                            ancestors.push((current, node));
                            return Ok(Descent {
                                ancestors,
                                leaf: None,
                            });
                        }
                        return Err(BTreeError::Insane {
                            block: current,
                            reason: "interior node has no children",
                        });
                    };
                    ancestors.push((current, node));
                    current = child;
                    at_root = false;
                }
                (Node::Leaf(leaf), false) => {
                    return Ok(Descent {
                        ancestors,
                        leaf: Some((current, leaf)),
                    });
                }
                (Node::Root(_), false) => {
                    return Err(BTreeError::Insane {
                        block: current,
                        reason: "root node below the root",
                    });
                }
                _ => {
                    return Err(BTreeError::Insane {
                        block: current,
                        reason: "unexpected node type during descent",
                    });
                }
            }
        }
    }

    /// Read a node, treating an unknown type byte as a broken tree.
    fn read_tree_node(&mut self, block: BlockId) -> Result<Node, BTreeError> {
        match self.read_node(block) {
            Err(BTreeError::Node(NodeError::InvalidNodeType(_))) => Err(BTreeError::Insane {
                block,
                reason: "unknown node type during descent",
            }),
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::btree::node::{InteriorNode, KeyValuePair, LeafNode, Node};
    use crate::btree::tree::{BTreeError, BTreeIndex, Layout};
    use crate::store::{BlockStore, MemoryStore};

    const LAYOUT: Layout = Layout::new(8, 8);

    #[test]
    fn test_lookup_in_empty_tree() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");

        assert!(matches!(
            index.lookup(b"00000001"),
            Err(BTreeError::NotFound)
        ));
    }

    #[test]
    fn test_lookup_and_update() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");
        index.insert(b"00000001", b"value001").expect("insert");

        assert_eq!(index.lookup(b"00000001").expect("lookup"), b"value001");

        index.update(b"00000001", b"changed!").expect("update");
        assert_eq!(index.lookup(b"00000001").expect("lookup"), b"changed!");
    }

    #[test]
    fn test_update_missing_key() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");

        assert!(matches!(
            index.update(b"00000001", b"value001"),
            Err(BTreeError::NotFound)
        ));

        index.insert(b"00000001", b"value001").expect("insert");
        assert!(matches!(
            index.update(b"00000002", b"value002"),
            Err(BTreeError::NotFound)
        ));
    }

    #[test]
    fn test_update_rejects_wrong_value_size() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");
        index.insert(b"00000001", b"value001").expect("insert");

        assert!(matches!(
            index.update(b"00000001", b"toolongvalue"),
            Err(BTreeError::ValueSize {
                expected: 8,
                actual: 12
            })
        ));
    }

    #[test]
    fn test_separator_key_routes_right() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");

        // root 1 -> [leaf 2 | "00000005" | leaf 3]
        let left = LeafNode {
            entries: vec![KeyValuePair::new(b"00000001".to_vec(), b"left0001".to_vec())],
        };
        let right = LeafNode {
            entries: vec![KeyValuePair::new(b"00000005".to_vec(), b"right005".to_vec())],
        };
        index.write_node(2, &Node::Leaf(left)).expect("write");
        index.write_node(3, &Node::Leaf(right)).expect("write");
        index
            .write_node(
                1,
                &Node::Root(InteriorNode::with_children(2, b"00000005".to_vec(), 3)),
            )
            .expect("write");

        assert_eq!(index.lookup(b"00000005").expect("lookup"), b"right005");
        assert_eq!(index.lookup(b"00000001").expect("lookup"), b"left0001");
    }

    #[test]
    fn test_descent_into_free_block_is_insane() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");

        // Point the root at a block that is still on the free list.
        index
            .write_node(
                1,
                &Node::Root(InteriorNode {
                    keys: Vec::new(),
                    children: vec![4],
                }),
            )
            .expect("write");

        assert!(matches!(
            index.lookup(b"00000001"),
            Err(BTreeError::Insane { block: 4, .. })
        ));
    }

    #[test]
    fn test_unknown_node_type_is_insane() {
        let mut store = MemoryStore::new(512, 8);
        let mut index = BTreeIndex::attach(&mut store, 0, LAYOUT, true).expect("attach");
        index.insert(b"00000001", b"value001").expect("insert");

        let leaf_block = index.descend(b"00000001").expect("descend").leaf.expect("leaf").0;
        let mut raw = index.store.read_block(leaf_block).expect("read");
        raw.write_u8(0, 0x7F);
        raw.seal();
        index.store.write_block(leaf_block, &raw).expect("write");

        assert!(matches!(
            index.lookup(b"00000001"),
            Err(BTreeError::Insane { .. })
        ));
    }
}
