//! Human-readable renderings of the tree.

use std::collections::HashSet;
use std::io::Write;
use std::str::FromStr;

use crate::btree::node::{InteriorNode, LeafNode, Node};
use crate::btree::tree::{BTreeError, BTreeIndex};
use crate::store::{BlockId, BlockStore, StoreError};

/// Output format for [`BTreeIndex::display`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayFormat {
    /// One line per node in depth-first order.
    #[default]
    Depth,
    /// A Graphviz `digraph` with one vertex per node.
    DepthDot,
    /// `(key,value)` lines for every pair, in key order.
    SortedKeyValue,
}

impl FromStr for DisplayFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "depth" => Ok(Self::Depth),
            "dot" => Ok(Self::DepthDot),
            "sorted" => Ok(Self::SortedKeyValue),
            other => Err(format!(
                "unknown display format '{other}' (expected depth, dot or sorted)"
            )),
        }
    }
}

impl<S: BlockStore> BTreeIndex<'_, S> {
    /// Render the tree. Read-only.
    pub fn display(&mut self, format: DisplayFormat) -> Result<String, BTreeError> {
        let mut lines = Vec::new();
        let mut visited = HashSet::new();

        if format == DisplayFormat::DepthDot {
            lines.push("digraph tree {".to_string());
        }
        self.render(self.superblock.root, format, &mut visited, &mut lines)?;
        if format == DisplayFormat::DepthDot {
            lines.push("}".to_string());
        }

        let mut out = lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        Ok(out)
    }

    /// Render the tree into `out`.
    pub fn write_display(
        &mut self,
        format: DisplayFormat,
        out: &mut impl Write,
    ) -> Result<(), BTreeError> {
        let rendered = self.display(format)?;
        out.write_all(rendered.as_bytes()).map_err(StoreError::from)?;
        Ok(())
    }

    /// Write the tree to `out` as a Graphviz `digraph`.
    pub fn print(&mut self, out: &mut impl Write) -> Result<(), BTreeError> {
        self.write_display(DisplayFormat::DepthDot, out)
    }

    fn render(
        &mut self,
        block: BlockId,
        format: DisplayFormat,
        visited: &mut HashSet<BlockId>,
        lines: &mut Vec<String>,
    ) -> Result<(), BTreeError> {
        if !visited.insert(block) {
            return Err(BTreeError::InnerLoop { block });
        }

        match self.read_node(block)? {
            Node::Root(node) | Node::Interior(node) => {
                let tokens = interior_tokens(&node);
                match format {
                    DisplayFormat::Depth => lines.push(label(block, Some("Interior:"), &tokens)),
                    DisplayFormat::DepthDot => lines.push(dot_vertex(block, &tokens)),
                    DisplayFormat::SortedKeyValue => {}
                }

                for &child in &node.children {
                    if format == DisplayFormat::DepthDot {
                        lines.push(format!("  {block} -> {child};"));
                    }
                    self.render(child, format, visited, lines)?;
                }
                Ok(())
            }
            Node::Leaf(leaf) => {
                match format {
                    DisplayFormat::Depth => {
                        lines.push(label(block, Some("Leaf:"), &leaf_tokens(&leaf)));
                    }
                    DisplayFormat::DepthDot => lines.push(dot_vertex(block, &leaf_tokens(&leaf))),
                    DisplayFormat::SortedKeyValue => {
                        lines.extend(leaf.entries.iter().map(|e| {
                            format!("({},{})", printable(&e.key), printable(&e.value))
                        }));
                    }
                }
                Ok(())
            }
            other => Err(BTreeError::BadType {
                block,
                found: other.node_type() as u8,
            }),
        }
    }
}

/// `*c0 k0 *c1 ...`: every child pointer with the separators between them.
fn interior_tokens(node: &InteriorNode) -> Vec<String> {
    let mut tokens = Vec::with_capacity(node.children.len() + node.keys.len());
    for (i, child) in node.children.iter().enumerate() {
        tokens.push(format!("*{child}"));
        if let Some(key) = node.keys.get(i) {
            tokens.push(printable(key));
        }
    }
    tokens
}

fn leaf_tokens(leaf: &LeafNode) -> Vec<String> {
    leaf.entries
        .iter()
        .flat_map(|e| [printable(&e.key), printable(&e.value)])
        .collect()
}

fn label(block: BlockId, kind: Option<&str>, tokens: &[String]) -> String {
    let mut label = format!("{block}:");
    for part in kind.into_iter().chain(tokens.iter().map(String::as_str)) {
        label.push(' ');
        label.push_str(part);
    }
    label
}

/// Vertex labels carry no node kind. Quotes and backslashes come out
/// escaped, so the label is DOT-safe.
fn dot_vertex(block: BlockId, tokens: &[String]) -> String {
    format!("  {block} [ label=\"{}\" ];", label(block, None, tokens))
}

/// Printable ASCII as-is, everything else as an escape sequence.
fn printable(bytes: &[u8]) -> String {
    bytes.escape_ascii().to_string()
}
