//! Cached flat index of leaf paths.
//!
//! Flat-key and object overlays resolve their targets through an index of
//! every root-to-leaf key path in the tree, produced by one depth-first
//! traversal. The index stores paths rather than references into the tree;
//! the overlay engine re-resolves the target slot when it writes.

use std::collections::BTreeSet;

use crate::tree::{MapNode, Node};

/// Depth-first index of every root-to-leaf key path in a tree, one entry
/// per leaf.
#[derive(Debug, Clone)]
pub(crate) struct FlatIndex {
    paths: BTreeSet<Vec<String>>,
}

impl FlatIndex {
    /// Build the index with one full traversal of `root`.
    pub(crate) fn build(root: &MapNode) -> Self {
        let mut paths = BTreeSet::new();
        collect_leaf_paths(root, &mut Vec::new(), &mut paths);
        Self { paths }
    }

    /// Iterate all indexed leaf paths in lexicographic order.
    pub(crate) fn paths(&self) -> impl Iterator<Item = &[String]> {
        self.paths.iter().map(Vec::as_slice)
    }

    /// Whether `path` addresses a leaf that existed at build time.
    pub(crate) fn contains(&self, path: &[String]) -> bool {
        self.paths.contains(path)
    }

    /// Number of indexed leaves.
    pub(crate) fn len(&self) -> usize {
        self.paths.len()
    }
}

fn collect_leaf_paths(node: &MapNode, stack: &mut Vec<String>, out: &mut BTreeSet<Vec<String>>) {
    for (key, child) in node.iter() {
        stack.push(key.to_string());
        match child {
            Node::Map(map) => collect_leaf_paths(map, stack, out),
            Node::Leaf(_) => {
                out.insert(stack.clone());
            }
        }
        stack.pop();
    }
}
