//! Serializable snapshot of a discipline tree.
//!
//! The snapshot mirrors the tree as nested maps keyed by cleaned name:
//!
//! ```text
//! { "人文学科": { "is_completed": true, "original_name": "人文学科",
//!                "path": "...", "files": [], "is_leaf": false,
//!                "children": { "哲学": { ... } } } }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::arena::{DisciplineNode, DisciplineTree};
use crate::domain::builder::TreeResult;
use crate::domain::marker::MarkerCodec;

/// Persisted form of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub is_completed: bool,
    pub original_name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub is_leaf: bool,
    #[serde(default)]
    pub children: BTreeMap<String, SnapshotNode>,
}

/// Persisted form of a whole tree: top-level cleaned name to node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(pub BTreeMap<String, SnapshotNode>);

impl Snapshot {
    pub fn from_tree(tree: &DisciplineTree) -> Self {
        Self(
            tree.roots()
                .iter()
                .filter_map(|&idx| snapshot_entry(tree, idx))
                .collect(),
        )
    }

    /// Rebuild the arena from the snapshot.
    ///
    /// Completion is re-derived from `original_name` and leaves are reclassified,
    /// so an edited snapshot cannot contradict the marker convention.
    pub fn into_tree(self, base_dir: &Path, codec: &MarkerCodec) -> TreeResult<DisciplineTree> {
        let mut tree = DisciplineTree::new(base_dir);
        let mut stack: Vec<(Option<Index>, String, SnapshotNode)> = self
            .0
            .into_iter()
            .map(|(name, node)| (None, name, node))
            .collect();

        while let Some((parent, name, record)) = stack.pop() {
            let (_, derived) = codec.decode(&record.original_name);
            if derived != record.is_completed {
                warn!(
                    "snapshot: '{}' recorded as {} but its name says {}; trusting the name",
                    record.original_name,
                    completion_word(record.is_completed),
                    completion_word(derived)
                );
            }
            let mut node = DisciplineNode::new(name, record.original_name, record.path, derived);
            node.files.extend(record.files);
            let idx = tree.insert_node(node, parent);
            stack.extend(
                record
                    .children
                    .into_iter()
                    .map(|(child_name, child)| (Some(idx), child_name, child)),
            );
        }

        tree.classify_leaves();
        Ok(tree)
    }
}

fn completion_word(completed: bool) -> &'static str {
    if completed {
        "complete"
    } else {
        "incomplete"
    }
}

fn snapshot_entry(tree: &DisciplineTree, idx: Index) -> Option<(String, SnapshotNode)> {
    let node = tree.get_node(idx)?;
    let children = node
        .children()
        .iter()
        .filter_map(|&child| snapshot_entry(tree, child))
        .collect();
    Some((
        node.name.clone(),
        SnapshotNode {
            is_completed: node.is_completed,
            original_name: node.original_name.clone(),
            path: node.path.clone(),
            files: node.files.iter().cloned().collect(),
            is_leaf: node.is_leaf,
            children,
        },
    ))
}
