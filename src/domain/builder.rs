//! Tree builder turning scanned directories into a discipline tree.

use std::path::{Component, Path};

use tracing::{debug, instrument};

use crate::domain::arena::{DisciplineNode, DisciplineTree};
use crate::domain::entities::ScanRecord;
use crate::domain::error::DomainError;
use crate::domain::marker::MarkerCodec;

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, DomainError>;

/// Constructs a discipline tree from scanner records.
pub struct TreeBuilder {
    codec: MarkerCodec,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(MarkerCodec::default())
    }
}

impl TreeBuilder {
    pub fn new(codec: MarkerCodec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &MarkerCodec {
        &self.codec
    }

    /// Build and classify a tree from records in any order.
    #[instrument(level = "debug", skip(self, records))]
    pub fn build<I>(&self, base_dir: &Path, records: I) -> TreeResult<DisciplineTree>
    where
        I: IntoIterator<Item = ScanRecord>,
    {
        let mut tree = DisciplineTree::new(base_dir);
        let mut count = 0usize;
        for record in records {
            self.insert_record(&mut tree, record)?;
            count += 1;
        }
        tree.classify_leaves();
        debug!("build: {} directories -> {} nodes", count, tree.len());
        Ok(tree)
    }

    fn insert_record(&self, tree: &mut DisciplineTree, record: ScanRecord) -> TreeResult<()> {
        let mut parent = None;
        let mut disk_path = tree.base_dir().to_path_buf();

        for component in record.relative.components() {
            let Component::Normal(segment) = component else {
                continue;
            };
            disk_path.push(segment);
            let segment = segment
                .to_str()
                .ok_or_else(|| DomainError::NonUtf8Name(disk_path.clone()))?;
            let (name, is_completed) = self.codec.decode(segment);
            if name.is_empty() {
                return Err(DomainError::EmptyName(disk_path));
            }

            let idx = match tree.find_child(parent, &name) {
                Some(existing) => {
                    let node = tree
                        .get_node(existing)
                        .ok_or_else(|| DomainError::Internal(format!("dangling index {:?}", existing)))?;
                    if node.original_name != segment {
                        return Err(DomainError::DuplicateSiblingName {
                            parent: parent
                                .map(|p| tree.name_path(p).to_slash_string())
                                .unwrap_or_default(),
                            name,
                            first: node.original_name.clone(),
                            second: segment.to_string(),
                        });
                    }
                    existing
                }
                None => tree.insert_node(
                    DisciplineNode::new(name, segment.to_string(), disk_path.clone(), is_completed),
                    parent,
                ),
            };
            parent = Some(idx);
        }

        if let Some(idx) = parent {
            if let Some(node) = tree.get_node_mut(idx) {
                node.files.extend(record.files);
            }
        }
        Ok(())
    }
}
