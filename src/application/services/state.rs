//! State store: whole-tree JSON snapshot on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{DisciplineTree, MarkerCodec, Snapshot};
use crate::infrastructure::traits::FileSystem;

/// Reads and writes the snapshot file, always as a whole.
pub struct StateStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl StateStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.fs.exists(&self.path)
    }

    pub fn save(&self, tree: &DisciplineTree) -> ApplicationResult<()> {
        let json = serde_json::to_string_pretty(&Snapshot::from_tree(tree)).map_err(|e| {
            ApplicationError::Snapshot {
                path: self.path.clone(),
                message: format!("serialize: {e}"),
            }
        })?;
        self.fs
            .ensure_parent(&self.path)
            .with_path_context("create snapshot directory", &self.path)?;
        self.fs
            .write(&self.path, &json)
            .with_path_context("write snapshot", &self.path)?;
        debug!("saved snapshot {} ({} nodes)", self.path.display(), tree.len());
        Ok(())
    }

    /// Load the snapshot; `None` when no snapshot has been written yet.
    pub fn load(&self, base_dir: &Path, codec: &MarkerCodec) -> ApplicationResult<Option<DisciplineTree>> {
        if !self.exists() {
            debug!("no snapshot at {}", self.path.display());
            return Ok(None);
        }
        let content = self
            .fs
            .read_to_string(&self.path)
            .with_path_context("read snapshot", &self.path)?;
        let snapshot: Snapshot =
            serde_json::from_str(&content).map_err(|e| ApplicationError::Snapshot {
                path: self.path.clone(),
                message: format!("parse: {e}"),
            })?;
        let tree = snapshot.into_tree(base_dir, codec)?;
        debug!("loaded snapshot {} ({} nodes)", self.path.display(), tree.len());
        Ok(Some(tree))
    }
}
