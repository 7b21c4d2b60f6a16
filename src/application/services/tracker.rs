//! Discipline tracking service
//!
//! Builds the tree from the base directory, answers queries and flips completion
//! by renaming directories. The filesystem is the source of truth; every tree
//! handed out is a cache that a fresh [`TrackerService::build_tree`] replaces.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::services::{Scanner, StateStore};
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{
    CompletionChange, DisciplinePath, DisciplineTree, DomainError, MarkerCodec, TreeBuilder,
};
use crate::infrastructure::traits::FileSystem;

/// Outcome of resetting a batch of disciplines to incomplete.
#[derive(Debug, Default)]
pub struct ResetReport {
    pub changed: Vec<(DisciplinePath, CompletionChange)>,
    pub failed: Vec<(DisciplinePath, ApplicationError)>,
}

impl ResetReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Service owning the scan → build → query/mutate pipeline.
pub struct TrackerService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
    builder: TreeBuilder,
    store: StateStore,
}

impl TrackerService {
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> ApplicationResult<Self> {
        let codec = MarkerCodec::new(&settings.marker)?;
        let store = StateStore::new(fs.clone(), settings.state_file.clone());
        Ok(Self {
            fs,
            settings,
            builder: TreeBuilder::new(codec),
            store,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.settings.base_dir
    }

    pub fn codec(&self) -> &MarkerCodec {
        self.builder.codec()
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Scan the base directory and build a fresh tree.
    #[instrument(level = "debug", skip(self))]
    pub fn build_tree(&self) -> ApplicationResult<DisciplineTree> {
        let records = Scanner::new(&self.settings.base_dir)
            .follow_links(self.settings.follow_links)
            .file_extensions(&self.settings.file_extensions)
            .scan()?;
        let tree = self.builder.build(&self.settings.base_dir, records)?;
        info!(
            "built tree from {}: {} disciplines",
            self.settings.base_dir.display(),
            tree.len()
        );
        Ok(tree)
    }

    pub fn save(&self, tree: &DisciplineTree) -> ApplicationResult<()> {
        self.store.save(tree)
    }

    pub fn load_snapshot(&self) -> ApplicationResult<Option<DisciplineTree>> {
        self.store.load(&self.settings.base_dir, self.codec())
    }

    /// True when the snapshot was taken under another base directory or
    /// any cached directory no longer exists on disk.
    pub fn is_stale(&self, tree: &DisciplineTree) -> bool {
        let base_dir = &self.settings.base_dir;
        tree.iter().any(|(_, node)| {
            if !node.path.starts_with(base_dir) {
                debug!("stale: {} is outside {}", node.path.display(), base_dir.display());
                return true;
            }
            !self.fs.is_dir(&node.path)
        })
    }

    /// Use the snapshot when it still matches the disk, else rescan.
    #[instrument(level = "debug", skip(self))]
    pub fn load_or_build(&self) -> ApplicationResult<DisciplineTree> {
        match self.load_snapshot()? {
            Some(tree) if !self.is_stale(&tree) => Ok(tree),
            Some(_) => {
                warn!(
                    "snapshot {} is out of date, rescanning {}",
                    self.store.path().display(),
                    self.settings.base_dir.display()
                );
                self.build_tree()
            }
            None => self.build_tree(),
        }
    }

    /// On-disk directory currently backing `path`.
    pub fn disk_path<S: AsRef<str>>(
        &self,
        tree: &DisciplineTree,
        path: &[S],
    ) -> ApplicationResult<PathBuf> {
        Ok(tree.get(path)?.path.clone())
    }

    /// Set the completion state of one discipline, renaming its directory.
    ///
    /// Either the rename succeeds and the node (and its descendants' paths)
    /// reflect the new name, or nothing changes in memory or on disk.
    #[instrument(level = "debug", skip(self, tree, path))]
    pub fn set_completion<S: AsRef<str>>(
        &self,
        tree: &mut DisciplineTree,
        path: &[S],
        completed: bool,
    ) -> ApplicationResult<CompletionChange> {
        let idx = tree.resolve(path)?;
        let node = tree
            .get_node(idx)
            .ok_or_else(|| DomainError::Internal(format!("dangling index {:?}", idx)))?;

        let target = self.codec().encode(&node.original_name, completed);
        if target == node.original_name {
            debug!("set_completion: {} already in requested state", node.path.display());
            return Ok(CompletionChange::Unchanged);
        }
        if target.is_empty() {
            return Err(DomainError::EmptyName(node.path.clone()).into());
        }

        let from = node.path.clone();
        let to = match from.parent() {
            Some(parent) => parent.join(&target),
            None => {
                return Err(DomainError::Internal(format!(
                    "no parent directory for {}",
                    from.display()
                ))
                .into())
            }
        };

        if self.fs.exists(&to) {
            return Err(ApplicationError::RenameFailure {
                from,
                to,
                source: io::Error::new(io::ErrorKind::AlreadyExists, "destination already exists"),
            });
        }
        self.fs
            .rename(&from, &to)
            .map_err(|source| ApplicationError::RenameFailure {
                from: from.clone(),
                to: to.clone(),
                source,
            })?;

        if let Err(e) = tree.apply_rename(idx, target, to.clone(), completed) {
            // keep disk and tree in agreement
            if let Err(undo) = self.fs.rename(&to, &from) {
                warn!("could not undo rename {} -> {}: {}", to.display(), from.display(), undo);
            }
            return Err(e.into());
        }

        info!("renamed {} -> {}", from.display(), to.display());
        Ok(CompletionChange::Renamed { from, to })
    }

    /// Force every listed discipline back to incomplete.
    ///
    /// Every path is attempted; failures are collected, not fatal.
    pub fn reset(&self, tree: &mut DisciplineTree, paths: &[DisciplinePath]) -> ResetReport {
        let mut report = ResetReport::default();
        for path in paths {
            match self.set_completion(tree, path.segments(), false) {
                Ok(change) => report.changed.push((path.clone(), change)),
                Err(e) => {
                    warn!("reset {}: {}", path, e);
                    report.failed.push((path.clone(), e));
                }
            }
        }
        report
    }
}
