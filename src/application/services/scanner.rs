//! Path scanner: walks the base directory and reports every directory below it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, trace};
use walkdir::WalkDir;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::ScanRecord;

/// Read-only recursive directory walker.
///
/// The root itself is not reported. Symbolic links are skipped unless
/// `follow_links` is set, in which case a link cycle aborts the scan.
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
    follow_links: bool,
    file_extensions: Vec<String>,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_links: false,
            file_extensions: Vec::new(),
        }
    }

    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Record only files with these extensions (leading dots ignored, case-insensitive).
    pub fn file_extensions(mut self, extensions: &[String]) -> Self {
        self.file_extensions = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// Directories in filename order, each with the files directly inside it.
    #[instrument(level = "debug", skip(self), fields(root = %self.root.display()))]
    pub fn scan(&self) -> ApplicationResult<Vec<ScanRecord>> {
        if !self.root.is_dir() {
            return Err(ApplicationError::Scan {
                path: self.root.clone(),
                reason: "base directory does not exist or is not a directory".to_string(),
            });
        }

        let mut records: Vec<ScanRecord> = Vec::new();
        let mut by_dir: HashMap<PathBuf, usize> = HashMap::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .min_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.root).to_path_buf();
                let reason = match e.loop_ancestor() {
                    Some(ancestor) => format!("symbolic link loop back to {}", ancestor.display()),
                    None => e.to_string(),
                };
                ApplicationError::Scan { path, reason }
            })?;

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                trace!("scan: skipping symlink {}", entry.path().display());
                continue;
            }

            let relative = self.relative(entry.path())?;
            if file_type.is_dir() {
                by_dir.insert(relative.clone(), records.len());
                records.push(ScanRecord {
                    relative,
                    files: Vec::new(),
                });
            } else if file_type.is_file() && self.wants_file(entry.path()) {
                let Some(parent) = relative.parent() else {
                    continue;
                };
                // Files directly under the root belong to no discipline
                if let Some(&slot) = by_dir.get(parent) {
                    records[slot]
                        .files
                        .push(entry.file_name().to_string_lossy().into_owned());
                }
            }
        }

        debug!("scan: {} directories", records.len());
        Ok(records)
    }

    fn relative(&self, path: &Path) -> ApplicationResult<PathBuf> {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .map_err(|e| ApplicationError::Scan {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    fn wants_file(&self, path: &Path) -> bool {
        if self.file_extensions.is_empty() {
            return true;
        }
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .map(|ext| self.file_extensions.contains(&ext))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn given_nested_dirs_when_scanning_then_reports_relative_dirs_with_direct_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("A/B")).unwrap();
        fs::write(temp.path().join("A/B/x.json"), "{}").unwrap();
        fs::write(temp.path().join("A/readme.md"), "").unwrap();
        fs::write(temp.path().join("root.txt"), "").unwrap();

        let records = Scanner::new(temp.path()).scan().unwrap();

        assert_eq!(
            records,
            vec![
                ScanRecord {
                    relative: PathBuf::from("A"),
                    files: vec!["readme.md".to_string()],
                },
                ScanRecord {
                    relative: PathBuf::from("A/B"),
                    files: vec!["x.json".to_string()],
                },
            ]
        );
    }

    #[test]
    fn given_extension_filter_when_scanning_then_records_matching_files_only() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("A")).unwrap();
        fs::write(temp.path().join("A/x.JSON"), "{}").unwrap();
        fs::write(temp.path().join("A/notes.md"), "").unwrap();

        let records = Scanner::new(temp.path())
            .file_extensions(&[".json".to_string()])
            .scan()
            .unwrap();

        assert_eq!(records[0].files, vec!["x.JSON".to_string()]);
    }

    #[test]
    fn given_missing_root_when_scanning_then_errors() {
        let temp = TempDir::new().unwrap();
        let result = Scanner::new(temp.path().join("nope")).scan();
        assert!(matches!(result, Err(ApplicationError::Scan { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn given_unreadable_subdirectory_when_scanning_then_errors_naming_it() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("A/locked");
        fs::create_dir_all(locked.join("inner")).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // root ignores permission bits
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = Scanner::new(temp.path()).scan();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        match result {
            Err(ApplicationError::Scan { path, .. }) => assert_eq!(path, locked),
            other => panic!("expected scan error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn given_symlink_loop_when_not_following_then_link_is_skipped() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("A")).unwrap();
        std::os::unix::fs::symlink(temp.path(), temp.path().join("A/loop")).unwrap();

        let records = Scanner::new(temp.path()).scan().unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].relative, PathBuf::from("A"));
    }

    #[cfg(unix)]
    #[test]
    fn given_symlink_loop_when_following_then_scan_errors() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("A")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("A"), temp.path().join("A/loop")).unwrap();

        let result = Scanner::new(temp.path()).follow_links(true).scan();

        match result {
            Err(ApplicationError::Scan { reason, .. }) => assert!(reason.contains("loop")),
            other => panic!("expected scan error, got {:?}", other),
        }
    }
}
