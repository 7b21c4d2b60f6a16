//! Integration tests for TrackerService: completion mutation against a real directory tree.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use distrack::application::services::TrackerService;
use distrack::application::ApplicationError;
use distrack::config::Settings;
use distrack::domain::{CompletionChange, DisciplinePath, DomainError};
use distrack::infrastructure::traits::{FileSystem, RealFileSystem};
use distrack::util::testing;

// ============================================================
// Helpers
// ============================================================

fn settings_for(temp: &TempDir) -> Settings {
    Settings {
        base_dir: temp.path().join("academia"),
        state_file: temp.path().join("discipline_state.json"),
        ..Settings::default()
    }
}

fn mkdirs(base: &Path, dirs: &[&str]) {
    for dir in dirs {
        fs::create_dir_all(base.join(dir)).unwrap();
    }
}

fn tracker(settings: Settings) -> TrackerService {
    TrackerService::new(Arc::new(RealFileSystem), Arc::new(settings)).unwrap()
}

fn leaf_status(service: &TrackerService) -> Vec<(String, bool)> {
    service
        .build_tree()
        .unwrap()
        .all_leaves()
        .map(|(path, completed)| (path.to_slash_string(), completed))
        .collect()
}

/// Real filesystem whose rename always fails.
struct RenameDenied;

impl FileSystem for RenameDenied {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        RealFileSystem.read_to_string(path)
    }
    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        RealFileSystem.write(path, content)
    }
    fn exists(&self, path: &Path) -> bool {
        RealFileSystem.exists(path)
    }
    fn is_dir(&self, path: &Path) -> bool {
        RealFileSystem.is_dir(path)
    }
    fn rename(&self, _from: &Path, _to: &Path) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }
    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        RealFileSystem.ensure_parent(path)
    }
}

// ============================================================
// set_completion
// ============================================================

#[test]
fn given_incomplete_leaf_when_marking_complete_then_directory_loses_marker() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let settings = settings_for(&temp);
    let base = settings.base_dir.clone();
    mkdirs(&base, &["A/B (未完成)"]);
    fs::write(base.join("A/B (未完成)/x.json"), "{}").unwrap();
    let service = tracker(settings);

    let mut tree = service.build_tree().unwrap();
    let change = service.set_completion(&mut tree, &["A", "B"], true).unwrap();

    assert_eq!(
        change,
        CompletionChange::Renamed {
            from: base.join("A/B (未完成)"),
            to: base.join("A/B"),
        }
    );
    assert!(base.join("A/B/x.json").is_file());
    assert!(!base.join("A/B (未完成)").exists());

    let node = tree.get(&["A", "B"]).unwrap();
    assert!(node.is_completed);
    assert_eq!(node.original_name, "B");
    assert_eq!(node.path, base.join("A/B"));

    // a fresh scan agrees with the in-memory tree
    assert_eq!(leaf_status(&service), vec![("A/B".to_string(), true)]);
}

#[test]
fn given_marker_without_space_when_completing_parent_then_descendants_are_rebased() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let settings = settings_for(&temp);
    let base = settings.base_dir.clone();
    mkdirs(&base, &["C/D(未完成)/E"]);
    let service = tracker(settings);

    let mut tree = service.build_tree().unwrap();
    assert!(!tree.get(&["C", "D"]).unwrap().is_completed);
    assert!(!tree.get(&["C", "D"]).unwrap().is_leaf);
    assert!(tree.get(&["C", "D", "E"]).unwrap().is_completed);

    service.set_completion(&mut tree, &["C", "D"], true).unwrap();

    assert!(base.join("C/D/E").is_dir());
    assert_eq!(tree.get(&["C", "D", "E"]).unwrap().path, base.join("C/D/E"));
    assert_eq!(
        service.disk_path(&tree, &["C", "D", "E"]).unwrap(),
        base.join("C/D/E")
    );
}

#[test]
fn given_complete_leaf_when_round_tripping_then_name_is_restored() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let settings = settings_for(&temp);
    let base = settings.base_dir.clone();
    mkdirs(&base, &["人文学科/哲学/道家哲学"]);
    let service = tracker(settings);
    let path = ["人文学科", "哲学", "道家哲学"];

    let mut tree = service.build_tree().unwrap();
    service.set_completion(&mut tree, &path, false).unwrap();
    assert!(base.join("人文学科/哲学/道家哲学 (未完成)").is_dir());
    assert_eq!(tree.incomplete_leaves().count(), 1);

    service.set_completion(&mut tree, &path, true).unwrap();
    assert!(base.join("人文学科/哲学/道家哲学").is_dir());
    assert!(!base.join("人文学科/哲学/道家哲学 (未完成)").exists());
    assert_eq!(tree.incomplete_leaves().count(), 0);
}

#[test]
fn given_already_complete_when_marking_complete_then_unchanged() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let settings = settings_for(&temp);
    mkdirs(&settings.base_dir, &["A/B"]);
    let service = tracker(settings);

    let mut tree = service.build_tree().unwrap();
    let change = service.set_completion(&mut tree, &["A", "B"], true).unwrap();

    assert_eq!(change, CompletionChange::Unchanged);
}

#[test]
fn given_unknown_path_when_setting_completion_then_path_not_found_and_nothing_changes() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let settings = settings_for(&temp);
    let base = settings.base_dir.clone();
    mkdirs(&base, &["A/B (未完成)"]);
    let service = tracker(settings);

    let mut tree = service.build_tree().unwrap();
    let err = service
        .set_completion(&mut tree, &["A", "Z"], true)
        .unwrap_err();

    assert!(err.is_path_not_found());
    assert!(base.join("A/B (未完成)").is_dir());
    assert!(!tree.get(&["A", "B"]).unwrap().is_completed);
}

#[test]
fn given_existing_destination_when_setting_completion_then_rename_failure_and_nothing_changes() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let settings = settings_for(&temp);
    let base = settings.base_dir.clone();
    mkdirs(&base, &["A/B (未完成)"]);
    let service = tracker(settings);

    let mut tree = service.build_tree().unwrap();
    // appears after the scan, e.g. created by another process
    fs::create_dir_all(base.join("A/B")).unwrap();

    let err = service
        .set_completion(&mut tree, &["A", "B"], true)
        .unwrap_err();

    assert!(matches!(err, ApplicationError::RenameFailure { .. }));
    assert!(base.join("A/B (未完成)").is_dir());
    let node = tree.get(&["A", "B"]).unwrap();
    assert!(!node.is_completed);
    assert_eq!(node.path, base.join("A/B (未完成)"));
}

#[test]
fn given_rename_denied_when_setting_completion_then_tree_is_untouched() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let settings = settings_for(&temp);
    let base = settings.base_dir.clone();
    mkdirs(&base, &["A/B (未完成)"]);
    let service = TrackerService::new(Arc::new(RenameDenied), Arc::new(settings)).unwrap();

    let mut tree = service.build_tree().unwrap();
    let err = service
        .set_completion(&mut tree, &["A", "B"], true)
        .unwrap_err();

    match err {
        ApplicationError::RenameFailure { from, to, source } => {
            assert_eq!(from, base.join("A/B (未完成)"));
            assert_eq!(to, base.join("A/B"));
            assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
        }
        other => panic!("expected RenameFailure, got {other:?}"),
    }
    assert!(!tree.get(&["A", "B"]).unwrap().is_completed);
}

#[test]
fn given_marker_only_name_when_building_then_empty_name_is_rejected() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let settings = settings_for(&temp);
    mkdirs(&settings.base_dir, &["A/(未完成)"]);
    let service = tracker(settings);

    let err = service.build_tree().unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::EmptyName(_))
    ));
}

// ============================================================
// reset
// ============================================================

#[test]
fn given_complete_leaves_when_resetting_then_listed_paths_become_incomplete() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let settings = settings_for(&temp);
    mkdirs(
        &settings.base_dir,
        &["人文学科/哲学/道家哲学", "人文学科/哲学/法家哲学", "人文学科/历史学"],
    );
    let service = tracker(settings);
    let paths: Vec<DisciplinePath> = ["人文学科/哲学/道家哲学", "人文学科/哲学/法家哲学"]
        .iter()
        .map(|p| p.parse().unwrap())
        .collect();

    let mut tree = service.build_tree().unwrap();
    let report = service.reset(&mut tree, &paths);

    assert!(report.is_success());
    assert_eq!(report.changed.len(), 2);
    assert_eq!(
        leaf_status(&service),
        vec![
            ("人文学科/哲学/法家哲学".to_string(), false),
            ("人文学科/哲学/道家哲学".to_string(), false),
            ("人文学科/历史学".to_string(), true),
        ]
    );
}

#[test]
fn given_unknown_path_in_batch_when_resetting_then_others_still_reset() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let settings = settings_for(&temp);
    let base = settings.base_dir.clone();
    mkdirs(&base, &["A/B", "A/C"]);
    let service = tracker(settings);
    let paths: Vec<DisciplinePath> = ["A/missing", "A/C"]
        .iter()
        .map(|p| p.parse().unwrap())
        .collect();

    let mut tree = service.build_tree().unwrap();
    let report = service.reset(&mut tree, &paths);

    assert!(!report.is_success());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0.to_slash_string(), "A/missing");
    assert!(report.failed[0].1.is_path_not_found());
    assert_eq!(report.changed.len(), 1);
    assert!(base.join("A/C (未完成)").is_dir());
}

// ============================================================
// snapshot + load_or_build
// ============================================================

#[test]
fn given_saved_snapshot_when_loading_then_tree_matches_scan() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let settings = settings_for(&temp);
    mkdirs(&settings.base_dir, &["A/B (未完成)", "A/C", "D"]);
    let service = tracker(settings.clone());

    let built = service.build_tree().unwrap();
    service.save(&built).unwrap();
    assert!(settings.state_file.is_file());

    let loaded = service.load_snapshot().unwrap().expect("snapshot exists");
    let built_leaves: Vec<_> = built.all_leaves().collect();
    let loaded_leaves: Vec<_> = loaded.all_leaves().collect();
    assert_eq!(built_leaves, loaded_leaves);
    assert_eq!(loaded.len(), built.len());
}

#[test]
fn given_no_snapshot_when_load_or_build_then_scans() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let settings = settings_for(&temp);
    mkdirs(&settings.base_dir, &["A/B"]);
    let service = tracker(settings);

    assert!(service.load_snapshot().unwrap().is_none());
    let tree = service.load_or_build().unwrap();

    assert_eq!(tree.summary().total, 1);
}

#[test]
fn given_snapshot_of_other_base_dir_when_load_or_build_then_rescans_configured_base() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let state_file = temp.path().join("discipline_state.json");
    let base_a = temp.path().join("a");
    let base_b = temp.path().join("b");
    mkdirs(&base_a, &["X (未完成)"]);
    mkdirs(&base_b, &["X (未完成)"]);

    let service_a = tracker(Settings {
        base_dir: base_a.clone(),
        state_file: state_file.clone(),
        ..Settings::default()
    });
    service_a.save(&service_a.build_tree().unwrap()).unwrap();

    let service_b = tracker(Settings {
        base_dir: base_b.clone(),
        state_file,
        ..Settings::default()
    });
    let snapshot = service_b.load_snapshot().unwrap().unwrap();
    assert!(service_b.is_stale(&snapshot));

    let mut tree = service_b.load_or_build().unwrap();
    assert_eq!(tree.get(&["X"]).unwrap().path, base_b.join("X (未完成)"));
    service_b.set_completion(&mut tree, &["X"], true).unwrap();

    assert!(base_a.join("X (未完成)").is_dir());
    assert!(!base_a.join("X").exists());
    assert!(base_b.join("X").is_dir());
    assert!(!base_b.join("X (未完成)").exists());
}

#[test]
fn given_renamed_outside_tool_when_load_or_build_then_snapshot_is_stale_and_rescanned() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let settings = settings_for(&temp);
    let base = settings.base_dir.clone();
    mkdirs(&base, &["A/B (未完成)"]);
    let service = tracker(settings);

    let tree = service.build_tree().unwrap();
    service.save(&tree).unwrap();
    fs::rename(base.join("A/B (未完成)"), base.join("A/B")).unwrap();

    let snapshot = service.load_snapshot().unwrap().unwrap();
    assert!(service.is_stale(&snapshot));

    let fresh = service.load_or_build().unwrap();
    assert!(fresh.get(&["A", "B"]).unwrap().is_completed);
}

#[test]
fn given_corrupt_snapshot_when_loading_then_snapshot_error() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let settings = settings_for(&temp);
    mkdirs(&settings.base_dir, &["A"]);
    fs::write(&settings.state_file, "not json").unwrap();
    let service = tracker(settings);

    let err = service.load_snapshot().unwrap_err();

    assert!(matches!(err, ApplicationError::Snapshot { .. }));
}

#[test]
fn given_missing_base_dir_when_building_then_scan_error() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let service = tracker(settings_for(&temp));

    let err = service.build_tree().unwrap_err();

    assert!(matches!(err, ApplicationError::Scan { .. }));
}
