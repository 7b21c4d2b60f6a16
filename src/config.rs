//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/distrack/distrack.toml`
//! 3. Local config: `<dir>/.distrack.toml` (usually the working directory)
//! 4. Environment variables: `DISTRACK_*` prefix
//! 5. Command line flags (applied by the CLI layer)

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::DEFAULT_MARKER;

/// Raw settings for intermediate parsing (None means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub base_dir: Option<PathBuf>,
    pub state_file: Option<PathBuf>,
    pub marker: Option<String>,
    pub follow_links: Option<bool>,
    pub file_extensions: Option<Vec<String>>,
    pub reset_paths: Option<Vec<String>>,
}

/// Unified configuration for distrack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Root of the discipline directories (default: expanded/academia)
    pub base_dir: PathBuf,
    /// JSON snapshot of the tree (default: discipline_state.json)
    pub state_file: PathBuf,
    /// Substring marking a directory as incomplete
    pub marker: String,
    /// Follow symbolic links while scanning
    pub follow_links: bool,
    /// Extensions of files recorded per directory; empty records every file
    pub file_extensions: Vec<String>,
    /// Slash-delimited paths used by `reset` when none are given
    pub reset_paths: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("expanded/academia"),
            state_file: PathBuf::from("discipline_state.json"),
            marker: DEFAULT_MARKER.to_string(),
            follow_links: false,
            file_extensions: vec![],
            reset_paths: vec![],
        }
    }
}

/// Merge arrays with union semantics and negation support.
///
/// - Items from overlay are added to base
/// - Items prefixed with `!` remove the corresponding item from the result
/// - Duplicates are de-duplicated
///
/// # Examples
/// ```ignore
/// merge_array(&["a", "b"], &["c"])       // → ["a", "b", "c"]
/// merge_array(&["a", "b"], &["!a", "c"]) // → ["b", "c"]
/// ```
pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
    let mut result: HashSet<String> = base.iter().cloned().collect();

    for pattern in overlay {
        if let Some(negated) = pattern.strip_prefix('!') {
            result.remove(negated);
        } else {
            result.insert(pattern.clone());
        }
    }

    // Convert to sorted Vec for deterministic output
    let mut vec: Vec<String> = result.into_iter().collect();
    vec.sort();
    vec
}

/// Get the XDG config directory for distrack.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "distrack").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("distrack.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".distrack.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`; unresolvable input is returned unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        self.base_dir = PathBuf::from(expand_env_vars(&self.base_dir.to_string_lossy()));
        self.state_file = PathBuf::from(expand_env_vars(&self.state_file.to_string_lossy()));
    }

    /// Apply global config onto defaults: every specified field REPLACES.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            base_dir: global.base_dir.clone().unwrap_or_else(|| self.base_dir.clone()),
            state_file: global
                .state_file
                .clone()
                .unwrap_or_else(|| self.state_file.clone()),
            marker: global.marker.clone().unwrap_or_else(|| self.marker.clone()),
            follow_links: global.follow_links.unwrap_or(self.follow_links),
            file_extensions: global
                .file_extensions
                .clone()
                .unwrap_or_else(|| self.file_extensions.clone()),
            reset_paths: global
                .reset_paths
                .clone()
                .unwrap_or_else(|| self.reset_paths.clone()),
        }
    }

    /// Merge local config onto self.
    ///
    /// - Scalars: overlay wins if Some
    /// - `file_extensions`: union merge with negation support
    /// - `reset_paths`: replaced (a reset list is a unit, not a pattern set)
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            file_extensions: overlay
                .file_extensions
                .as_ref()
                .map(|o| merge_array(&self.file_extensions, o))
                .unwrap_or_else(|| self.file_extensions.clone()),
            ..self.apply_global(&RawSettings {
                file_extensions: None,
                ..overlay.clone()
            })
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Directory searched for `.distrack.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        // 3. Local config
        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        Ok(current)
    }

    /// Apply DISTRACK_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("DISTRACK")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("file_extensions")
                .with_list_parse_key("reset_paths")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("base_dir") {
            settings.base_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("state_file") {
            settings.state_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("marker") {
            settings.marker = val;
        }
        if let Ok(val) = config.get_bool("follow_links") {
            settings.follow_links = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("file_extensions") {
            settings.file_extensions = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("reset_paths") {
            settings.reset_paths = val;
        }

        Ok(settings)
    }

    /// Override the base directory (e.g. from `--base-dir`).
    pub fn with_base_dir(mut self, base_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = base_dir {
            self.base_dir = dir;
            self.expand_paths();
        }
        self
    }

    /// Override the snapshot location (e.g. from `--state-file`).
    pub fn with_state_file(mut self, state_file: Option<PathBuf>) -> Self {
        if let Some(file) = state_file {
            self.state_file = file;
            self.expand_paths();
        }
        self
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# distrack configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/distrack/distrack.toml
#   Local:  ./.distrack.toml
#   Env:    DISTRACK_* environment variables (e.g. DISTRACK_BASE_DIR)
#
# Local file_extensions UNION with global ones; use "!ext" to remove one.

# Root directory of the discipline tree
# base_dir = "expanded/academia"

# JSON snapshot of the tree
# state_file = "discipline_state.json"

# Substring marking a directory as incomplete
# marker = "(未完成)"

# Follow symbolic links while scanning (cycles are reported as errors)
# follow_links = false

# Only record files with these extensions (empty records all files)
# file_extensions = ["json"]

# Disciplines forced back to incomplete by `distrack reset`
# reset_paths = [
#     "人文学科/哲学/道家哲学",
#     "人文学科/哲学/法家哲学",
# ]
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
