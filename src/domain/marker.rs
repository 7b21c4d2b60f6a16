//! Marker codec: the only place that inspects raw directory names.
//!
//! A directory whose name contains the marker substring is incomplete. The marker
//! may be surrounded by whitespace, e.g. `哲学 (未完成)`.

use regex::Regex;

use crate::domain::error::DomainError;

/// Marker used when none is configured.
pub const DEFAULT_MARKER: &str = "(未完成)";

/// Detects, strips and adds the incompleteness marker.
#[derive(Debug, Clone)]
pub struct MarkerCodec {
    marker: String,
    pattern: Regex,
}

impl Default for MarkerCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER).expect("default marker is valid")
    }
}

impl MarkerCodec {
    pub fn new(marker: &str) -> Result<Self, DomainError> {
        if marker.trim().is_empty() {
            return Err(DomainError::InvalidMarker {
                marker: marker.to_string(),
                reason: "marker must contain non-whitespace text".to_string(),
            });
        }
        if marker.contains('/') || marker.contains('\\') {
            return Err(DomainError::InvalidMarker {
                marker: marker.to_string(),
                reason: "marker must not contain path separators".to_string(),
            });
        }
        let pattern = Regex::new(&format!(r"\s*{}\s*", regex::escape(marker))).map_err(|e| {
            DomainError::InvalidMarker {
                marker: marker.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            marker: marker.to_string(),
            pattern,
        })
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn is_marked(&self, name: &str) -> bool {
        name.contains(&self.marker)
    }

    /// Remove every marker occurrence and the whitespace around it.
    ///
    /// A marker in the middle of a name collapses to a single space:
    /// `道家 (未完成) 哲学` becomes `道家 哲学`, not `道家  哲学` (plain substring
    /// removal) and not `道家哲学` (words fused).
    pub fn strip(&self, name: &str) -> String {
        if !self.is_marked(name) {
            return name.to_string();
        }
        self.pattern.replace_all(name, " ").trim().to_string()
    }

    /// Append the marker separated by a space; marked names are returned unchanged.
    pub fn mark(&self, name: &str) -> String {
        if self.is_marked(name) {
            name.to_string()
        } else {
            format!("{} {}", name, self.marker)
        }
    }

    /// Split an on-disk name into its cleaned name and completion state.
    pub fn decode(&self, name: &str) -> (String, bool) {
        if self.is_marked(name) {
            (self.strip(name), false)
        } else {
            (name.to_string(), true)
        }
    }

    /// On-disk name for `name` in the requested completion state.
    pub fn encode(&self, name: &str, completed: bool) -> String {
        if completed {
            self.strip(name)
        } else {
            self.mark(name)
        }
    }
}
