//! Domain-level errors (no external dependencies)

use std::path::PathBuf;
use thiserror::Error;

/// Domain errors represent violations of the discipline tree's invariants.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("discipline not found: {0}")]
    PathNotFound(String),

    #[error("duplicate discipline '{name}' under '{parent}': '{first}' and '{second}'")]
    DuplicateSiblingName {
        parent: String,
        name: String,
        first: String,
        second: String,
    },

    #[error("directory name is not valid UTF-8: {0}")]
    NonUtf8Name(PathBuf),

    #[error("directory name is empty after removing the marker: {0}")]
    EmptyName(PathBuf),

    #[error("invalid marker '{marker}': {reason}")]
    InvalidMarker { marker: String, reason: String },

    #[error("internal tree operation failed: {0}")]
    Internal(String),
}
