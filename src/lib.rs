//! Completion tracking for a discipline taxonomy kept as nested directories.
//!
//! A directory whose name carries the incompleteness marker (by default
//! `(未完成)`) is an unfinished topic; leaf directories are the units of work.
//! The filesystem is the source of truth, the in-memory tree and its JSON
//! snapshot are caches of it.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
