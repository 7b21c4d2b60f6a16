//! Domain layer: the discipline tree and its invariants
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod marker;
pub mod snapshot;

pub use arena::{DisciplineNode, DisciplineTree, LeafIterator};
pub use builder::{TreeBuilder, TreeResult};
pub use entities::*;
pub use error::DomainError;
pub use marker::{MarkerCodec, DEFAULT_MARKER};
pub use snapshot::{Snapshot, SnapshotNode};
