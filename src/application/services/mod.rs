//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, Selector, Prompt)
//! but are themselves concrete structs, not traits.

mod scanner;
mod state;
mod tracker;

pub use scanner::Scanner;
pub use state::StateStore;
pub use tracker::{ResetReport, TrackerService};
