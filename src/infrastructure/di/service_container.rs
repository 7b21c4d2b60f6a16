//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::TrackerService;
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::infrastructure::traits::{
    FileSystem, Prompt, RealFileSystem, Selector, SkimSelector, StdinPrompt,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Fuzzy selector for `select`
    pub selector: Arc<dyn Selector>,

    /// Yes/no prompt for the interactive mode
    pub prompt: Arc<dyn Prompt>,

    pub tracker: TrackerService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> ApplicationResult<Self> {
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(SkimSelector),
            Arc::new(StdinPrompt),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        selector: Arc<dyn Selector>,
        prompt: Arc<dyn Prompt>,
    ) -> ApplicationResult<Self> {
        let settings = Arc::new(settings);
        let tracker = TrackerService::new(fs.clone(), settings.clone())?;

        Ok(Self {
            settings,
            fs,
            selector,
            prompt,
            tracker,
        })
    }
}
