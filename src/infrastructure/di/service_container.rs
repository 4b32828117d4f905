//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{AuthoringService, EvaluationService};
use crate::config::Settings;
use crate::infrastructure::traits::{
    DocumentStore, FileDocumentStore, FileSystem, RealFileSystem, Selector, SkimSelector,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Document store all services share
    pub store: Arc<dyn DocumentStore>,

    /// Interactive selector for the wizard
    pub selector: Arc<dyn Selector>,

    pub authoring: AuthoringService,
    pub evaluation: EvaluationService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let store = Arc::new(FileDocumentStore::new(fs, settings.store_dir.clone()));
        let selector = Arc::new(SkimSelector::new(settings.wizard.height.clone()));
        Self::with_deps(settings, store, selector)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        store: Arc<dyn DocumentStore>,
        selector: Arc<dyn Selector>,
    ) -> Self {
        let settings = Arc::new(settings);
        let authoring = AuthoringService::new(Arc::clone(&store));
        let evaluation = EvaluationService::new(Arc::clone(&store));

        Self {
            settings,
            store,
            selector,
            authoring,
            evaluation,
        }
    }
}
