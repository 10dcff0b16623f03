use std::sync::Arc;
use tokio::sync::Mutex;

use super::panel::Tab;
use crate::media::ArtifactStore;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The tab; one request at a time drives its widgets
    pub tab: Arc<Mutex<Tab>>,
    /// Served without locking the tab
    pub artifacts: ArtifactStore,
}

impl AppState {
    pub fn new(tab: Tab) -> Self {
        let artifacts = tab.artifacts().clone();
        Self {
            tab: Arc::new(Mutex::new(tab)),
            artifacts,
        }
    }
}
