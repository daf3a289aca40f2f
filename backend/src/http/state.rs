//! Application state for the HTTP server.

use std::sync::Arc;

use crate::services::ExplorerSession;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The explorer session every request operates on
    pub session: Arc<ExplorerSession>,
}

impl AppState {
    pub fn new(session: Arc<ExplorerSession>) -> Self {
        Self { session }
    }
}
