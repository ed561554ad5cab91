pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::search::SearchService;
use std::sync::Arc;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Handle for swapping the process log filter at runtime
pub type LogReloadHandle = reload::Handle<EnvFilter, Registry>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SearchService>,
    pub reload: Option<LogReloadHandle>,
}

impl AppState {
    pub fn new(service: Arc<SearchService>) -> Self {
        Self {
            service,
            reload: None,
        }
    }

    /// Attach the log-level reload handle
    pub fn with_reload(mut self, reload: LogReloadHandle) -> Self {
        self.reload = Some(reload);
        self
    }
}
