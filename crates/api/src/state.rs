//! Shared application state for the Axum API server.

use taskping_common::config::AppConfig;
use taskping_engine::context::ServiceContext;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub context: ServiceContext,
}

impl AppState {
    pub fn new(context: ServiceContext) -> Self {
        Self { context }
    }

    pub fn config(&self) -> &AppConfig {
        &self.context.config
    }
}
