//! Shared application state.

use crate::collector::MetricsCollector;

/// Shared application state passed to all handlers.
pub struct AppState {
    pub collector: MetricsCollector,
}

impl AppState {
    pub fn new(collector: MetricsCollector) -> Self {
        Self { collector }
    }
}
