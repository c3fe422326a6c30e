//! Metrics HTTP API.

pub mod health;
pub mod system_info;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the API router, mounted under `/api`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health))
        .route("/system-info", get(system_info::system_info))
}
