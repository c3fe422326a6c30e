//! Metrics server - reports host CPU, memory and GPU utilization to the console.

pub mod api;
pub mod collector;
pub mod config;
pub mod error;
pub mod logging;
pub mod state;

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use collector::{HostSensors, MetricsCollector, SensorSource};
pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;

/// Build the full application router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api::router())
        .layer(middleware::from_fn(logging::request_logger))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
