//! Error types for the metrics server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One or more host sensors could not be read. Fatal for the request.
    #[error("Sensor read failed: {0}")]
    SensorRead(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!("Error getting system information: {}", self);

        let body = Json(json!({ "error": "Failed to get system information" }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
