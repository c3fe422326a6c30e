//! Health check endpoint.

use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

/// GET /api/health - Liveness only; does not touch any sensor.
pub async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
