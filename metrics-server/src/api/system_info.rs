//! System information endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use console_common::SystemSnapshot;

use crate::error::Result;
use crate::state::AppState;

/// GET /api/system-info - Current CPU, memory and GPU snapshot.
pub async fn system_info(State(state): State<Arc<AppState>>) -> Result<Json<SystemSnapshot>> {
    let snapshot = state.collector.snapshot().await?;

    tracing::debug!(
        cpu = snapshot.cpu.usage_percent,
        gpus = snapshot.gpus.len(),
        "Collected system snapshot"
    );

    Ok(Json(snapshot))
}
