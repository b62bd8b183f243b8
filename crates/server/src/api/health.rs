use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use tabgroup_compute::PipelineMetrics;

use crate::state::AppState;

use super::{not_configured, ApiError};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Embedder name, `None` when grouping is disabled.
    pub embedder: Option<String>,
    pub profile: String,
    pub uptime_secs: i64,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if state.grouper.is_some() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        embedder: state.grouper.as_ref().map(|g| g.embedder_name().to_string()),
        profile: state.config.profile_label().to_string(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<PipelineMetrics>, ApiError> {
    let grouper = state.grouper.as_ref().ok_or_else(not_configured)?;
    Ok(Json(grouper.metrics()))
}
