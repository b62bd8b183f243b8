use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use tracing::warn;

use tabgroup_core::ClusterResult;

use crate::state::AppState;

use super::{not_configured, pipeline_error, ApiError, GroupTabsRequest};

pub async fn group_tabs(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GroupTabsRequest>,
) -> Result<Json<ClusterResult>, ApiError> {
    let grouper = state.grouper.as_ref().ok_or_else(not_configured)?;
    let result = grouper
        .group_tabs(&req.tabs, &req.settings)
        .await
        .map_err(|e| {
            warn!(tabs = req.tabs.len(), "grouping failed: {}", e);
            pipeline_error(e)
        })?;
    Ok(Json(result))
}
