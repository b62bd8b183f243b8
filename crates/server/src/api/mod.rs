//! HTTP endpoint handlers.
//!
//! Request types and the error mapping shared by the handlers live here.

mod grouping;
mod health;

use axum::http::StatusCode;
use serde::Deserialize;

use tabgroup_core::{Settings, Tab, TabGroupError};

pub use grouping::group_tabs;
pub use health::{health, stats};

/// Body of `POST /group-tabs` and of the `group` subcommand's input file.
#[derive(Debug, Deserialize)]
pub struct GroupTabsRequest {
    pub tabs: Vec<Tab>,
    #[serde(default)]
    pub settings: Settings,
}

pub type ApiError = (StatusCode, String);

pub(crate) fn not_configured() -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        "No embedding provider is configured".to_string(),
    )
}

pub(crate) fn pipeline_error(err: TabGroupError) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
