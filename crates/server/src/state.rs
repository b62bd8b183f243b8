use chrono::{DateTime, Utc};
use tabgroup_compute::TabGrouper;
use tabgroup_core::Config;

/// Shared, read-only server state.
pub struct AppState {
    /// `None` when the configured embedding provider could not be built.
    pub grouper: Option<TabGrouper>,
    pub config: Config,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(grouper: Option<TabGrouper>, config: Config) -> Self {
        Self {
            grouper,
            config,
            started_at: Utc::now(),
        }
    }
}
