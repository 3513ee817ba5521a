use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceState {
    pub last_maintenance_at: Option<String>,
    pub is_paused: bool,
    pub interval_seconds: i64,
    pub working_memory_count: i64,
    pub long_term_count: i64,
    pub semantic_count: i64,
    pub neighborhoods_recomputed: i64,
    pub cache_deleted: i64,
    pub wm_deleted: i64,
    pub wm_promoted: i64,
    pub pending_calls: i64,
}

impl MaintenanceState {
    pub const DEFAULT_INTERVAL_SECONDS: i64 = 60;
}

impl Default for MaintenanceState {
    fn default() -> Self {
        Self {
            last_maintenance_at: None,
            is_paused: false,
            interval_seconds: Self::DEFAULT_INTERVAL_SECONDS,
            working_memory_count: 0,
            long_term_count: 0,
            semantic_count: 0,
            neighborhoods_recomputed: 0,
            cache_deleted: 0,
            wm_deleted: 0,
            wm_promoted: 0,
            pending_calls: 0,
        }
    }
}

/// One row of the maintenance window.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct MaintenanceRun {
    pub id: i64,
    pub ran_at: Option<String>,
    pub neighborhoods_recomputed: i64,
    pub embedding_cache_deleted: i64,
    pub working_memory_deleted: i64,
    pub working_memory_promoted: i64,
}
