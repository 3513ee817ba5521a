//! One-call dashboard snapshot. Every section is read concurrently under its
//! own time budget; a failing section is replaced by its empty default and
//! named in `degraded` instead of failing the whole response.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use hexis_contracts::{
    ConnectionHealth, DriveReport, GoalsSnapshot, HeartbeatEntry, HeartbeatState,
    MaintenanceState, MemoryStats, ResolvedAction, Vitality,
};
use hexis_store::Store;

use super::actions::recent_actions;
use super::attempt::attempt;
use super::parse_timestamp;
use crate::config::ReadModelConfig;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub status: MemoryStats,
    pub heartbeat_state: HeartbeatState,
    pub goals: GoalsSnapshot,
    pub recent_heartbeats: Vec<HeartbeatEntry>,
    pub drives: DriveReport,
    pub recent_actions: Vec<ResolvedAction>,
    pub maintenance_state: MaintenanceState,
    pub vitality: Vitality,
    pub connection_health: ConnectionHealth,
    pub derived: DerivedTimings,
    /// Sections served from their fallback, in section order.
    pub degraded: Vec<String>,
    pub generated_at: String,
}

/// Values computed from the heartbeat singleton relative to `generatedAt`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DerivedTimings {
    pub time_since_last_heartbeat_seconds: Option<i64>,
    pub energy_percent: f64,
    /// Negative when the next heartbeat is overdue.
    pub next_heartbeat_in_seconds: Option<i64>,
    pub uptime_seconds: Option<i64>,
}

impl DerivedTimings {
    pub(crate) fn compute(state: &HeartbeatState, now: DateTime<Utc>) -> Self {
        let seconds_since = |raw: &Option<String>| {
            raw.as_deref()
                .and_then(parse_timestamp)
                .map(|ts| (now - ts).num_seconds())
        };
        let energy_percent = if state.max_energy > 0.0 {
            let pct = state.current_energy / state.max_energy * 100.0;
            if pct.is_finite() {
                pct
            } else {
                0.0
            }
        } else {
            0.0
        };
        Self {
            time_since_last_heartbeat_seconds: seconds_since(&state.last_heartbeat),
            energy_percent,
            next_heartbeat_in_seconds: state
                .next_heartbeat
                .as_deref()
                .and_then(parse_timestamp)
                .map(|ts| (ts - now).num_seconds()),
            uptime_seconds: seconds_since(&state.first_heartbeat),
        }
    }
}

pub(crate) async fn compose(
    store: &Store,
    cfg: &ReadModelConfig,
    now: DateTime<Utc>,
) -> DashboardSnapshot {
    let budget = cfg.reader_timeout();
    let heartbeats_limit = cfg.heartbeats_limit.min(cfg.max_limit);
    let actions_limit = cfg.actions_limit.min(cfg.max_limit);

    let (
        status,
        heartbeat_state,
        goals,
        recent_heartbeats,
        drives,
        actions,
        maintenance_state,
        vitality,
    ) = tokio::join!(
        attempt("status", store.memory_stats_async(), MemoryStats::default(), budget),
        attempt(
            "heartbeatState",
            store.heartbeat_state_async(),
            HeartbeatState::default(),
            budget
        ),
        attempt("goals", store.goals_async(), GoalsSnapshot::default(), budget),
        attempt(
            "recentHeartbeats",
            store.recent_heartbeats_async(heartbeats_limit),
            Vec::new(),
            budget
        ),
        attempt("drives", store.drives_async(), DriveReport::default(), budget),
        attempt(
            "recentActions",
            recent_actions(store, actions_limit),
            Vec::new(),
            budget
        ),
        attempt(
            "maintenanceState",
            store.maintenance_state_async(),
            MaintenanceState::default(),
            budget
        ),
        attempt("vitality", store.vitality_async(), Vitality::default(), budget),
    );

    let degraded: Vec<String> = [
        status.degraded,
        heartbeat_state.degraded,
        goals.degraded,
        recent_heartbeats.degraded,
        drives.degraded,
        actions.degraded,
        maintenance_state.degraded,
        vitality.degraded,
    ]
    .into_iter()
    .flatten()
    .map(str::to_string)
    .collect();

    // The memory stats read doubles as the connectivity probe.
    let connection_health = ConnectionHealth::from_database(status.degraded.is_none());
    let derived = DerivedTimings::compute(&heartbeat_state.value, now);

    DashboardSnapshot {
        status: status.value,
        heartbeat_state: heartbeat_state.value,
        goals: goals.value,
        recent_heartbeats: recent_heartbeats.value,
        drives: drives.value,
        recent_actions: actions.value,
        maintenance_state: maintenance_state.value,
        vitality: vitality.value,
        connection_health,
        derived,
        degraded,
        generated_at: now.to_rfc3339(),
    }
}
