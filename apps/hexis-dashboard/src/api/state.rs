//! Agent state endpoints: singletons, drives, goals and the log windows.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use hexis_contracts::{
    ConnectionHealth, DriveReport, GoalsSnapshot, HeartbeatEntry, HeartbeatState,
    LastHeartbeatEnergy, MaintenanceRun, MaintenanceState, MemoryStats, ResolvedAction, Vitality,
};

use super::LimitQuery;
use crate::read_models::actions::recent_actions as read_recent_actions;
use crate::responses::{ApiError, StoreResultExt};
use crate::AppState;

/// Memory counts and averages over active memories.
#[utoipa::path(
    get,
    path = "/status",
    tag = "State",
    responses(
        (status = 200, description = "Memory statistics", body = MemoryStats),
        (status = 500, description = "Store unavailable", body = crate::openapi::ProblemBody)
    )
)]
pub async fn status(State(state): State<AppState>) -> Result<Json<MemoryStats>, ApiError> {
    let stats = state
        .store()
        .memory_stats_async()
        .await
        .or_api("Failed to fetch agent status")?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/heartbeat-state",
    tag = "State",
    responses(
        (status = 200, description = "Heartbeat singleton with affect and unread count", body = HeartbeatState),
        (status = 500, description = "Store unavailable", body = crate::openapi::ProblemBody)
    )
)]
pub async fn heartbeat_state(
    State(state): State<AppState>,
) -> Result<Json<HeartbeatState>, ApiError> {
    let hb = state
        .store()
        .heartbeat_state_async()
        .await
        .or_api("Failed to fetch heartbeat state")?;
    Ok(Json(hb))
}

/// Energy breakdown of the most recent heartbeat.
#[utoipa::path(
    get,
    path = "/last-heartbeat-energy",
    tag = "State",
    responses(
        (status = 200, description = "Energy start/end, per-action costs, recharge", body = LastHeartbeatEnergy),
        (status = 500, description = "Store unavailable", body = crate::openapi::ProblemBody)
    )
)]
pub async fn last_heartbeat_energy(
    State(state): State<AppState>,
) -> Result<Json<LastHeartbeatEnergy>, ApiError> {
    let energy = state
        .store()
        .last_heartbeat_energy_async()
        .await
        .or_api("Failed to fetch heartbeat energy")?;
    Ok(Json(energy))
}

#[utoipa::path(
    get,
    path = "/drives",
    tag = "State",
    responses(
        (status = 200, description = "Drives with urgency", body = DriveReport),
        (status = 500, description = "Store unavailable", body = crate::openapi::ProblemBody)
    )
)]
pub async fn drives(State(state): State<AppState>) -> Result<Json<DriveReport>, ApiError> {
    let report = state
        .store()
        .drives_async()
        .await
        .or_api("Failed to fetch drives")?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/goals",
    tag = "State",
    responses(
        (status = 200, description = "Goal snapshot", body = GoalsSnapshot),
        (status = 500, description = "Store unavailable", body = crate::openapi::ProblemBody)
    )
)]
pub async fn goals(State(state): State<AppState>) -> Result<Json<GoalsSnapshot>, ApiError> {
    let snap = state
        .store()
        .goals_async()
        .await
        .or_api("Failed to fetch goals")?;
    Ok(Json(snap))
}

/// Flattened actions from the latest heartbeats, newest first.
#[utoipa::path(
    get,
    path = "/recent-actions",
    tag = "State",
    params(LimitQuery),
    responses(
        (status = 200, description = "Costed and enriched actions", body = [ResolvedAction]),
        (status = 500, description = "Store unavailable", body = crate::openapi::ProblemBody)
    )
)]
pub async fn recent_actions(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> Result<Json<Vec<ResolvedAction>>, ApiError> {
    let cfg = state.read_models();
    let limit = cfg.limit(q.raw(), cfg.actions_limit);
    let actions = read_recent_actions(state.store(), limit)
        .await
        .or_api("Failed to fetch recent actions")?;
    Ok(Json(actions))
}

#[utoipa::path(
    get,
    path = "/recent-heartbeats",
    tag = "State",
    params(LimitQuery),
    responses(
        (status = 200, description = "Heartbeat window", body = [HeartbeatEntry]),
        (status = 500, description = "Store unavailable", body = crate::openapi::ProblemBody)
    )
)]
pub async fn recent_heartbeats(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> Result<Json<Vec<HeartbeatEntry>>, ApiError> {
    let cfg = state.read_models();
    let limit = cfg.limit(q.raw(), cfg.heartbeats_limit);
    let rows = state
        .store()
        .recent_heartbeats_async(limit)
        .await
        .or_api("Failed to fetch recent heartbeats")?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/maintenance-state",
    tag = "State",
    responses(
        (status = 200, description = "Maintenance singleton with tier counts", body = MaintenanceState),
        (status = 500, description = "Store unavailable", body = crate::openapi::ProblemBody)
    )
)]
pub async fn maintenance_state(
    State(state): State<AppState>,
) -> Result<Json<MaintenanceState>, ApiError> {
    let m = state
        .store()
        .maintenance_state_async()
        .await
        .or_api("Failed to fetch maintenance state")?;
    Ok(Json(m))
}

#[utoipa::path(
    get,
    path = "/maintenance-log",
    tag = "State",
    params(LimitQuery),
    responses(
        (status = 200, description = "Maintenance window", body = [MaintenanceRun]),
        (status = 500, description = "Store unavailable", body = crate::openapi::ProblemBody)
    )
)]
pub async fn maintenance_log(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> Result<Json<Vec<MaintenanceRun>>, ApiError> {
    let cfg = state.read_models();
    let limit = cfg.limit(q.raw(), cfg.maintenance_log_limit);
    let rows = state
        .store()
        .maintenance_log_async(limit)
        .await
        .or_api("Failed to fetch maintenance log")?;
    Ok(Json(rows))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VitalityResponse {
    #[serde(flatten)]
    pub vitality: Vitality,
    pub connection_health: ConnectionHealth,
}

#[utoipa::path(
    get,
    path = "/vitality",
    tag = "State",
    responses(
        (status = 200, description = "Vitality metrics and connection health", body = VitalityResponse),
        (status = 500, description = "Store unavailable", body = crate::openapi::ProblemBody)
    )
)]
pub async fn vitality(State(state): State<AppState>) -> Result<Json<VitalityResponse>, ApiError> {
    let store = state.store();
    let (vitality, ping) = tokio::join!(store.vitality_async(), store.ping_async());
    let vitality = vitality.or_api("Failed to fetch vitality metrics")?;
    Ok(Json(VitalityResponse {
        vitality,
        connection_health: ConnectionHealth::from_database(ping.is_ok()),
    }))
}
