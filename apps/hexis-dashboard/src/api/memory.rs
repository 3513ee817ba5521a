//! Memory browsing, identity, the concept graph and the outbox.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use hexis_contracts::{
    EpisodicMemory, Identity, KnowledgeGraph, MemoryDynamics, OutboxMessage, SemanticMemory,
};

use super::LimitQuery;
use crate::responses::{ApiError, StoreResultExt};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/memories/episodic",
    tag = "Memory",
    params(LimitQuery),
    responses(
        (status = 200, description = "Recent episodic memories", body = [EpisodicMemory]),
        (status = 500, description = "Store unavailable", body = crate::openapi::ProblemBody)
    )
)]
pub async fn episodic(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> Result<Json<Vec<EpisodicMemory>>, ApiError> {
    let cfg = state.read_models();
    let limit = cfg.limit(q.raw(), cfg.episodic_limit);
    let rows = state
        .store()
        .recent_episodic_async(limit)
        .await
        .or_api("Failed to fetch episodic memories")?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/memories/semantic",
    tag = "Memory",
    params(LimitQuery),
    responses(
        (status = 200, description = "Semantic memories by importance", body = [SemanticMemory]),
        (status = 500, description = "Store unavailable", body = crate::openapi::ProblemBody)
    )
)]
pub async fn semantic(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> Result<Json<Vec<SemanticMemory>>, ApiError> {
    let cfg = state.read_models();
    let limit = cfg.limit(q.raw(), cfg.semantic_limit);
    let rows = state
        .store()
        .semantic_memories_async(limit)
        .await
        .or_api("Failed to fetch semantic memories")?;
    Ok(Json(rows))
}

/// Thirty-day creation timeline, cluster growth and importance buckets.
#[utoipa::path(
    get,
    path = "/memory-dynamics",
    tag = "Memory",
    responses(
        (status = 200, description = "Memory dynamics", body = MemoryDynamics),
        (status = 500, description = "Store unavailable", body = crate::openapi::ProblemBody)
    )
)]
pub async fn memory_dynamics(
    State(state): State<AppState>,
) -> Result<Json<MemoryDynamics>, ApiError> {
    let dynamics = state
        .store()
        .memory_dynamics_async()
        .await
        .or_api("Failed to fetch memory dynamics")?;
    Ok(Json(dynamics))
}

#[utoipa::path(
    get,
    path = "/identity",
    tag = "Memory",
    responses(
        (status = 200, description = "Identity aspects and worldview", body = Identity),
        (status = 500, description = "Store unavailable", body = crate::openapi::ProblemBody)
    )
)]
pub async fn identity(State(state): State<AppState>) -> Result<Json<Identity>, ApiError> {
    let identity = state
        .store()
        .identity_async()
        .await
        .or_api("Failed to fetch identity data")?;
    Ok(Json(identity))
}

#[utoipa::path(
    get,
    path = "/knowledge-graph",
    tag = "Memory",
    params(LimitQuery),
    responses(
        (status = 200, description = "Concept nodes and parent edges", body = KnowledgeGraph),
        (status = 500, description = "Store unavailable", body = crate::openapi::ProblemBody)
    )
)]
pub async fn knowledge_graph(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> Result<Json<KnowledgeGraph>, ApiError> {
    let cfg = state.read_models();
    let limit = cfg.limit(q.raw(), cfg.graph_limit);
    let concepts = state
        .store()
        .concepts_async(limit)
        .await
        .or_api("Failed to fetch knowledge graph")?;
    Ok(Json(KnowledgeGraph::from_concepts(&concepts)))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OutboxResponse {
    pub success: bool,
    pub messages: Vec<OutboxMessage>,
}

#[utoipa::path(
    get,
    path = "/outbox",
    tag = "Memory",
    params(LimitQuery),
    responses(
        (status = 200, description = "Messages addressed to the user, newest first", body = OutboxResponse),
        (status = 500, description = "Store unavailable", body = crate::openapi::ProblemBody)
    )
)]
pub async fn outbox(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> Result<Json<OutboxResponse>, ApiError> {
    let cfg = state.read_models();
    let limit = cfg.limit(q.raw(), cfg.outbox_limit);
    let messages = state
        .store()
        .outbox_async(limit)
        .await
        .or_api("Failed to fetch outbox messages")?;
    Ok(Json(OutboxResponse {
        success: true,
        messages,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnseenCount {
    pub unseen_count: i64,
}

#[utoipa::path(
    get,
    path = "/outbox/unseen",
    tag = "Memory",
    responses(
        (status = 200, description = "Sent messages the user has not seen", body = UnseenCount),
        (status = 500, description = "Store unavailable", body = crate::openapi::ProblemBody)
    )
)]
pub async fn outbox_unseen(State(state): State<AppState>) -> Result<Json<UnseenCount>, ApiError> {
    let unseen_count = state
        .store()
        .unseen_outbox_count_async()
        .await
        .or_api("Failed to fetch unseen count")?;
    Ok(Json(UnseenCount { unseen_count }))
}
