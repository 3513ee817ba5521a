use utoipa::{OpenApi, ToSchema};

use hexis_contracts::{
    ActionCost, ActiveGoal, AffectiveState, Concept, ConnectionHealth, ConnectionState, DailyCount,
    Drive, DriveReport, EpisodicMemory, GoalCounts, GoalIssue, GoalsSnapshot, GraphEdge,
    GraphNode, HeartbeatEntry, HeartbeatState, Identity, IdentityAspect, ImportanceDistribution,
    InboxMessageRequest, KnowledgeGraph, LastHeartbeatEnergy, MaintenanceRun, MaintenanceState,
    MemoryDynamics, MemoryStats, OutboxMessage, QueuedGoal, ResolvedAction, SemanticMemory,
    TableCounts, Tone, Trend, Vitality, WorldviewPrimitive,
};

use crate::api::{inbox::InboxAccepted, memory::OutboxResponse, memory::UnseenCount};
use crate::api::state::VitalityResponse;
use crate::read_models::composer::{DashboardSnapshot, DerivedTimings};

#[allow(dead_code)]
#[derive(ToSchema)]
pub struct ProblemBody {
    pub error: String,
    #[schema(nullable, value_type = Option<String>)]
    pub details: Option<String>,
}

#[allow(dead_code)]
#[derive(ToSchema)]
pub struct HealthDatabase {
    pub connected: bool,
    #[schema(nullable, value_type = Option<TableCounts>)]
    pub tables: Option<TableCounts>,
    #[schema(nullable, value_type = Option<String>)]
    pub error: Option<String>,
}

#[allow(dead_code)]
#[derive(ToSchema)]
pub struct HealthReport {
    #[schema(example = "healthy")]
    pub status: String,
    pub database: HealthDatabase,
    pub timestamp: String,
}

#[allow(dead_code)]
#[derive(ToSchema)]
pub struct HttpInfo {
    pub bind: String,
    pub port: u16,
}

#[allow(dead_code)]
#[derive(ToSchema)]
pub struct AboutCounts {
    pub total: usize,
}

#[allow(dead_code)]
#[derive(ToSchema)]
pub struct AboutResponse {
    pub service: String,
    pub version: String,
    pub http: HttpInfo,
    pub store: String,
    pub counts: AboutCounts,
    #[schema(example = json!(["GET /health", "GET /about"]))]
    pub endpoints: Vec<String>,
    #[schema(value_type = Vec<serde_json::Value>)]
    pub endpoints_meta: Vec<serde_json::Value>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::meta::health,
        crate::api::meta::about,
        crate::api::meta::openapi_json,
        crate::api::state::status,
        crate::api::state::heartbeat_state,
        crate::api::state::last_heartbeat_energy,
        crate::api::state::drives,
        crate::api::state::goals,
        crate::api::state::recent_actions,
        crate::api::state::recent_heartbeats,
        crate::api::state::maintenance_state,
        crate::api::state::maintenance_log,
        crate::api::state::vitality,
        crate::api::dashboard::dashboard,
        crate::api::memory::episodic,
        crate::api::memory::semantic,
        crate::api::memory::memory_dynamics,
        crate::api::memory::identity,
        crate::api::memory::knowledge_graph,
        crate::api::memory::outbox,
        crate::api::memory::outbox_unseen,
        crate::api::inbox::inbox_message,
    ),
    components(
        schemas(
            ProblemBody,
            HealthDatabase,
            HealthReport,
            HttpInfo,
            AboutCounts,
            AboutResponse,
            MemoryStats,
            HeartbeatState,
            AffectiveState,
            Trend,
            LastHeartbeatEnergy,
            ActionCost,
            Drive,
            DriveReport,
            GoalsSnapshot,
            ActiveGoal,
            QueuedGoal,
            GoalIssue,
            GoalCounts,
            ResolvedAction,
            HeartbeatEntry,
            MaintenanceState,
            MaintenanceRun,
            Vitality,
            VitalityResponse,
            ConnectionHealth,
            ConnectionState,
            TableCounts,
            DashboardSnapshot,
            DerivedTimings,
            EpisodicMemory,
            SemanticMemory,
            MemoryDynamics,
            DailyCount,
            ImportanceDistribution,
            Identity,
            IdentityAspect,
            WorldviewPrimitive,
            Concept,
            KnowledgeGraph,
            GraphNode,
            GraphEdge,
            OutboxMessage,
            OutboxResponse,
            UnseenCount,
            InboxMessageRequest,
            InboxAccepted,
            Tone,
        )
    ),
    tags(
        (name = "Meta", description = "Service metadata and health"),
        (name = "State", description = "Agent state read models"),
        (name = "Dashboard", description = "Composed dashboard snapshot"),
        (name = "Memory", description = "Memories, identity, concepts and outbox"),
        (name = "Inbox", description = "User messages into the agent")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_routed_path() {
        let doc = ApiDoc::openapi();
        let (_, endpoints, _) = crate::router::build_router();
        for entry in endpoints {
            let path = entry.split_once(' ').map(|(_, p)| p).unwrap_or(&entry);
            assert!(
                doc.paths.paths.contains_key(path),
                "{path} missing from openapi"
            );
        }
    }
}
