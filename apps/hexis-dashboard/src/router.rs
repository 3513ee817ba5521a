use std::mem;

use axum::{
    handler::Handler,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use crate::{api, AppState};

#[derive(Copy, Clone)]
pub(crate) enum Stability {
    Stable,
    Beta,
}

impl Stability {
    fn as_str(self) -> &'static str {
        match self {
            Stability::Stable => "stable",
            Stability::Beta => "beta",
        }
    }
}

pub(crate) struct RouterBuilder {
    router: Router<AppState>,
    endpoints: Vec<String>,
    endpoints_meta: Vec<Value>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            endpoints: Vec::new(),
            endpoints_meta: Vec::new(),
        }
    }

    fn record(&mut self, method: &str, path: &'static str, stability: Option<Stability>) {
        self.endpoints.push(format!("{} {}", method, path));
        if let Some(stability) = stability {
            self.endpoints_meta.push(json!({
                "method": method,
                "path": path,
                "stability": stability.as_str(),
            }));
        }
    }

    pub fn route_get<H, T>(
        &mut self,
        path: &'static str,
        handler: H,
        stability: Option<Stability>,
    ) -> &mut Self
    where
        H: Handler<T, AppState> + Clone + 'static,
        T: Send + 'static,
    {
        self.record("GET", path, stability);
        let router = mem::take(&mut self.router);
        self.router = router.route(path, get(handler));
        self
    }

    pub fn route_post<H, T>(
        &mut self,
        path: &'static str,
        handler: H,
        stability: Option<Stability>,
    ) -> &mut Self
    where
        H: Handler<T, AppState> + Clone + 'static,
        T: Send + 'static,
    {
        self.record("POST", path, stability);
        let router = mem::take(&mut self.router);
        self.router = router.route(path, post(handler));
        self
    }

    pub fn build(self) -> (Router<AppState>, Vec<String>, Vec<Value>) {
        (self.router, self.endpoints, self.endpoints_meta)
    }
}

pub(crate) mod paths {
    pub const HEALTH: &str = "/health";
    pub const ABOUT: &str = "/about";
    pub const OPENAPI_JSON: &str = "/openapi.json";
    pub const STATUS: &str = "/status";
    pub const HEARTBEAT_STATE: &str = "/heartbeat-state";
    pub const LAST_HEARTBEAT_ENERGY: &str = "/last-heartbeat-energy";
    pub const DRIVES: &str = "/drives";
    pub const GOALS: &str = "/goals";
    pub const RECENT_ACTIONS: &str = "/recent-actions";
    pub const RECENT_HEARTBEATS: &str = "/recent-heartbeats";
    pub const MAINTENANCE_STATE: &str = "/maintenance-state";
    pub const MAINTENANCE_LOG: &str = "/maintenance-log";
    pub const VITALITY: &str = "/vitality";
    pub const DASHBOARD: &str = "/dashboard";
    pub const MEMORIES_EPISODIC: &str = "/memories/episodic";
    pub const MEMORIES_SEMANTIC: &str = "/memories/semantic";
    pub const MEMORY_DYNAMICS: &str = "/memory-dynamics";
    pub const IDENTITY: &str = "/identity";
    pub const KNOWLEDGE_GRAPH: &str = "/knowledge-graph";
    pub const OUTBOX: &str = "/outbox";
    pub const OUTBOX_UNSEEN: &str = "/outbox/unseen";
    pub const INBOX_MESSAGE: &str = "/inbox-message";
}

pub(crate) fn build_router() -> (Router<AppState>, Vec<String>, Vec<Value>) {
    let mut builder = RouterBuilder::new();
    builder.route_get(paths::HEALTH, api::meta::health, Some(Stability::Stable));
    builder.route_get(paths::ABOUT, api::meta::about, Some(Stability::Stable));
    builder.route_get(
        paths::OPENAPI_JSON,
        api::meta::openapi_json,
        Some(Stability::Stable),
    );
    register_state_routes(&mut builder);
    builder.route_get(
        paths::DASHBOARD,
        api::dashboard::dashboard,
        Some(Stability::Stable),
    );
    register_memory_routes(&mut builder);
    builder.route_post(
        paths::INBOX_MESSAGE,
        api::inbox::inbox_message,
        Some(Stability::Beta),
    );
    builder.build()
}

fn register_state_routes(builder: &mut RouterBuilder) {
    builder.route_get(paths::STATUS, api::state::status, Some(Stability::Stable));
    builder.route_get(
        paths::HEARTBEAT_STATE,
        api::state::heartbeat_state,
        Some(Stability::Stable),
    );
    builder.route_get(
        paths::LAST_HEARTBEAT_ENERGY,
        api::state::last_heartbeat_energy,
        Some(Stability::Stable),
    );
    builder.route_get(paths::DRIVES, api::state::drives, Some(Stability::Stable));
    builder.route_get(paths::GOALS, api::state::goals, Some(Stability::Stable));
    builder.route_get(
        paths::RECENT_ACTIONS,
        api::state::recent_actions,
        Some(Stability::Stable),
    );
    builder.route_get(
        paths::RECENT_HEARTBEATS,
        api::state::recent_heartbeats,
        Some(Stability::Stable),
    );
    builder.route_get(
        paths::MAINTENANCE_STATE,
        api::state::maintenance_state,
        Some(Stability::Stable),
    );
    builder.route_get(
        paths::MAINTENANCE_LOG,
        api::state::maintenance_log,
        Some(Stability::Stable),
    );
    builder.route_get(paths::VITALITY, api::state::vitality, Some(Stability::Stable));
}

fn register_memory_routes(builder: &mut RouterBuilder) {
    builder.route_get(
        paths::MEMORIES_EPISODIC,
        api::memory::episodic,
        Some(Stability::Stable),
    );
    builder.route_get(
        paths::MEMORIES_SEMANTIC,
        api::memory::semantic,
        Some(Stability::Stable),
    );
    builder.route_get(
        paths::MEMORY_DYNAMICS,
        api::memory::memory_dynamics,
        Some(Stability::Beta),
    );
    builder.route_get(paths::IDENTITY, api::memory::identity, Some(Stability::Beta));
    builder.route_get(
        paths::KNOWLEDGE_GRAPH,
        api::memory::knowledge_graph,
        Some(Stability::Beta),
    );
    builder.route_get(paths::OUTBOX, api::memory::outbox, Some(Stability::Stable));
    builder.route_get(
        paths::OUTBOX_UNSEEN,
        api::memory::outbox_unseen,
        Some(Stability::Stable),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_indexed_once() {
        let (_, endpoints, meta) = build_router();
        assert_eq!(endpoints.len(), 22);
        assert_eq!(meta.len(), endpoints.len());
        let mut unique = endpoints.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), endpoints.len());
        assert!(endpoints.contains(&"POST /inbox-message".to_string()));
        assert!(endpoints.contains(&"GET /dashboard".to_string()));
    }
}
