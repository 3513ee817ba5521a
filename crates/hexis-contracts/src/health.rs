use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// State of one dependency as seen by the dashboard. `Unknown` is used whenever
/// nothing actually probed the dependency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connected,
    Disconnected,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionHealth {
    pub database: ConnectionState,
    pub mcp_bridge: ConnectionState,
    pub llm_api: ConnectionState,
}

impl ConnectionHealth {
    /// Only the database is probed by this service.
    pub fn from_database(reachable: bool) -> Self {
        Self {
            database: if reachable {
                ConnectionState::Connected
            } else {
                ConnectionState::Disconnected
            },
            mcp_bridge: ConnectionState::Unknown,
            llm_api: ConnectionState::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
pub struct TableCounts {
    pub memories: i64,
    pub episodes: i64,
    #[serde(rename = "clusters")]
    pub memory_clusters: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unprobed_dependencies_stay_unknown() {
        let health = ConnectionHealth::from_database(true);
        assert_eq!(
            serde_json::to_value(health).expect("json"),
            json!({"database": "connected", "mcpBridge": "unknown", "llmApi": "unknown"})
        );
        assert_eq!(
            ConnectionHealth::from_database(false).database,
            ConnectionState::Disconnected
        );
    }

    #[test]
    fn cluster_count_serializes_as_clusters() {
        let counts = TableCounts {
            memories: 4,
            episodes: 2,
            memory_clusters: 1,
        };
        assert_eq!(
            serde_json::to_value(counts).expect("json"),
            json!({"memories": 4, "episodes": 2, "clusters": 1})
        );
    }
}
