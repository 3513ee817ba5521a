use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::{lenient, ContractError};

/// Goal aggregate as pre-computed by the store. Fields the dashboard does not
/// interpret are carried through untouched in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct GoalsSnapshot {
    #[serde(default)]
    pub active: Vec<ActiveGoal>,
    #[serde(default)]
    pub queued: Vec<QueuedGoal>,
    #[serde(default)]
    pub issues: Vec<GoalIssue>,
    #[serde(default)]
    pub counts: GoalCounts,
}

impl GoalsSnapshot {
    /// Parses the snapshot column. `null` means "no goals yet".
    pub fn from_value(value: Value) -> Result<Self, ContractError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ActiveGoal {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub due_at: Option<String>,
    pub last_touched: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub progress_count: i64,
    pub blocked_by: Option<Value>,
    pub metrics: Option<Value>,
    #[serde(flatten)]
    #[schema(ignore)]
    pub extra: Map<String, Value>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct QueuedGoal {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub source: Option<String>,
    pub due_at: Option<String>,
    #[serde(flatten)]
    #[schema(ignore)]
    pub extra: Map<String, Value>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct GoalIssue {
    pub goal_id: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub issue: String,
    pub due_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub days_since_touched: Option<f64>,
    #[serde(flatten)]
    #[schema(ignore)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct GoalCounts {
    #[serde(default, deserialize_with = "lenient::count")]
    pub active: i64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub queued: i64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub backburner: i64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub blocked: i64,
}
