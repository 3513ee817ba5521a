use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::lenient;

/// Kind of an action taken during a heartbeat. Kinds the dashboard does not know
/// about are kept verbatim so nothing the agent logged is lost.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    Recall,
    Reflect,
    Connect,
    Maintain,
    Rest,
    ReachOutUser,
    ReachOutPublic,
    Reprioritize,
    InquireShallow,
    InquireDeep,
    Synthesize,
    BrainstormGoals,
    Other(String),
}

impl ActionKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "recall" => ActionKind::Recall,
            "reflect" => ActionKind::Reflect,
            "connect" => ActionKind::Connect,
            "maintain" => ActionKind::Maintain,
            "rest" => ActionKind::Rest,
            "reach_out_user" => ActionKind::ReachOutUser,
            "reach_out_public" => ActionKind::ReachOutPublic,
            "reprioritize" => ActionKind::Reprioritize,
            "inquire_shallow" => ActionKind::InquireShallow,
            "inquire_deep" => ActionKind::InquireDeep,
            "synthesize" => ActionKind::Synthesize,
            "brainstorm_goals" => ActionKind::BrainstormGoals,
            other => ActionKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Recall => "recall",
            ActionKind::Reflect => "reflect",
            ActionKind::Connect => "connect",
            ActionKind::Maintain => "maintain",
            ActionKind::Rest => "rest",
            ActionKind::ReachOutUser => "reach_out_user",
            ActionKind::ReachOutPublic => "reach_out_public",
            ActionKind::Reprioritize => "reprioritize",
            ActionKind::InquireShallow => "inquire_shallow",
            ActionKind::InquireDeep => "inquire_deep",
            ActionKind::Synthesize => "synthesize",
            ActionKind::BrainstormGoals => "brainstorm_goals",
            ActionKind::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for ActionKind {
    fn from(value: String) -> Self {
        ActionKind::parse(&value)
    }
}

impl From<ActionKind> for String {
    fn from(value: ActionKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-kind view of an action's params, carrying only what each kind uses.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionDetail {
    Recall { query: Option<String> },
    Reflect { aspect: Option<String> },
    Connect,
    Maintain { operation: Option<String> },
    Rest,
    ReachOutUser,
    ReachOutPublic,
    Reprioritize { action: Option<String> },
    InquireShallow { query: Option<String> },
    InquireDeep { query: Option<String> },
    Synthesize { topic: Option<String> },
    BrainstormGoals,
    Other { kind: String },
}

const QUERY_PREVIEW_CHARS: usize = 40;

impl ActionDetail {
    pub fn from_params(kind: &ActionKind, params: &Value) -> Self {
        let field = |name: &str| params.get(name).and_then(display_value);
        match kind {
            ActionKind::Recall => ActionDetail::Recall {
                query: field("query"),
            },
            ActionKind::Reflect => ActionDetail::Reflect {
                aspect: field("aspect").or_else(|| field("focus")),
            },
            ActionKind::Connect => ActionDetail::Connect,
            ActionKind::Maintain => ActionDetail::Maintain {
                operation: field("operation"),
            },
            ActionKind::Rest => ActionDetail::Rest,
            ActionKind::ReachOutUser => ActionDetail::ReachOutUser,
            ActionKind::ReachOutPublic => ActionDetail::ReachOutPublic,
            ActionKind::Reprioritize => ActionDetail::Reprioritize {
                action: field("action"),
            },
            ActionKind::InquireShallow => ActionDetail::InquireShallow {
                query: field("query").or_else(|| field("question")),
            },
            ActionKind::InquireDeep => ActionDetail::InquireDeep {
                query: field("query").or_else(|| field("question")),
            },
            ActionKind::Synthesize => ActionDetail::Synthesize {
                topic: field("topic"),
            },
            ActionKind::BrainstormGoals => ActionDetail::BrainstormGoals,
            ActionKind::Other(raw) => ActionDetail::Other { kind: raw.clone() },
        }
    }

    /// One-line description shown next to an action in the activity feed.
    pub fn summary(&self) -> String {
        match self {
            ActionDetail::Recall { query: Some(q) } => format!("\"{}\"", preview(q)),
            ActionDetail::Recall { query: None } => "Memory retrieval".to_string(),
            ActionDetail::Reflect { aspect: Some(a) } => format!("On {a}"),
            ActionDetail::Reflect { aspect: None } => "Self-reflection".to_string(),
            ActionDetail::Connect => "Created memory relationship".to_string(),
            ActionDetail::Maintain { operation: Some(op) } => op.clone(),
            ActionDetail::Maintain { operation: None } => "Maintenance operation".to_string(),
            ActionDetail::Rest => "Energy conservation".to_string(),
            ActionDetail::ReachOutUser => "Reached out to user".to_string(),
            ActionDetail::ReachOutPublic => "Public post queued".to_string(),
            ActionDetail::Reprioritize { action: Some(a) } => a.clone(),
            ActionDetail::Reprioritize { action: None } => "Goal management".to_string(),
            ActionDetail::InquireShallow { query: Some(q) }
            | ActionDetail::InquireDeep { query: Some(q) } => preview(q),
            ActionDetail::InquireShallow { query: None } => "inquire_shallow".to_string(),
            ActionDetail::InquireDeep { query: None } => "inquire_deep".to_string(),
            ActionDetail::Synthesize { topic: Some(t) } => t.clone(),
            ActionDetail::Synthesize { topic: None } => "synthesize".to_string(),
            ActionDetail::BrainstormGoals => "Brainstormed goals".to_string(),
            ActionDetail::Other { kind } => kind.clone(),
        }
    }
}

/// Renders a param for display. Empty strings, zero, `false` and null count
/// as absent; other scalars and structures are stringified.
fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > QUERY_PREVIEW_CHARS {
        let head: String = text.chars().take(QUERY_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Action exactly as embedded in a heartbeat's `actions_taken` array.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawAction {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub cost: Option<f64>,
}

impl RawAction {
    pub fn kind(&self) -> ActionKind {
        match self.action.as_deref() {
            Some(raw) if !raw.trim().is_empty() => ActionKind::parse(raw),
            _ => ActionKind::Other("unknown".to_string()),
        }
    }
}

/// Default cost per action kind, built from `cost_<kind>` configuration keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostTable {
    defaults: HashMap<String, f64>,
}

impl CostTable {
    pub const KEY_PREFIX: &'static str = "cost_";

    /// Builds the table from `(key, value)` configuration pairs; keys without the
    /// `cost_` prefix and values that are not numbers are ignored.
    pub fn from_config<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let defaults = entries
            .into_iter()
            .filter_map(|(key, value)| {
                let kind = key.as_ref().strip_prefix(Self::KEY_PREFIX)?;
                let cost = lenient::f64_of(&value)?;
                Some((kind.to_string(), cost))
            })
            .collect();
        Self { defaults }
    }

    pub fn default_for(&self, kind: &ActionKind) -> Option<f64> {
        self.defaults.get(kind.as_str()).copied()
    }

    /// Explicit cost wins, then the configured default, then zero.
    pub fn resolve(&self, kind: &ActionKind, explicit: Option<f64>) -> f64 {
        explicit
            .filter(|c| c.is_finite())
            .or_else(|| self.default_for(kind))
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.defaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty()
    }
}

/// A flattened action from the heartbeat log, costed and optionally enriched with
/// the output of the external call it references.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAction {
    pub heartbeat_number: i64,
    pub timestamp: Option<String>,
    #[schema(value_type = String)]
    pub action: ActionKind,
    pub summary: String,
    pub params: Value,
    pub result: Value,
    pub cost: f64,
    pub external_output: Option<Value>,
}

impl ResolvedAction {
    pub fn from_raw(
        heartbeat_number: i64,
        timestamp: Option<String>,
        raw: RawAction,
        costs: &CostTable,
    ) -> Self {
        let kind = raw.kind();
        let params = match raw.params {
            Some(Value::Null) | None => Value::Object(Map::new()),
            Some(other) => other,
        };
        let summary = ActionDetail::from_params(&kind, &params).summary();
        let cost = costs.resolve(&kind, raw.cost);
        Self {
            heartbeat_number,
            timestamp,
            action: kind,
            summary,
            params,
            result: raw.result.unwrap_or(Value::Null),
            cost,
            external_output: None,
        }
    }

    /// Id of the external call this action's result points at, if any.
    pub fn external_call_id(&self) -> Option<String> {
        match self.result.get("external_call_id")? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ActionCost {
    #[schema(value_type = String)]
    pub action: ActionKind,
    pub cost: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> CostTable {
        CostTable::from_config(vec![
            ("cost_rest", json!("10")),
            ("cost_recall", json!(1.5)),
            ("max_energy", json!(20)),
            ("cost_broken", json!("n/a")),
        ])
    }

    #[test]
    fn cost_table_keeps_only_cost_keys() {
        let costs = table();
        assert_eq!(costs.len(), 2);
        assert_eq!(costs.default_for(&ActionKind::Rest), Some(10.0));
        assert_eq!(costs.default_for(&ActionKind::Recall), Some(1.5));
    }

    #[test]
    fn explicit_cost_beats_configured_default() {
        let costs = table();
        assert_eq!(costs.resolve(&ActionKind::Recall, Some(3.0)), 3.0);
        assert_eq!(costs.resolve(&ActionKind::Recall, Some(0.0)), 0.0);
    }

    #[test]
    fn missing_cost_uses_default_then_zero() {
        let costs = table();
        assert_eq!(costs.resolve(&ActionKind::Rest, None), 10.0);
        assert_eq!(costs.resolve(&ActionKind::Synthesize, None), 0.0);
        assert_eq!(
            costs.resolve(&ActionKind::Other("dance".into()), None),
            0.0
        );
    }

    #[test]
    fn unknown_kinds_round_trip_verbatim() {
        let kind: ActionKind = serde_json::from_value(json!("dance")).expect("kind");
        assert_eq!(kind, ActionKind::Other("dance".into()));
        assert_eq!(serde_json::to_value(&kind).expect("json"), json!("dance"));
        let known: ActionKind = serde_json::from_value(json!("reach_out_user")).expect("kind");
        assert_eq!(known, ActionKind::ReachOutUser);
    }

    #[test]
    fn summaries_follow_kind() {
        let long = "a".repeat(50);
        let recall = ActionDetail::from_params(&ActionKind::Recall, &json!({"query": long}));
        assert_eq!(recall.summary(), format!("\"{}...\"", "a".repeat(40)));
        let reflect = ActionDetail::from_params(&ActionKind::Reflect, &json!({"aspect": "values"}));
        assert_eq!(reflect.summary(), "On values");
        let rest = ActionDetail::from_params(&ActionKind::Rest, &json!({}));
        assert_eq!(rest.summary(), "Energy conservation");
        let repri = ActionDetail::from_params(&ActionKind::Reprioritize, &json!({}));
        assert_eq!(repri.summary(), "Goal management");
        let maintain = ActionDetail::from_params(&ActionKind::Maintain, &json!({"operation": 7}));
        assert_eq!(maintain.summary(), "7");
        let synth = ActionDetail::from_params(&ActionKind::Synthesize, &json!({}));
        assert_eq!(synth.summary(), "synthesize");
    }

    #[test]
    fn summaries_fall_back_to_descriptions() {
        let empty = json!({});
        let summary =
            |kind: ActionKind, params: &Value| ActionDetail::from_params(&kind, params).summary();
        assert_eq!(summary(ActionKind::Recall, &empty), "Memory retrieval");
        assert_eq!(summary(ActionKind::Reflect, &empty), "Self-reflection");
        assert_eq!(summary(ActionKind::Maintain, &empty), "Maintenance operation");
        assert_eq!(
            summary(ActionKind::Maintain, &json!({"operation": ""})),
            "Maintenance operation"
        );
        assert_eq!(
            summary(ActionKind::Reprioritize, &json!({"action": true})),
            "true"
        );
    }

    #[test]
    fn resolved_action_reads_external_call_id() {
        let raw: RawAction = serde_json::from_value(json!({
            "action": "inquire_deep",
            "params": {"query": "what is rust"},
            "result": {"external_call_id": "ec-1"},
            "cost": "4"
        }))
        .expect("raw");
        let action = ResolvedAction::from_raw(9, None, raw, &CostTable::default());
        assert_eq!(action.cost, 4.0);
        assert_eq!(action.summary, "what is rust");
        assert_eq!(action.external_call_id().as_deref(), Some("ec-1"));
    }

    #[test]
    fn missing_params_become_empty_object() {
        let raw: RawAction = serde_json::from_value(json!({"action": "rest"})).expect("raw");
        let action = ResolvedAction::from_raw(1, None, raw, &CostTable::default());
        assert_eq!(action.params, json!({}));
        assert_eq!(action.result, Value::Null);
        let json = serde_json::to_value(&action).expect("json");
        assert!(json.get("externalOutput").is_none());
    }
}
