use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{lenient, ActionCost};

/// Direction of an affect dimension between the two latest heartbeats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
    #[default]
    Unknown,
}

impl Trend {
    const EPSILON: f64 = 0.05;

    pub fn between(previous: f64, latest: f64) -> Self {
        let delta = latest - previous;
        if !delta.is_finite() {
            Trend::Unknown
        } else if delta > Self::EPSILON {
            Trend::Up
        } else if delta < -Self::EPSILON {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AffectiveState {
    pub valence: f64,
    pub arousal: f64,
    pub dominance: f64,
    pub primary_emotion: String,
    pub valence_trend: Trend,
    pub arousal_trend: Trend,
    pub dominance_trend: Trend,
}

impl Default for AffectiveState {
    fn default() -> Self {
        Self {
            valence: 0.0,
            arousal: 0.0,
            dominance: 0.5,
            primary_emotion: "neutral".to_string(),
            valence_trend: Trend::Unknown,
            arousal_trend: Trend::Unknown,
            dominance_trend: Trend::Unknown,
        }
    }
}

impl AffectiveState {
    /// Reads the agent's `affective_state` JSON, defaulting each missing field.
    pub fn from_value(value: &Value) -> Self {
        let base = Self::default();
        let num = |key: &str, fallback: f64| value.get(key).and_then(lenient::f64_of).unwrap_or(fallback);
        Self {
            valence: num("valence", base.valence),
            arousal: num("arousal", base.arousal),
            dominance: num("dominance", base.dominance),
            primary_emotion: value
                .get("primary_emotion")
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .unwrap_or(base.primary_emotion),
            ..base
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatState {
    pub current_energy: f64,
    pub max_energy: f64,
    pub heartbeat_count: i64,
    pub first_heartbeat: Option<String>,
    pub last_heartbeat: Option<String>,
    pub next_heartbeat: Option<String>,
    pub is_paused: bool,
    pub interval_minutes: f64,
    pub maintenance_interval_seconds: f64,
    pub active_goals: i64,
    pub llm_model: String,
    pub affective_state: AffectiveState,
    pub unread_messages: i64,
    pub heartbeats_24h: i64,
}

impl HeartbeatState {
    pub const DEFAULT_ENERGY: f64 = 10.0;
    pub const DEFAULT_MAX_ENERGY: f64 = 20.0;
    pub const DEFAULT_INTERVAL_MINUTES: f64 = 60.0;
    pub const DEFAULT_MAINTENANCE_INTERVAL_SECONDS: f64 = 300.0;
}

impl Default for HeartbeatState {
    fn default() -> Self {
        Self {
            current_energy: Self::DEFAULT_ENERGY,
            max_energy: Self::DEFAULT_MAX_ENERGY,
            heartbeat_count: 0,
            first_heartbeat: None,
            last_heartbeat: None,
            next_heartbeat: None,
            is_paused: false,
            interval_minutes: Self::DEFAULT_INTERVAL_MINUTES,
            maintenance_interval_seconds: Self::DEFAULT_MAINTENANCE_INTERVAL_SECONDS,
            active_goals: 0,
            llm_model: "unknown".to_string(),
            affective_state: AffectiveState::default(),
            unread_messages: 0,
            heartbeats_24h: 0,
        }
    }
}

/// One row of the heartbeat window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct HeartbeatEntry {
    pub id: i64,
    pub heartbeat_number: i64,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub energy_start: f64,
    pub energy_end: f64,
    pub narrative: Option<String>,
    pub emotional_valence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LastHeartbeatEnergy {
    pub heartbeat_number: i64,
    pub energy_start: f64,
    pub energy_end: f64,
    pub total_cost: f64,
    pub recharge: f64,
    pub action_costs: Vec<ActionCost>,
    pub decision_reasoning: Option<String>,
}

impl LastHeartbeatEnergy {
    pub const DEFAULT_RECHARGE: f64 = 10.0;

    pub fn empty(recharge: f64) -> Self {
        Self {
            heartbeat_number: 0,
            energy_start: 0.0,
            energy_end: 0.0,
            total_cost: 0.0,
            recharge,
            action_costs: Vec::new(),
            decision_reasoning: None,
        }
    }
}

impl Default for LastHeartbeatEnergy {
    fn default() -> Self {
        Self::empty(Self::DEFAULT_RECHARGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trend_uses_dead_band() {
        assert_eq!(Trend::between(0.1, 0.3), Trend::Up);
        assert_eq!(Trend::between(0.3, 0.1), Trend::Down);
        assert_eq!(Trend::between(0.3, 0.32), Trend::Flat);
    }

    #[test]
    fn affective_state_defaults_missing_fields() {
        let state = AffectiveState::from_value(&json!({"valence": "0.4", "primary_emotion": ""}));
        assert_eq!(state.valence, 0.4);
        assert_eq!(state.dominance, 0.5);
        assert_eq!(state.primary_emotion, "neutral");
        assert_eq!(state.arousal_trend, Trend::Unknown);
    }

    #[test]
    fn heartbeat_state_serializes_camel_case() {
        let json = serde_json::to_value(HeartbeatState::default()).expect("json");
        assert_eq!(json["currentEnergy"], json!(10.0));
        assert_eq!(json["heartbeats24h"], json!(0));
        assert_eq!(json["affectiveState"]["primaryEmotion"], json!("neutral"));
        assert_eq!(json["lastHeartbeat"], Value::Null);
    }
}
