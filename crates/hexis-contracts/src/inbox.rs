use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::{ContractError, Validate};

/// Tone a user picked for an inbound message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Casual,
    #[default]
    Normal,
    Warm,
    Urgent,
}

/// Emotional weighting applied to the memory created from a message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneWeights {
    pub valence: f64,
    pub importance: f64,
}

impl Tone {
    /// Case-insensitive; anything unrecognised is `Normal`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "casual" => Tone::Casual,
            "warm" => Tone::Warm,
            "urgent" => Tone::Urgent,
            _ => Tone::Normal,
        }
    }

    pub fn weights(self) -> ToneWeights {
        let (valence, importance) = match self {
            Tone::Casual => (0.2, 0.4),
            Tone::Normal => (0.0, 0.5),
            Tone::Warm => (0.5, 0.6),
            Tone::Urgent => (-0.1, 0.9),
        };
        ToneWeights {
            valence,
            importance,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Casual => "casual",
            Tone::Normal => "normal",
            Tone::Warm => "warm",
            Tone::Urgent => "urgent",
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InboxMessageRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub in_reply_to: Option<String>,
    #[serde(default, deserialize_with = "lenient_tone")]
    pub tone: Option<Tone>,
}

/// A tone that is not a string is ignored rather than rejecting the message.
fn lenient_tone<'de, D>(deserializer: D) -> Result<Option<Tone>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => Some(Tone::parse(&s)),
        _ => None,
    })
}

impl InboxMessageRequest {
    pub const MESSAGE_REQUIRED: &'static str = "Message is required";

    pub fn tone(&self) -> Tone {
        self.tone.unwrap_or_default()
    }

    pub fn trimmed_message(&self) -> &str {
        self.message.trim()
    }
}

impl Validate for InboxMessageRequest {
    fn validate(&self) -> Result<(), ContractError> {
        if self.trimmed_message().is_empty() {
            return Err(ContractError::Invalid(Self::MESSAGE_REQUIRED));
        }
        Ok(())
    }
}
