use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::market::MarketId;
use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    #[serde(rename = "NAVIGATE")]
    Navigate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyAction {
    #[serde(rename = "type")]
    pub kind: ActionType,
    #[serde(rename = "marketId")]
    pub market_id: MarketId,
    #[serde(rename = "productId", default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
}

impl ReplyAction {
    pub fn navigate(market_id: MarketId, product_id: Option<ProductId>) -> Self {
        Self { kind: ActionType::Navigate, market_id, product_id }
    }
}

/// The single reply shape every resolution path produces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ReplyAction>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReplyParseError {
    #[error("model output is not valid json: {0}")]
    InvalidJson(String),
    #[error("model output is not a json object")]
    NotAnObject,
    #[error("model output has no string `text` field")]
    MissingText,
    #[error("model output has an empty `text` field")]
    EmptyText,
    #[error("model output has a malformed `action`: {0}")]
    InvalidAction(String),
    #[error("model output references unknown market `{market_id}` / product `{product_id:?}`")]
    UnknownReference { market_id: String, product_id: Option<String> },
}

impl ChatReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), action: None }
    }

    pub fn navigate(
        text: impl Into<String>,
        market_id: MarketId,
        product_id: Option<ProductId>,
    ) -> Self {
        Self { text: text.into(), action: Some(ReplyAction::navigate(market_id, product_id)) }
    }

    /// Parses raw model text into a reply. Unknown top-level fields are ignored;
    /// an `action` that is present and non-null must be well-formed.
    pub fn from_model_output(raw: &str) -> Result<Self, ReplyParseError> {
        let value: Value = serde_json::from_str(raw.trim())
            .map_err(|error| ReplyParseError::InvalidJson(error.to_string()))?;
        let object = value.as_object().ok_or(ReplyParseError::NotAnObject)?;

        let text = object.get("text").and_then(Value::as_str).ok_or(ReplyParseError::MissingText)?;
        if text.trim().is_empty() {
            return Err(ReplyParseError::EmptyText);
        }

        let action = match object.get("action") {
            None | Some(Value::Null) => None,
            Some(raw_action) => Some(
                serde_json::from_value::<ReplyAction>(raw_action.clone())
                    .map_err(|error| ReplyParseError::InvalidAction(error.to_string()))?,
            ),
        };

        Ok(Self { text: text.to_string(), action })
    }
}
