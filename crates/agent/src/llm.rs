use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pazar_core::config::{LlmConfig, LlmCredential};
use thiserror::Error;

use crate::gemini::GeminiClient;

/// Why a completion could not be produced. Every variant sends the resolver to the
/// keyword fallback; none of them reach the caller.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("no model credential configured")]
    Unconfigured,
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),
    #[error("model endpoint returned status {0}")]
    Status(u16),
    #[error("model transport failed: {0}")]
    Transport(String),
    #[error("model response envelope was malformed: {0}")]
    MalformedEnvelope(String),
    #[error("model returned no text")]
    EmptyCompletion,
    #[error("model call was cancelled")]
    Cancelled,
}

impl LlmError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Timeout(_) => "timeout",
            Self::Status(_) => "status",
            Self::Transport(_) => "transport",
            Self::MalformedEnvelope(_) => "malformed_envelope",
            Self::EmptyCompletion => "empty_completion",
            Self::Cancelled => "cancelled",
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One attempt, no retries. Returns the model text with code fences removed.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Stand-in used when no credential is available; the model path always fails fast.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnconfiguredClient;

#[async_trait]
impl LlmClient for UnconfiguredClient {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::Unconfigured)
    }
}

pub fn build_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    match config.credential() {
        LlmCredential::Configured(api_key) => Ok(Arc::new(GeminiClient::new(config, api_key)?)),
        LlmCredential::Unconfigured => Ok(Arc::new(UnconfiguredClient)),
    }
}

/// Removes markdown code fences models like to wrap JSON in.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}
