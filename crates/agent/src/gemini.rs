//! Google Gemini `generateContent` client.
//!
//! Sends the composed prompt as a single user turn and returns the first
//! candidate's text. The whole exchange (connect, status, body) is bounded by
//! one timeout; there is no retry.

use std::time::Duration;

use async_trait::async_trait;
use pazar_core::config::LlmConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::{strip_code_fences, LlmClient, LlmError};

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: SecretString,
    timeout: Duration,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        self.candidates.into_iter().next()?.content?.parts.into_iter().next()?.text
    }
}

impl GeminiClient {
    pub fn new(config: &LlmConfig, api_key: SecretString) -> Result<Self, LlmError> {
        Self::from_parts(
            &config.base_url,
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn from_parts(
        base_url: &str,
        model: &str,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| LlmError::Transport(error.without_url().to_string()))?;
        let endpoint =
            format!("{}/models/{}:generateContent", base_url.trim_end_matches('/'), model.trim());

        Ok(Self { client, endpoint, api_key, timeout })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn exchange(&self, prompt: &str) -> Result<String, LlmError> {
        let payload = GenerateContentRequest {
            contents: vec![RequestContent { parts: vec![RequestPart { text: prompt }] }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&payload)
            .send()
            .await
            .map_err(|error| self.transport_error(error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|error| self.transport_error(error))?;
        let envelope: GenerateContentResponse = serde_json::from_slice(&body)
            .map_err(|error| LlmError::MalformedEnvelope(error.to_string()))?;
        let text = envelope.first_text().ok_or_else(|| {
            LlmError::MalformedEnvelope("missing candidates[0].content.parts[0].text".to_string())
        })?;

        let cleaned = strip_code_fences(&text);
        if cleaned.is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        Ok(cleaned)
    }

    // The request url carries the api key, so it is dropped from error text.
    fn transport_error(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Transport(error.without_url().to_string())
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(
            event_name = "agent.gemini.request",
            endpoint = %self.endpoint,
            prompt_chars = prompt.chars().count(),
            "calling gemini generateContent"
        );

        tokio::time::timeout(self.timeout, self.exchange(prompt))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))?
    }
}
