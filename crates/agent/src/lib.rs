//! Agent runtime - model-backed answers with a deterministic safety net
//!
//! This crate turns a user's chat message into exactly one [`ChatReply`]:
//! - Composes a prompt from the market catalog and the message (`prompt`)
//! - Calls the generative model once, bounded by a timeout (`gemini`, `llm`)
//! - Validates the model's JSON reply and falls back to the keyword matcher
//!   from `pazar-core` on any failure (`resolver`)
//!
//! # Key Types
//!
//! - `ResponseResolver` - the resolution pipeline
//! - `LlmClient` - pluggable model seam; `GeminiClient` and `UnconfiguredClient`
//! - `ResolutionOutcome` - which path answered, and why the model path was skipped
//!
//! [`ChatReply`]: pazar_core::domain::chat::ChatReply

pub mod gemini;
pub mod llm;
pub mod prompt;
pub mod resolver;

pub use gemini::GeminiClient;
pub use llm::{build_client, LlmClient, LlmError, UnconfiguredClient};
pub use prompt::PromptComposer;
pub use resolver::{FallbackReason, ReferencePolicy, ResolutionOutcome, ResponseResolver};
