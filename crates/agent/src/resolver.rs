//! Response resolution: one model attempt, then the keyword fallback.
//!
//! A request moves START -> AI_ATTEMPTED -> RESOLVED exactly once. Every
//! failure on the model side (no credential, transport, status, timeout,
//! cancellation, unparseable or inconsistent output) resolves with the
//! matcher's reply for the same message. Nothing is retried and no error
//! reaches the caller.

use std::future::Future;
use std::sync::Arc;

use pazar_core::config::LlmConfig;
use pazar_core::domain::chat::{ChatReply, ChatRequest, ReplyParseError};
use pazar_core::knowledge::KnowledgeBase;
use pazar_core::matcher::RuleBasedMatcher;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::{build_client, LlmClient, LlmError};
use crate::prompt::PromptComposer;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FallbackReason {
    #[error(transparent)]
    Model(#[from] LlmError),
    #[error(transparent)]
    InvalidReply(#[from] ReplyParseError),
}

impl FallbackReason {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Model(error) => error.kind(),
            Self::InvalidReply(ReplyParseError::UnknownReference { .. }) => "unknown_reference",
            Self::InvalidReply(_) => "invalid_reply",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolutionOutcome {
    AiSucceeded(ChatReply),
    FallbackUsed(ChatReply, FallbackReason),
}

impl ResolutionOutcome {
    pub fn reply(&self) -> &ChatReply {
        match self {
            Self::AiSucceeded(reply) | Self::FallbackUsed(reply, _) => reply,
        }
    }

    pub fn into_reply(self) -> ChatReply {
        match self {
            Self::AiSucceeded(reply) | Self::FallbackUsed(reply, _) => reply,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::FallbackUsed(..))
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            Self::AiSucceeded(_) => None,
            Self::FallbackUsed(_, reason) => Some(reason),
        }
    }

    pub fn path(&self) -> &'static str {
        if self.is_fallback() {
            "fallback"
        } else {
            "ai"
        }
    }
}

/// How far model-supplied market/product ids are trusted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReferencePolicy {
    /// Ids must exist in the knowledge base; otherwise the reply is rejected.
    #[default]
    Validate,
    /// Ids are passed through as the model wrote them.
    Trust,
}

impl ReferencePolicy {
    pub fn from_flag(validate_references: bool) -> Self {
        if validate_references {
            Self::Validate
        } else {
            Self::Trust
        }
    }
}

#[derive(Clone)]
pub struct ResponseResolver {
    client: Arc<dyn LlmClient>,
    knowledge: Arc<KnowledgeBase>,
    prompts: PromptComposer,
    reference_policy: ReferencePolicy,
}

impl ResponseResolver {
    pub fn new(
        client: Arc<dyn LlmClient>,
        knowledge: Arc<KnowledgeBase>,
        reference_policy: ReferencePolicy,
    ) -> Self {
        let prompts = PromptComposer::new(&knowledge);
        Self { client, knowledge, prompts, reference_policy }
    }

    pub fn from_config(config: &LlmConfig, knowledge: Arc<KnowledgeBase>) -> Result<Self, LlmError> {
        let client = build_client(config)?;
        Ok(Self::new(client, knowledge, ReferencePolicy::from_flag(config.validate_references)))
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub async fn reply(&self, request: &ChatRequest) -> ChatReply {
        self.resolve(request).await.into_reply()
    }

    pub async fn resolve(&self, request: &ChatRequest) -> ResolutionOutcome {
        self.resolve_until(request, std::future::pending::<()>()).await
    }

    /// Like [`resolve`](Self::resolve), but gives up on the model call as soon as
    /// `cancel` completes and answers from the fallback instead.
    pub async fn resolve_until<F>(&self, request: &ChatRequest, cancel: F) -> ResolutionOutcome
    where
        F: Future<Output = ()>,
    {
        let prompt = self.prompts.compose(&request.message);

        let completion = tokio::select! {
            biased;
            _ = cancel => Err(LlmError::Cancelled),
            result = self.client.complete(&prompt) => result,
        };

        let accepted = completion.map_err(FallbackReason::from).and_then(|raw| self.accept(&raw));
        match accepted {
            Ok(reply) => {
                info!(
                    event_name = "agent.resolver.ai_succeeded",
                    has_action = reply.action.is_some(),
                    "model reply accepted"
                );
                ResolutionOutcome::AiSucceeded(reply)
            }
            Err(reason) => {
                let fallback = RuleBasedMatcher::new(&self.knowledge).evaluate(&request.message);
                warn!(
                    event_name = "agent.resolver.fallback_used",
                    reason_kind = reason.kind(),
                    reason = %reason,
                    rule = fallback.rule.map(|rule| rule.as_str()).unwrap_or("default"),
                    "model path failed, answering from keyword matcher"
                );
                ResolutionOutcome::FallbackUsed(fallback.reply, reason)
            }
        }
    }

    fn accept(&self, raw: &str) -> Result<ChatReply, FallbackReason> {
        let reply = ChatReply::from_model_output(raw)?;

        if self.reference_policy == ReferencePolicy::Validate {
            if let Some(action) = &reply.action {
                if !self.knowledge.contains_reference(&action.market_id, action.product_id.as_ref()) {
                    return Err(ReplyParseError::UnknownReference {
                        market_id: action.market_id.0.clone(),
                        product_id: action.product_id.as_ref().map(|id| id.0.clone()),
                    }
                    .into());
                }
            }
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use pazar_core::domain::chat::{ChatReply, ChatRequest, ReplyParseError};
    use pazar_core::domain::market::MarketId;
    use pazar_core::domain::product::ProductId;
    use pazar_core::knowledge::KnowledgeBase;
    use pazar_core::matcher::RuleBasedMatcher;

    use super::{FallbackReason, ReferencePolicy, ResolutionOutcome, ResponseResolver};
    use crate::llm::{LlmClient, LlmError, UnconfiguredClient};

    struct ScriptedClient {
        response: Result<String, LlmError>,
        delay: Duration,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn answering(response: Result<&str, LlmError>) -> Arc<Self> {
            Arc::new(Self {
                response: response.map(str::to_string),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn slow() -> Arc<Self> {
            Arc::new(Self {
                response: Ok(r#"{"text":"too late"}"#.to_string()),
                delay: Duration::from_secs(30),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt.to_string());
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.response.clone()
        }
    }

    fn resolver(client: Arc<dyn LlmClient>, policy: ReferencePolicy) -> ResponseResolver {
        ResponseResolver::new(client, Arc::new(KnowledgeBase::builtin()), policy)
    }

    fn matcher_reply(message: &str) -> ChatReply {
        let kb = KnowledgeBase::builtin();
        RuleBasedMatcher::new(&kb).respond(message)
    }

    #[tokio::test]
    async fn well_formed_model_reply_passes_through_unchanged() {
        let client = ScriptedClient::answering(Ok(
            r#"{"text":"Beşiktaş'ta domates 20 TL, sizi oraya götüreyim.","action":{"type":"NAVIGATE","marketId":"market_1","productId":"p_tom"}}"#,
        ));
        let outcome = resolver(client.clone(), ReferencePolicy::Validate)
            .resolve(&ChatRequest::new("beni domatese götür"))
            .await;

        assert_eq!(
            outcome,
            ResolutionOutcome::AiSucceeded(ChatReply::navigate(
                "Beşiktaş'ta domates 20 TL, sizi oraya götüreyim.",
                MarketId::from("market_1"),
                Some(ProductId::from("p_tom")),
            ))
        );
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn prompt_carries_catalog_and_user_message() {
        let client = ScriptedClient::answering(Ok(r#"{"text":"Merhaba!"}"#));
        resolver(client.clone(), ReferencePolicy::Validate)
            .resolve(&ChatRequest::new("Selam"))
            .await;

        let prompts = client.prompts.lock().expect("prompt log").clone();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("market_3"));
        assert!(prompts[0].ends_with("KULLANICI: Selam\nASİSTAN (JSON):"));
    }

    #[tokio::test]
    async fn model_failures_fall_back_to_matcher_reply() {
        let message = "Domates nerede?";
        let failures = [
            Err(LlmError::Timeout(Duration::from_secs(5))),
            Err(LlmError::Status(500)),
            Err(LlmError::Status(429)),
            Err(LlmError::Transport("connection reset".to_string())),
            Err(LlmError::MalformedEnvelope("no candidates".to_string())),
            Err(LlmError::EmptyCompletion),
            Ok("Beşiktaş'ta 20 TL"),
            Ok(r#"{"text": "yarım kalan"#),
            Ok(r#"{"answer":"no text field"}"#),
            Ok(r#"{"text":"ok","action":{"type":"OPEN_MAP","marketId":"market_1"}}"#),
        ];

        for failure in failures {
            let expected_error = failure.clone().err();
            let client = ScriptedClient::answering(failure);
            let outcome =
                resolver(client.clone(), ReferencePolicy::Validate).resolve(&ChatRequest::new(message)).await;

            assert!(outcome.is_fallback(), "expected fallback for {expected_error:?}");
            assert_eq!(outcome.reply(), &matcher_reply(message));
            if let Some(error) = expected_error {
                assert_eq!(outcome.fallback_reason(), Some(&FallbackReason::Model(error)));
            } else {
                assert!(matches!(outcome.fallback_reason(), Some(FallbackReason::InvalidReply(_))));
            }
            assert_eq!(client.calls(), 1, "model must be attempted exactly once");
        }
    }

    #[tokio::test]
    async fn unknown_ids_are_rejected_when_validating() {
        let raw = r#"{"text":"Gel","action":{"type":"NAVIGATE","marketId":"market_99","productId":"p_tom"}}"#;

        let outcome = resolver(ScriptedClient::answering(Ok(raw)), ReferencePolicy::Validate)
            .resolve(&ChatRequest::new("Merhaba"))
            .await;

        assert_eq!(outcome.reply(), &matcher_reply("Merhaba"));
        assert_eq!(
            outcome.fallback_reason(),
            Some(&FallbackReason::InvalidReply(ReplyParseError::UnknownReference {
                market_id: "market_99".to_string(),
                product_id: Some("p_tom".to_string()),
            }))
        );
        assert_eq!(outcome.fallback_reason().map(FallbackReason::kind), Some("unknown_reference"));
    }

    #[tokio::test]
    async fn product_from_another_market_is_rejected_when_validating() {
        let raw = r#"{"text":"Gel","action":{"type":"NAVIGATE","marketId":"market_3","productId":"p_tom"}}"#;

        let outcome = resolver(ScriptedClient::answering(Ok(raw)), ReferencePolicy::Validate)
            .resolve(&ChatRequest::new("domates"))
            .await;

        assert!(outcome.is_fallback());
    }

    #[tokio::test]
    async fn unknown_ids_pass_through_when_trusting() {
        let raw = r#"{"text":"Gel","action":{"type":"NAVIGATE","marketId":"market_99"}}"#;

        let outcome = resolver(ScriptedClient::answering(Ok(raw)), ReferencePolicy::Trust)
            .resolve(&ChatRequest::new("Merhaba"))
            .await;

        assert_eq!(
            outcome,
            ResolutionOutcome::AiSucceeded(ChatReply::navigate("Gel", MarketId::from("market_99"), None))
        );
    }

    #[tokio::test]
    async fn cancellation_falls_back_like_a_timeout() {
        let client = ScriptedClient::slow();
        let outcome = resolver(client.clone(), ReferencePolicy::Validate)
            .resolve_until(&ChatRequest::new("Kadıköy açık mı?"), std::future::ready(()))
            .await;

        assert_eq!(outcome.reply(), &matcher_reply("Kadıköy açık mı?"));
        assert_eq!(outcome.fallback_reason(), Some(&FallbackReason::Model(LlmError::Cancelled)));
    }

    #[tokio::test]
    async fn cancellation_after_delay_interrupts_slow_model() {
        let client = ScriptedClient::slow();
        let started = tokio::time::Instant::now();
        let outcome = resolver(client, ReferencePolicy::Validate)
            .resolve_until(
                &ChatRequest::new("selam"),
                tokio::time::sleep(Duration::from_millis(50)),
            )
            .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(outcome.path(), "fallback");
    }

    #[tokio::test]
    async fn forced_fallback_is_idempotent() {
        let resolver = resolver(Arc::new(UnconfiguredClient), ReferencePolicy::Validate);
        let request = ChatRequest::new("Feriköy açık mı?");

        let first = resolver.resolve(&request).await;
        let second = resolver.resolve(&request).await;

        assert_eq!(first, second);
        assert_eq!(first.fallback_reason(), Some(&FallbackReason::Model(LlmError::Unconfigured)));
        assert_eq!(first.into_reply(), matcher_reply("Feriköy açık mı?"));
    }

    #[tokio::test]
    async fn empty_message_still_gets_a_reply() {
        let resolver = resolver(Arc::new(UnconfiguredClient), ReferencePolicy::Validate);
        let reply = resolver.reply(&ChatRequest::new("")).await;

        assert!(!reply.text.is_empty());
        assert!(reply.action.is_none());
    }

    #[test]
    fn reference_policy_follows_config_flag() {
        assert_eq!(ReferencePolicy::from_flag(true), ReferencePolicy::Validate);
        assert_eq!(ReferencePolicy::from_flag(false), ReferencePolicy::Trust);
        assert_eq!(ReferencePolicy::default(), ReferencePolicy::Validate);
    }
}
