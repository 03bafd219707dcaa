//! `POST /chat` - resolves one message into one reply.
//!
//! The handler never fails once the body has been accepted: model problems are
//! absorbed by the resolver. If the client disconnects, the handler future is
//! dropped, which drops the in-flight model request and its connection.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use pazar_agent::ResponseResolver;
use pazar_core::domain::chat::{ChatReply, ChatRequest};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct ChatState {
    resolver: Arc<ResponseResolver>,
}

pub fn router(resolver: Arc<ResponseResolver>) -> Router {
    Router::new().route("/chat", post(chat)).with_state(ChatState { resolver })
}

pub async fn chat(State(state): State<ChatState>, Json(request): Json<ChatRequest>) -> Json<ChatReply> {
    let correlation_id = Uuid::new_v4().to_string();
    let span = info_span!("chat_request", correlation_id = %correlation_id);

    async move {
        info!(
            event_name = "server.chat.received",
            message_chars = request.message.chars().count(),
            "chat message received"
        );

        let outcome = state.resolver.resolve(&request).await;

        info!(
            event_name = "server.chat.resolved",
            path = outcome.path(),
            has_action = outcome.reply().action.is_some(),
            "chat message resolved"
        );
        Json(outcome.into_reply())
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, Json};
    use pazar_agent::{ReferencePolicy, ResponseResolver, UnconfiguredClient};
    use pazar_core::domain::chat::ChatRequest;
    use pazar_core::domain::market::MarketId;
    use pazar_core::domain::product::ProductId;
    use pazar_core::knowledge::KnowledgeBase;

    use super::{chat, ChatState};

    fn fallback_state() -> State<ChatState> {
        State(ChatState {
            resolver: Arc::new(ResponseResolver::new(
                Arc::new(UnconfiguredClient),
                Arc::new(KnowledgeBase::builtin()),
                ReferencePolicy::Validate,
            )),
        })
    }

    #[tokio::test]
    async fn unconfigured_model_still_answers_product_questions() {
        let Json(reply) = chat(fallback_state(), Json(ChatRequest::new("Domates nerede?"))).await;

        let action = reply.action.expect("navigate action");
        assert_eq!(action.market_id, MarketId::from("market_1"));
        assert_eq!(action.product_id, Some(ProductId::from("p_tom")));
    }

    #[tokio::test]
    async fn empty_message_gets_default_reply() {
        let Json(reply) = chat(fallback_state(), Json(ChatRequest::new(""))).await;

        assert!(reply.text.starts_with("Bu konuda şu an bilgim yok"));
        assert!(reply.action.is_none());
    }
}
