use std::sync::Arc;

use pazar_agent::{ReferencePolicy, ResponseResolver, UnconfiguredClient};
use pazar_core::config::{AppConfig, LoadOptions};
use pazar_core::domain::chat::{ChatReply, ChatRequest};
use pazar_core::knowledge::KnowledgeBase;
use serde::Serialize;

use crate::commands::{init_logging, CommandResult};

#[derive(Debug, Serialize)]
struct AskOutcome {
    command: &'static str,
    status: &'static str,
    path: &'static str,
    fallback_reason: Option<&'static str>,
    reply: ChatReply,
}

pub fn run(message: &str, offline: bool) -> CommandResult {
    let knowledge = Arc::new(KnowledgeBase::builtin());

    let resolver = if offline {
        init_logging(&AppConfig::default());
        ResponseResolver::new(Arc::new(UnconfiguredClient), knowledge, ReferencePolicy::Validate)
    } else {
        let config = match AppConfig::load(LoadOptions::default()) {
            Ok(config) => config,
            Err(error) => {
                return CommandResult::failure(
                    "ask",
                    "config_validation",
                    format!("configuration issue: {error}"),
                    2,
                );
            }
        };
        init_logging(&config);
        match ResponseResolver::from_config(&config.llm, knowledge) {
            Ok(resolver) => resolver,
            Err(error) => {
                return CommandResult::failure("ask", "model_client", error.to_string(), 3);
            }
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "ask",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                4,
            );
        }
    };

    let outcome = runtime.block_on(resolver.resolve(&ChatRequest::new(message)));
    let payload = AskOutcome {
        command: "ask",
        status: "ok",
        path: outcome.path(),
        fallback_reason: outcome.fallback_reason().map(|reason| reason.kind()),
        reply: outcome.into_reply(),
    };

    match serde_json::to_string(&payload) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("ask", "serialization", error.to_string(), 5),
    }
}
