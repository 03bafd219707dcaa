use std::sync::Arc;

use pazar_agent::{LlmError, ResponseResolver};
use pazar_core::config::AppConfig;
use pazar_core::knowledge::KnowledgeBase;
use thiserror::Error;
use tracing::{info, warn};

pub struct Application {
    pub config: AppConfig,
    pub resolver: Arc<ResponseResolver>,
    pub ai_configured: bool,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("model client construction failed: {0}")]
    ModelClient(#[source] LlmError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let knowledge = Arc::new(KnowledgeBase::builtin());
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        markets = knowledge.markets().len(),
        products = knowledge.products().len(),
        "knowledge base loaded"
    );

    let ai_configured = config.llm.credential().is_configured();
    if ai_configured {
        info!(
            event_name = "system.bootstrap.llm_configured",
            correlation_id = "bootstrap",
            model = %config.llm.model,
            timeout_secs = config.llm.timeout_secs,
            validate_references = config.llm.validate_references,
            "model path enabled"
        );
    } else {
        warn!(
            event_name = "system.bootstrap.llm_unconfigured",
            correlation_id = "bootstrap",
            "PAZAR_LLM_API_KEY / GEMINI_API_KEY is not set; every chat reply will come from the keyword matcher"
        );
    }

    let resolver = ResponseResolver::from_config(&config.llm, knowledge)
        .map_err(BootstrapError::ModelClient)?;

    Ok(Application { config, resolver: Arc::new(resolver), ai_configured })
}
