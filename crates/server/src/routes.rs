use std::sync::Arc;

use axum::Router;
use pazar_agent::ResponseResolver;
use tower_http::cors::CorsLayer;

use crate::{chat, health};

/// Full HTTP surface: `POST /chat`, `GET /health`, open CORS for the browser client.
pub fn router(resolver: Arc<ResponseResolver>) -> Router {
    chat::router(resolver).merge(health::router()).layer(CorsLayer::permissive())
}
