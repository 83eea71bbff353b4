//! Clinix API /v1: REST endpoints
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use clinix_flow::Orchestrator;
use clinix_rules::RuleStore;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state injected into the request-handling path; built once at
/// startup, no hidden globals.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub rules: Arc<RuleStore>,
}

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/execute", post(handlers::execute))
        .route("/v1/registry/processors", get(handlers::list_processors))
        .route("/v1/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(addr: &str, state: Arc<AppState>) {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");

    tracing::info!("Clinix API listening on {}", addr);
    axum::serve(listener, app).await.expect("Server error");
}
