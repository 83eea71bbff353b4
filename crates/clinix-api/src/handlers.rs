//! API Handlers
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use clinix_core::{ResponseEnvelope, CLINIX_VERSION};
use clinix_flow::CallRequest;
use serde_json::{json, Value};
use std::sync::Arc;

pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(call): Json<CallRequest>,
) -> Json<ResponseEnvelope> {
    Json(state.orchestrator.execute(call).await)
}

pub async fn list_processors(State(state): State<Arc<AppState>>) -> Json<Value> {
    let tables = state.rules.snapshot();
    let mut processors: Vec<Value> = tables
        .processors
        .iter()
        .map(|(name, config)| {
            json!({
                "name": name,
                "display_name": config.display_name,
                "enabled": config.enabled,
                "timeout_seconds": config.timeout_seconds,
                "max_retries": config.max_retries,
            })
        })
        .collect();
    processors.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));
    Json(json!({ "processors": processors }))
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": CLINIX_VERSION })),
    )
}
