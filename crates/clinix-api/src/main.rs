//! Binary entrypoint for the Clinix API server.
use clinix_agents::{default_registry, MemoryRecordStore, TemplateModel};
use clinix_api::{run, AppState};
use clinix_flow::Orchestrator;
use clinix_rules::RuleStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let tables = match clinix_rules::load() {
        Ok(tables) => tables,
        Err(err) => {
            tracing::error!(%err, "failed to load rule tables");
            std::process::exit(1);
        }
    };
    let rules = Arc::new(RuleStore::new(tables));

    // stock collaborators until the persistence and model integrations
    // are plugged in
    let registry = default_registry(Arc::new(MemoryRecordStore::new()), Arc::new(TemplateModel));
    let state = Arc::new(AppState {
        orchestrator: Orchestrator::new(rules.clone(), Arc::new(registry)),
        rules,
    });

    // Default listen address can be overridden with CLINIX_ADDR
    let addr = std::env::var("CLINIX_ADDR").unwrap_or_else(|_| "0.0.0.0:8787".to_string());
    run(&addr, state).await;
}
