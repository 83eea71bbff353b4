//! Orchestrator: a fachada que executa uma chamada ponta a ponta.
//!
//! Construída explicitamente no startup e injetada no caminho de
//! atendimento; nenhum singleton, nenhuma inicialização escondida.

use crate::{ClassifyStage, DispatchStage, RespondStage, ValidateStage};
use clinix_core::{
    ExecutionContext, PipelineRunner, ProcessorRegistry, ResponseEnvelope, Stage,
};
use clinix_rules::RuleStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// The inbound call contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    pub function_name: String,
    #[serde(default)]
    pub arguments: HashMap<String, Value>,
    pub subject_id: String,
    pub actor_id: String,
    #[serde(default)]
    pub secondary_id: Option<String>,
}

pub struct Orchestrator {
    runner: PipelineRunner<ExecutionContext>,
}

impl Orchestrator {
    pub fn new(rules: Arc<RuleStore>, processors: Arc<ProcessorRegistry>) -> Self {
        let stages: Vec<Box<dyn Stage<ExecutionContext>>> = vec![
            Box::new(ClassifyStage::new(rules.clone())),
            Box::new(DispatchStage::new(rules.clone(), processors)),
            Box::new(ValidateStage::new(rules)),
            Box::new(RespondStage),
        ];
        Self {
            runner: PipelineRunner::new(stages),
        }
    }

    /// Run one call through classify → dispatch → validate → respond.
    /// Always returns an envelope; there is no failure path out of here.
    pub async fn execute(&self, call: CallRequest) -> ResponseEnvelope {
        let ctx = ExecutionContext::new(
            call.function_name,
            call.arguments,
            call.subject_id,
            call.actor_id,
            call.secondary_id,
        );
        tracing::debug!(run_id = %ctx.run_id, pipeline = self.runner.pipeline_id(), "run started");
        let ctx = self.runner.run(ctx).await;
        ResponseEnvelope::from_context(ctx)
    }

    pub fn pipeline_id(&self) -> &str {
        self.runner.pipeline_id()
    }
}
