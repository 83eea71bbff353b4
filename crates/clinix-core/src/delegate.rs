//! Delegate contract: o que o núcleo consome de um sub-processador.
//!
//! Dynamic entry-point lookup is replaced by an explicit registry of
//! implementations keyed by name, populated once at startup.

use crate::audit::AuditEntry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Request handed to a sub-processor, assembled by the dispatch stage
/// from the execution context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorRequest {
    pub function_name: String,
    pub arguments: HashMap<String, Value>,
    pub subject_id: String,
    pub secondary_id: Option<String>,
    pub actor_id: String,
    /// Accumulated run context (classification, score, run id).
    pub context: Value,
}

/// What a sub-processor returns on success. `audit` carries the delegate's
/// internal stage entries so the orchestrator's trail covers the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorReply {
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audit: Vec<AuditEntry>,
}

/// A specialized handler for complex function calls. Implementations are
/// expected to be built from the same stage-pipeline shape as the
/// orchestrator itself.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Registry key; must match the name used in the processor table.
    fn name(&self) -> &'static str;

    async fn handle(&self, request: ProcessorRequest) -> anyhow::Result<ProcessorReply>;
}

/// Startup-time registry of processor implementations.
#[derive(Default)]
pub struct ProcessorRegistry {
    entries: HashMap<String, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, processor: Arc<dyn Processor>) {
        self.entries.insert(processor.name().to_string(), processor);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Processor>> {
        self.entries.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
