//! External collaborator seams: persistência e modelo de linguagem.
//!
//! The real implementations live outside this system; the in-memory
//! store and the deterministic template model ship for tests and local
//! runs.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// Read-only view over the clinic's record storage.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn patient(&self, patient_id: &str) -> anyhow::Result<Option<Value>>;
    async fn appointments(&self, patient_id: &str) -> anyhow::Result<Vec<Value>>;
}

/// The content-producing collaborator (an LLM in production).
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// In-memory record store.
#[derive(Default)]
pub struct MemoryRecordStore {
    patients: HashMap<String, Value>,
    appointments: HashMap<String, Vec<Value>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patient(mut self, patient_id: impl Into<String>, record: Value) -> Self {
        self.patients.insert(patient_id.into(), record);
        self
    }

    pub fn with_appointment(mut self, patient_id: impl Into<String>, record: Value) -> Self {
        self.appointments
            .entry(patient_id.into())
            .or_default()
            .push(record);
        self
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn patient(&self, patient_id: &str) -> anyhow::Result<Option<Value>> {
        Ok(self.patients.get(patient_id).cloned())
    }

    async fn appointments(&self, patient_id: &str) -> anyhow::Result<Vec<Value>> {
        Ok(self
            .appointments
            .get(patient_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Deterministic stand-in for the language model: renders a fixed
/// template around the prompt material.
pub struct TemplateModel;

#[async_trait]
impl LanguageModel for TemplateModel {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(format!(
            "Resumo clínico gerado automaticamente.\n\n{}\n\nRevisão humana recomendada antes do uso.",
            prompt
        ))
    }
}
