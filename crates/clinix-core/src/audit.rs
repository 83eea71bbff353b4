//! Audit trail: append-only record of every stage outcome in a run.
//!
//! Consumed by an external compliance collaborator; the core never
//! truncates or reorders it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One audit record. `stage` and `timestamp` are always present; every
/// other field is stage-specific and carried in `details`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub stage: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub details: serde_json::Map<String, Value>,
}

impl AuditEntry {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            timestamp: Utc::now(),
            details: serde_json::Map::new(),
        }
    }

    /// Attach a stage-specific field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Append-only collection of audit entries. Entries are never mutated or
/// removed after being appended.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
    }

    /// Absorb another trail in order (used when a delegate reports its
    /// internal stage entries back to the orchestrator).
    pub fn extend(&mut self, entries: Vec<AuditEntry>) {
        self.entries.extend(entries);
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries recorded by a given stage, in execution order.
    pub fn for_stage(&self, stage: &str) -> Vec<&AuditEntry> {
        self.entries.iter().filter(|e| e.stage == stage).collect()
    }

    pub fn into_entries(self) -> Vec<AuditEntry> {
        self.entries
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.entries)
    }
}
