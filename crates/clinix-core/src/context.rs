//! Execution Context: estado de uma chamada atravessando o pipeline.
//!
//! Um contexto por chamada, criado na entrada, descartado depois do
//! envelope; nunca compartilhado entre chamadas.

use crate::audit::AuditTrail;
use crate::envelope::ResponseStatus;
use crate::error::DispatchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Verdict of the classifier. `Unknown` is a named permissive default:
/// operationally it follows the simple path, but it is logged and
/// audit-recorded as its own outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Simple,
    Complex,
    Unknown,
}

impl Classification {
    /// Whether this verdict routes the call to a sub-processor.
    pub fn delegates(&self) -> bool {
        matches!(self, Classification::Complex)
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub run_id: String,
    pub function_name: String,
    pub arguments: HashMap<String, Value>,
    pub subject_id: String,
    pub secondary_id: Option<String>,
    pub actor_id: String,

    // classify
    pub classification: Option<Classification>,
    pub complexity_score: f64,
    pub target_processor: Option<String>,

    // dispatch: `processor_response` and `processor_error` are mutually
    // exclusive; use the record_dispatch_* methods.
    pub processor_request: Option<Value>,
    pub processor_response: Option<Value>,
    pub processor_error: Option<DispatchError>,

    // validate: `validation_passed` stays None until the validator runs
    pub validation_passed: Option<bool>,
    pub validation_errors: Vec<String>,

    // respond
    pub response_status: Option<ResponseStatus>,
    pub response_data: Option<Value>,
    pub response_message: Option<String>,

    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub elapsed_ms: Option<u64>,

    pub audit: AuditTrail,
    /// Human-readable progress lines, informational only.
    pub trace: Vec<String>,
}

impl ExecutionContext {
    pub fn new(
        function_name: impl Into<String>,
        arguments: HashMap<String, Value>,
        subject_id: impl Into<String>,
        actor_id: impl Into<String>,
        secondary_id: Option<String>,
    ) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            function_name: function_name.into(),
            arguments,
            subject_id: subject_id.into(),
            secondary_id,
            actor_id: actor_id.into(),
            classification: None,
            complexity_score: 0.0,
            target_processor: None,
            processor_request: None,
            processor_response: None,
            processor_error: None,
            validation_passed: None,
            validation_errors: Vec::new(),
            response_status: None,
            response_data: None,
            response_message: None,
            created_at: Utc::now(),
            completed_at: None,
            elapsed_ms: None,
            audit: AuditTrail::new(),
            trace: Vec::new(),
        }
    }

    pub fn push_trace(&mut self, line: impl Into<String>) {
        self.trace.push(line.into());
    }

    /// Store a successful delegate output. The exclusivity with
    /// `processor_error` is an invariant of the context.
    pub fn record_dispatch_success(&mut self, response: Value) {
        debug_assert!(self.processor_error.is_none());
        self.processor_response = Some(response);
    }

    /// Store a normalized dispatch failure. Downstream stages keep running
    /// but must check this flag and avoid doing further work.
    pub fn record_dispatch_failure(&mut self, error: DispatchError) {
        debug_assert!(self.processor_response.is_none());
        self.processor_error = Some(error);
    }

    /// Whether anything upstream already failed this run.
    pub fn has_failed(&self) -> bool {
        self.processor_error.is_some() || self.validation_passed == Some(false)
    }
}
