//! Response Envelope: a forma canônica devolvida ao chamador.

use crate::audit::AuditEntry;
use crate::context::ExecutionContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
    /// Declared in the wire contract; the builder's precedence rules do
    /// not currently produce it.
    Partial,
}

/// Every run, failed or not, yields exactly this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub data: Value,
    pub message: String,
    pub status: ResponseStatus,
    pub elapsed_ms: u64,
    pub trace: Vec<String>,
    pub audit_log: Vec<AuditEntry>,
}

impl ResponseEnvelope {
    /// Lift the response fields out of a finished context. The respond
    /// stage always runs last, so the fields are set; the fallbacks only
    /// guard against a malformed pipeline and still produce a well-formed
    /// error envelope instead of panicking.
    pub fn from_context(ctx: ExecutionContext) -> Self {
        Self {
            data: ctx.response_data.unwrap_or(Value::Null),
            message: ctx
                .response_message
                .unwrap_or_else(|| "resposta indisponível".to_string()),
            status: ctx.response_status.unwrap_or(ResponseStatus::Error),
            elapsed_ms: ctx.elapsed_ms.unwrap_or(0),
            trace: ctx.trace,
            audit_log: ctx.audit.into_entries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_status_wire_values_are_lowercase() {
        assert_eq!(
            serde_json::to_string(&ResponseStatus::Success).unwrap(),
            "\"success\""
        );
        assert_eq!(
            serde_json::to_string(&ResponseStatus::Error).unwrap(),
            "\"error\""
        );
        assert_eq!(
            serde_json::to_string(&ResponseStatus::Partial).unwrap(),
            "\"partial\""
        );
    }

    #[test]
    fn test_unfinished_context_degrades_to_error_envelope() {
        let ctx = ExecutionContext::new("x", HashMap::new(), "s", "a", None);
        let envelope = ResponseEnvelope::from_context(ctx);
        assert_eq!(envelope.status, ResponseStatus::Error);
        assert_eq!(envelope.data, Value::Null);
        assert!(!envelope.message.is_empty());
    }
}
