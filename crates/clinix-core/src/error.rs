//! Unified Error Model
use thiserror::Error;

/// Errors raised outside a pipeline run (startup, configuration, transport).
#[derive(Error, Debug)]
pub enum ClinixError {
    #[error("CONFIG/{0}")]
    Config(String),

    #[error("REGISTRY/{0}")]
    Registry(String),

    #[error("SERIALIZE/{0}")]
    Serialize(String),
}

/// Failure modes of the dispatch stage. Every variant terminates the stage
/// and lands in `ExecutionContext::processor_error`; nothing here is ever
/// thrown past the pipeline boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("DISPATCH/NOT_CONFIGURED: processor '{0}' is not configured")]
    ProcessorNotConfigured(String),

    #[error("DISPATCH/DISABLED: processor '{0}' is disabled")]
    ProcessorDisabled(String),

    #[error("DISPATCH/TIMEOUT: processor '{name}' exceeded its {seconds}s budget")]
    Timeout { name: String, seconds: u64 },

    #[error("DISPATCH/INVOCATION: {0}")]
    InvocationFailed(String),
}

impl DispatchError {
    /// Only transient failures are eligible for retry. Configuration
    /// errors (missing or disabled processor) must never be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DispatchError::Timeout { .. } | DispatchError::InvocationFailed(_)
        )
    }
}
