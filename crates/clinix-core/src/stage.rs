//! Stage Trait: contrato único para todos os estágios
//!
//! The same shape is used by the orchestrator (over `ExecutionContext`)
//! and inside each delegate (over its own context type). A stage receives
//! the context by value and returns it; it never fails. Errors become
//! context state, and later stages check the upstream flags instead of
//! the pipeline returning early.

use async_trait::async_trait;

#[async_trait]
pub trait Stage<C: Send + 'static>: Send + Sync {
    /// Stage name, also used for audit entries.
    fn name(&self) -> &'static str;

    /// Run the stage. Infallible by contract: a stage that hits a problem
    /// records it in the context and passes it along.
    async fn run(&self, ctx: C) -> C;
}
