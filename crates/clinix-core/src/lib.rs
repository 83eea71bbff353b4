//! Clinix Core: contexto de execução, trilha de auditoria, Stage trait e runner.
//!
//! O núcleo genérico do orquestrador de chamadas: um `ExecutionContext` por
//! chamada, estágios encadeados pelo `PipelineRunner`, e o envelope de
//! resposta canônico. Nenhum estágio lança erro para fora do pipeline;
//! falhas viram estado do contexto.

pub mod audit;
pub mod context;
pub mod delegate;
pub mod envelope;
pub mod error;
pub mod runner;
pub mod stage;

pub use audit::{AuditEntry, AuditTrail};
pub use context::{Classification, ExecutionContext};
pub use delegate::{Processor, ProcessorRegistry, ProcessorReply, ProcessorRequest};
pub use envelope::{ResponseEnvelope, ResponseStatus};
pub use error::{ClinixError, DispatchError};
pub use runner::PipelineRunner;
pub use stage::Stage;

/// Versão do motor Clinix
pub const CLINIX_VERSION: &str = "1.0.0";
