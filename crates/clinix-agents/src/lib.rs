//! Clinix Agents: os sub-processadores delegados e suas costuras externas.
//!
//! Cada delegado implementa `Processor` e é registrado por nome no
//! `ProcessorRegistry` durante a inicialização. O gerador de resumos é
//! construído com o mesmo formato de pipeline por estágios do
//! orquestrador; persistência e modelo de linguagem são colaboradores
//! externos atrás de traits.

pub mod collaborators;
pub mod conversation;
pub mod report;
pub mod summary;

pub use collaborators::{LanguageModel, MemoryRecordStore, RecordStore, TemplateModel};
pub use conversation::ConversationProcessor;
pub use report::ReportProcessor;
pub use summary::SummaryProcessor;

use clinix_core::ProcessorRegistry;
use std::sync::Arc;

/// Registry with the three stock delegates wired to the given
/// collaborators. Called once at process startup.
pub fn default_registry(
    store: Arc<dyn RecordStore>,
    model: Arc<dyn LanguageModel>,
) -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    registry.register(Arc::new(SummaryProcessor::new(store.clone(), model.clone())));
    registry.register(Arc::new(ReportProcessor::new(store)));
    registry.register(Arc::new(ConversationProcessor::new(model)));
    registry
}
