//! Clinix Rules: tabelas de regras carregadas na inicialização.
//!
//! Quatro tabelas, imutáveis depois do startup: classificação de funções,
//! mapeamento função→processador, regras de validação por função e o
//! registro de processadores. Hot-reload troca o snapshot inteiro de uma
//! vez, nunca muta entradas no lugar.

pub mod loader;
pub mod store;
pub mod tables;

pub use loader::{from_yaml, load};
pub use store::RuleStore;
pub use tables::{FunctionRoute, ProcessorConfig, RuleTables, ValidationRules};
