//! Clinix Flow: os estágios do orquestrador e a fachada `Orchestrator`.
//!
//! # Pipeline Flow
//!
//! ```text
//! Call → Classify → Dispatch → Validate → Respond → Envelope
//!           ↓           ↓          ↓          ↓
//!        verdict    delegate   pass/fail  status+elapsed
//!           └───────────┴──────────┴──────────┘
//!                        Audit Trail
//! ```
//!
//! The dispatch stage only acts on `Complex` calls; the respond stage
//! always runs last and always produces a well-formed envelope.

pub mod classify;
pub mod dispatch;
pub mod orchestrator;
pub mod respond;
pub mod validate;

pub use classify::ClassifyStage;
pub use dispatch::DispatchStage;
pub use orchestrator::{CallRequest, Orchestrator};
pub use respond::RespondStage;
pub use validate::ValidateStage;
