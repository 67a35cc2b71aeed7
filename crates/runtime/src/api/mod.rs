//! Public runtime API surface.
//!
//! Errors and the provider abstraction live here so the orchestrator, the
//! default AI and embedding binaries share one vocabulary.

pub mod errors;
pub mod providers;

pub use errors::{Result, RuntimeError};
pub use providers::{AbilityView, ActionProvider, IdleProvider, TurnCommand, TurnPlan, TurnView};
