//! Speed-weighted turn order.
mod deferred;
mod entry;
mod scheduler;

use crate::state::UnitId;

pub use deferred::DeferredTask;
pub use entry::{TurnEntry, compute_delta};
pub use scheduler::{RecalculationReport, SchedulerConfig, SchedulerPhase, TurnScheduler};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("turn queue is empty")]
    EmptyQueue,

    #[error("turn queue holds an entry for untracked unit {unit}")]
    UntrackedEntry { unit: UnitId },
}
