//! Unit facts consumed by the pathfinder and the turn scheduler.
//!
//! The core never owns units. It reads a handful of facts through
//! [`UnitFacts`] and listens to the notifications each unit publishes through
//! its [`UnitSignals`].
mod signal;

use std::fmt;
use std::sync::Arc;

use crate::state::{TeamId, UnitId};

pub use signal::{Signal, SignalCallback, SubscriptionId, UnitSignals};

/// Read-only view of a unit as seen by the simulation core.
pub trait UnitFacts: Send + Sync + fmt::Debug {
    fn id(&self) -> UnitId;

    fn team(&self) -> TeamId;

    /// Current speed stat, never negative.
    fn speed(&self) -> f32;

    fn is_alive(&self) -> bool;

    fn signals(&self) -> &UnitSignals;

    fn is_ally(&self, other: &dyn UnitFacts) -> bool {
        self.team() == other.team()
    }
}

/// Shared handle to a unit owned elsewhere.
pub type UnitRef = Arc<dyn UnitFacts>;
