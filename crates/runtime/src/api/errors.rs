//! Unified error types surfaced by the battle runtime.
//!
//! Wraps map, pathfinding and scheduler failures from `battle-core` together
//! with the runtime's own rejections so callers can bubble them up with `?`.
use battle_core::{MapError, NavError, Position, TurnError, UnitId};
use thiserror::Error;

use crate::events::BattleOutcome;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("battle runtime requires a map before building")]
    MissingMap,

    #[error("battle has not been started")]
    NotStarted,

    #[error("battle is already running")]
    AlreadyStarted,

    #[error("battle already finished with {outcome}")]
    Finished { outcome: BattleOutcome },

    #[error("cannot start a battle without units")]
    EmptyRoster,

    #[error("no unit is acting right now")]
    NoActiveUnit,

    #[error("unit {unit} is not part of this battle")]
    UnknownUnit { unit: UnitId },

    #[error("unit {unit} cannot {action} again this turn")]
    ActionNotAllowed { unit: UnitId, action: &'static str },

    #[error("unit {unit} has no ability at slot {index}")]
    UnknownAbility { unit: UnitId, index: usize },

    #[error("unit {unit} needs {required} mana but has {available}")]
    InsufficientMana {
        unit: UnitId,
        required: f32,
        available: f32,
    },

    #[error("{position} is not a valid target")]
    InvalidTarget { position: Position },

    #[error("unit {unit} can move {movement} but the path costs {cost}")]
    OutOfMovementRange { unit: UnitId, cost: u32, movement: u32 },

    #[error("battle did not finish within {ticks} ticks")]
    TickBudgetExhausted { ticks: u64 },

    #[error("action provider failed: {reason}")]
    Provider { reason: String },

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Turn(#[from] TurnError),
}

impl From<NavError> for RuntimeError {
    fn from(err: NavError) -> Self {
        Self::Map(MapError::from(err))
    }
}
