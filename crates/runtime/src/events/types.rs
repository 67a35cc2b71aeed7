//! Event types for different topics.

use battle_core::{Position, TeamId, UnitId};
use serde::{Deserialize, Serialize};

use crate::combat::Hit;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum BattleOutcome {
    /// Every hostile unit is down.
    Victory,
    /// Every player unit is down.
    Defeat,
}

/// Battle lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BattleEvent {
    Started {
        units: usize,
    },

    UnitDied {
        unit: UnitId,
        team: TeamId,
        position: Option<Position>,
    },

    Finished {
        outcome: BattleOutcome,
        turns: u32,
    },
}

/// Turn sequencing and per-turn actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TurnEvent {
    Started {
        unit: UnitId,
        turn: u32,
    },

    UnitMoved {
        unit: UnitId,
        from: Position,
        to: Position,
        cost: u32,
    },

    AbilityUsed {
        unit: UnitId,
        ability: String,
        hits: Vec<Hit>,
    },

    Ended {
        unit: UnitId,
        turn: u32,
    },

    /// A deferred recomputation pass reordered the queue.
    QueueRecalculated {
        pass: u64,
        entries: usize,
    },
}
