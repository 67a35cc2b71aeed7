//! Asynchronous abstraction for deciding what the active unit does.
//!
//! Runtime users plug in [`ActionProvider`] implementations so a battle can
//! run with human input, scripted fixtures, or AI policies.
use std::sync::Arc;

use async_trait::async_trait;
use battle_core::{BattleMap, Position, UnitFacts};
use serde::{Deserialize, Serialize};

use super::errors::Result;
use crate::combat::{BattleUnit, Roster};

/// One step of a unit's turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnCommand {
    Move(Position),
    UseAbility { index: usize, targets: Vec<Position> },
}

/// Commands to run in order before the turn ends.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnPlan {
    pub commands: Vec<TurnCommand>,
}

impl TurnPlan {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn then(mut self, command: TurnCommand) -> Self {
        self.commands.push(command);
        self
    }

    pub fn is_idle(&self) -> bool {
        self.commands.is_empty()
    }
}

/// What the active unit can use right now.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbilityView {
    pub index: usize,
    pub name: String,
    pub mana_cost: f32,
    pub heavy: bool,
    pub affordable: bool,
    /// Positions the ability may target from the unit's current tile.
    pub targets: Vec<Position>,
}

/// Snapshot handed to a provider at the start of a turn.
///
/// `map` is a copy; providers may mutate it to try out moves.
#[derive(Clone, Debug)]
pub struct TurnView {
    pub unit: Arc<BattleUnit>,
    pub position: Position,
    pub turn: u32,
    pub map: BattleMap,
    pub roster: Roster,
    pub abilities: Vec<AbilityView>,
    pub can_move: bool,
    pub can_use_ability: bool,
}

impl TurnView {
    /// Positions of every living unit hostile to the active unit.
    pub fn enemy_positions(&self) -> Vec<Position> {
        self.roster
            .alive()
            .filter(|other| !other.is_ally(self.unit.as_ref()))
            .filter_map(|other| self.map.position_of(other.id()))
            .collect()
    }
}

/// Trait for deciding the active unit's turn.
///
/// Different implementations can handle:
/// - Player input (from UI/CLI)
/// - AI decisions
/// - Scripted fixtures
#[async_trait]
pub trait ActionProvider: Send + Sync {
    async fn plan_turn(&self, view: &TurnView) -> Result<TurnPlan>;
}

/// Provider that always passes the turn. Useful as a fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleProvider;

#[async_trait]
impl ActionProvider for IdleProvider {
    async fn plan_turn(&self, _view: &TurnView) -> Result<TurnPlan> {
        Ok(TurnPlan::idle())
    }
}
