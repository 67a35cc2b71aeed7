//! Per-turn action budget and turn-end sequencing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use battle_core::{
    BattleConfig, BattleMap, DeferredTask, MapQuery, Path, Position, SubscriptionId, UnitFacts,
    UnitId,
};
use tracing::{debug, warn};

use crate::api::{Result, RuntimeError};
use crate::combat::{BattleUnit, Hit, Roster};

/// Subscription on the active unit's death signal, dropped when the turn ends.
struct ActiveTurn {
    unit: Arc<BattleUnit>,
    death_subscription: SubscriptionId,
    died: Arc<AtomicBool>,
}

impl ActiveTurn {
    fn release(&self) {
        self.unit
            .signals()
            .death
            .unsubscribe(self.death_subscription);
    }
}

/// Enforces what the active unit may still do this turn.
///
/// A unit gets at most `max_actions_per_turn` actions, of which at most one
/// may be a move and at most one a heavy ability. Ending a turn starts a
/// countdown of `turn_end_delay_ticks`; the turn is over once [`TurnExecutor::tick`]
/// reports it. The active unit dying ends its turn the same way.
pub struct TurnExecutor {
    max_actions: u32,
    turn_end_delay: u32,
    active: Option<ActiveTurn>,
    actions_executed: u32,
    heavy_executed: bool,
    moved: bool,
    end_sequence: Option<DeferredTask>,
}

impl TurnExecutor {
    pub fn new(config: &BattleConfig) -> Self {
        Self {
            max_actions: config.max_actions_per_turn,
            turn_end_delay: config.turn_end_delay_ticks,
            active: None,
            actions_executed: 0,
            heavy_executed: false,
            moved: false,
            end_sequence: None,
        }
    }

    pub fn start_turn(&mut self, unit: &Arc<BattleUnit>) {
        self.abort();

        let died = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&died);
        let death_subscription = unit.signals().death.subscribe(move |_| {
            flag.store(true, Ordering::SeqCst);
        });

        self.active = Some(ActiveTurn {
            unit: Arc::clone(unit),
            death_subscription,
            died,
        });
        self.actions_executed = 0;
        self.heavy_executed = false;
        self.moved = false;
        debug!(unit = %unit.id(), "turn started");
    }

    pub fn active_unit(&self) -> Option<&Arc<BattleUnit>> {
        self.active.as_ref().map(|turn| &turn.unit)
    }

    pub fn actions_executed(&self) -> u32 {
        self.actions_executed
    }

    pub fn is_ending(&self) -> bool {
        self.end_sequence.is_some()
    }

    pub fn can_execute_ability(&self) -> bool {
        self.active.is_some()
            && !self.is_ending()
            && !self.heavy_executed
            && self.actions_executed < self.max_actions
    }

    pub fn can_move(&self) -> bool {
        self.active.is_some()
            && !self.is_ending()
            && !self.moved
            && self.actions_executed < self.max_actions
    }

    fn require_active(&self) -> Result<Arc<BattleUnit>> {
        self.active
            .as_ref()
            .map(|turn| Arc::clone(&turn.unit))
            .ok_or(RuntimeError::NoActiveUnit)
    }

    /// Walks the active unit to `destination` within its movement points.
    pub fn execute_move(&mut self, map: &mut BattleMap, destination: Position) -> Result<Path> {
        let unit = self.require_active()?;
        if !self.can_move() {
            return Err(RuntimeError::ActionNotAllowed {
                unit: unit.id(),
                action: "move",
            });
        }

        let origin = map
            .position_of(unit.id())
            .ok_or(RuntimeError::UnknownUnit { unit: unit.id() })?;
        let movement = unit.current_movement();
        if let Some(path) = map.shortest_path(origin, destination, unit.as_ref())?
            && path.cost > movement
        {
            return Err(RuntimeError::OutOfMovementRange {
                unit: unit.id(),
                cost: path.cost,
                movement,
            });
        }

        let path = map.move_unit(unit.as_ref(), destination)?;
        self.moved = true;
        self.actions_executed += 1;
        Ok(path)
    }

    /// Uses ability `index` of the active unit on `targets`.
    ///
    /// Every target must be one the ability offers from the unit's current
    /// position. Mana is paid before the effects apply.
    pub fn execute_ability(
        &mut self,
        map: &mut BattleMap,
        roster: &Roster,
        index: usize,
        targets: &[Position],
    ) -> Result<Vec<Hit>> {
        let unit = self.require_active()?;
        if !self.can_execute_ability() {
            return Err(RuntimeError::ActionNotAllowed {
                unit: unit.id(),
                action: "use an ability",
            });
        }

        let ability = Arc::clone(unit.ability(index)?);
        let available = ability.available_targets(map, roster, &unit)?;
        if let Some(&position) = targets.iter().find(|target| !available.contains(target)) {
            return Err(RuntimeError::InvalidTarget { position });
        }

        unit.pay_mana(ability.mana_cost())?;
        let hits = ability.apply_effects(map, roster, &unit, targets);

        self.actions_executed += 1;
        self.heavy_executed |= ability.is_heavy();
        debug!(
            unit = %unit.id(),
            ability = ability.name(),
            hits = hits.len(),
            "ability executed"
        );
        Ok(hits)
    }

    /// Starts the turn-end countdown. Repeated calls are absorbed.
    pub fn end_turn(&mut self) -> bool {
        if self.active.is_none() || self.end_sequence.is_some() {
            return false;
        }
        self.end_sequence = Some(DeferredTask::after(self.turn_end_delay));
        true
    }

    /// Advances the turn-end countdown. Returns the unit whose turn just
    /// finished, once.
    pub fn tick(&mut self) -> Option<UnitId> {
        let died = self
            .active
            .as_ref()
            .is_some_and(|turn| turn.died.load(Ordering::SeqCst));
        if died && self.end_sequence.is_none() {
            warn!("active unit died during its turn");
            self.end_turn();
        }

        let finished = self.end_sequence.as_mut().is_some_and(DeferredTask::tick);
        if !finished {
            return None;
        }

        self.end_sequence = None;
        let turn = self.active.take()?;
        turn.release();
        debug!(unit = %turn.unit.id(), "turn finished");
        Some(turn.unit.id())
    }

    /// Drops the current turn without waiting for the countdown.
    pub fn abort(&mut self) {
        if let Some(turn) = self.active.take() {
            turn.release();
        }
        self.end_sequence = None;
    }
}

impl std::fmt::Debug for TurnExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnExecutor")
            .field("active", &self.active.as_ref().map(|turn| turn.unit.id()))
            .field("actions_executed", &self.actions_executed)
            .field("heavy_executed", &self.heavy_executed)
            .field("moved", &self.moved)
            .field("end_sequence", &self.end_sequence)
            .finish()
    }
}
