//! Concrete battle participants.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use battle_core::{TeamId, UnitFacts, UnitId, UnitSignals};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Ability;
use crate::api::{Result, RuntimeError};

/// Highest defense the reduction curve is tuned for.
const MAX_DEFENSE: f32 = 75.0;
/// Fraction of damage absorbed at [`MAX_DEFENSE`].
const MAX_DAMAGE_REDUCTION: f32 = 0.25;
/// `damage_taken = damage * C / (C + defense)`.
pub const DEFENSE_CONSTANT: f32 = (MAX_DEFENSE * MAX_DAMAGE_REDUCTION) / (1.0 - MAX_DAMAGE_REDUCTION);

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum DamageKind {
    Physical,
    Magic,
}

/// Base stat block of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    pub attack: f32,
    pub magic: f32,
    pub defense: f32,
    pub magic_defense: f32,
    pub speed: f32,
    /// Movement points per turn. Each entered tile spends its movement cost.
    pub movement: u32,
    pub max_health: f32,
    pub max_mana: f32,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            attack: 0.0,
            magic: 0.0,
            defense: 0.0,
            magic_defense: 0.0,
            speed: 0.0,
            movement: 0,
            max_health: 10.0,
            max_mana: 10.0,
        }
    }
}

impl UnitStats {
    /// Damage actually taken from a raw `damage` hit.
    pub fn mitigate(&self, damage: f32, kind: DamageKind) -> f32 {
        let defense = match kind {
            DamageKind::Physical => self.defense,
            DamageKind::Magic => self.magic_defense,
        };
        damage.max(0.0) * DEFENSE_CONSTANT / (DEFENSE_CONSTANT + defense.max(0.0))
    }
}

#[derive(Debug)]
struct Vitals {
    stats: UnitStats,
    health: f32,
    mana: f32,
    movement_reduction: u32,
}

/// A unit taking part in a battle.
///
/// Mutable stats sit behind a mutex so the unit can be shared with the
/// scheduler through [`battle_core::UnitRef`]. Signals are always emitted after that lock
/// is released, so subscribers may read the unit again.
pub struct BattleUnit {
    id: UnitId,
    name: String,
    team: TeamId,
    vitals: Mutex<Vitals>,
    abilities: Vec<Arc<dyn Ability>>,
    signals: UnitSignals,
}

impl BattleUnit {
    pub fn new(id: UnitId, name: impl Into<String>, team: TeamId, stats: UnitStats) -> Self {
        Self {
            id,
            name: name.into(),
            team,
            vitals: Mutex::new(Vitals {
                stats,
                health: stats.max_health,
                mana: stats.max_mana,
                movement_reduction: 0,
            }),
            abilities: Vec::new(),
            signals: UnitSignals::new(),
        }
    }

    pub fn with_ability(mut self, ability: impl Ability + 'static) -> Self {
        self.abilities.push(Arc::new(ability));
        self
    }

    fn vitals(&self) -> MutexGuard<'_, Vitals> {
        self.vitals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stats(&self) -> UnitStats {
        self.vitals().stats
    }

    pub fn health(&self) -> f32 {
        self.vitals().health
    }

    pub fn mana(&self) -> f32 {
        self.vitals().mana
    }

    pub fn abilities(&self) -> &[Arc<dyn Ability>] {
        &self.abilities
    }

    pub fn ability(&self, index: usize) -> Result<&Arc<dyn Ability>> {
        self.abilities
            .get(index)
            .ok_or(RuntimeError::UnknownAbility {
                unit: self.id,
                index,
            })
    }

    /// Movement points left after reductions, never below zero.
    pub fn current_movement(&self) -> u32 {
        let vitals = self.vitals();
        vitals.stats.movement.saturating_sub(vitals.movement_reduction)
    }

    pub fn set_movement_reduction(&self, reduction: u32) {
        self.vitals().movement_reduction = reduction;
    }

    pub fn can_pay(&self, cost: f32) -> bool {
        self.vitals().mana >= cost.max(0.0)
    }

    pub fn pay_mana(&self, cost: f32) -> Result<()> {
        let mut vitals = self.vitals();
        let cost = cost.max(0.0);
        if vitals.mana < cost {
            return Err(RuntimeError::InsufficientMana {
                unit: self.id,
                required: cost,
                available: vitals.mana,
            });
        }
        vitals.mana -= cost;
        Ok(())
    }

    /// Applies a hit after defense mitigation and returns the damage taken.
    ///
    /// The death signal fires the first time health drops to zero.
    pub fn inflict_damage(&self, damage: f32, kind: DamageKind) -> f32 {
        let (taken, died) = {
            let mut vitals = self.vitals();
            if vitals.health <= 0.0 {
                return 0.0;
            }
            let taken = vitals.stats.mitigate(damage, kind);
            vitals.health = (vitals.health - taken).max(0.0);
            (taken, vitals.health <= 0.0)
        };

        debug!(unit = %self.id, taken, died, "damage inflicted");
        if died {
            self.signals.notify_death(self.id);
        }
        taken
    }

    /// Replaces the speed stat and notifies subscribers.
    pub fn set_speed(&self, speed: f32) {
        {
            let mut vitals = self.vitals();
            let speed = speed.max(0.0);
            if vitals.stats.speed == speed {
                return;
            }
            vitals.stats.speed = speed;
        }
        self.signals.notify_speed_changed(self.id);
    }
}

impl UnitFacts for BattleUnit {
    fn id(&self) -> UnitId {
        self.id
    }

    fn team(&self) -> TeamId {
        self.team
    }

    fn speed(&self) -> f32 {
        self.vitals().stats.speed
    }

    fn is_alive(&self) -> bool {
        self.vitals().health > 0.0
    }

    fn signals(&self) -> &UnitSignals {
        &self.signals
    }
}

impl fmt::Debug for BattleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vitals = self.vitals();
        f.debug_struct("BattleUnit")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("team", &self.team)
            .field("health", &vitals.health)
            .field("mana", &vitals.mana)
            .field("speed", &vitals.stats.speed)
            .field("abilities", &self.abilities.len())
            .finish()
    }
}

/// Every unit registered for the current battle, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct Roster {
    units: BTreeMap<UnitId, Arc<BattleUnit>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, unit: Arc<BattleUnit>) -> Option<Arc<BattleUnit>> {
        self.units.insert(unit.id(), unit)
    }

    pub fn get(&self, unit: UnitId) -> Option<&Arc<BattleUnit>> {
        self.units.get(&unit)
    }

    pub fn require(&self, unit: UnitId) -> Result<&Arc<BattleUnit>> {
        self.get(unit).ok_or(RuntimeError::UnknownUnit { unit })
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<BattleUnit>> + '_ {
        self.units.values()
    }

    pub fn alive(&self) -> impl Iterator<Item = &Arc<BattleUnit>> + '_ {
        self.iter().filter(|unit| unit.is_alive())
    }

    pub fn clear(&mut self) {
        self.units.clear();
    }
}
