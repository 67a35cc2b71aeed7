//! Abilities and how they pick targets.

use std::fmt;

use battle_core::{BattleMap, MapQuery, Position, UnitFacts, UnitId};
use serde::{Deserialize, Serialize};

use super::{BattleUnit, DamageKind, Roster};
use crate::api::Result;

/// Outcome of an ability landing on one unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub target: UnitId,
    pub damage: f32,
    pub killed: bool,
}

/// Something a unit can do to other units on its turn.
pub trait Ability: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn mana_cost(&self) -> f32;

    /// A heavy ability uses up the unit's ability slot for the turn.
    fn is_heavy(&self) -> bool;

    /// Positions `unit` may target from where it stands. Only living units
    /// are ever offered.
    fn available_targets(
        &self,
        map: &mut BattleMap,
        roster: &Roster,
        unit: &BattleUnit,
    ) -> Result<Vec<Position>>;

    /// Applies the ability to whatever living unit stands on `targets`.
    fn apply_effects(
        &self,
        map: &BattleMap,
        roster: &Roster,
        attacker: &BattleUnit,
        targets: &[Position],
    ) -> Vec<Hit>;
}

/// Picks exactly one hostile unit within range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleTargetDelivery {
    pub range: u32,
    /// Whether walls and hostile units stop the ability's reach.
    pub considers_collision: bool,
}

impl SingleTargetDelivery {
    pub fn new(range: u32, considers_collision: bool) -> Self {
        Self {
            range: range.max(1),
            considers_collision,
        }
    }

    pub fn available_targets(
        &self,
        map: &mut BattleMap,
        roster: &Roster,
        unit: &BattleUnit,
    ) -> Result<Vec<Position>> {
        let mut targets = map.enemies_in_range(unit, self.range, self.considers_collision)?;
        targets.retain(|&position| {
            map.unit_at(position)
                .and_then(|id| roster.get(id))
                .is_some_and(|target| target.is_alive())
        });
        Ok(targets)
    }
}

impl Default for SingleTargetDelivery {
    fn default() -> Self {
        Self::new(1, false)
    }
}

/// Deals a multiple of the attacker's attack or magic stat.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamageAbility {
    name: String,
    mana_cost: f32,
    ratio: f32,
    uses_magic: bool,
    kind: DamageKind,
    heavy: bool,
    delivery: SingleTargetDelivery,
}

impl DamageAbility {
    pub const DEFAULT_RATIO: f32 = 1.2;
    pub const DEFAULT_MANA_COST: f32 = 5.0;

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mana_cost: Self::DEFAULT_MANA_COST,
            ratio: Self::DEFAULT_RATIO,
            uses_magic: false,
            kind: DamageKind::Physical,
            heavy: false,
            delivery: SingleTargetDelivery::default(),
        }
    }

    pub fn with_ratio(mut self, ratio: f32) -> Self {
        self.ratio = ratio.max(0.0);
        self
    }

    pub fn with_mana_cost(mut self, cost: f32) -> Self {
        self.mana_cost = cost.max(0.0);
        self
    }

    pub fn with_delivery(mut self, delivery: SingleTargetDelivery) -> Self {
        self.delivery = delivery;
        self
    }

    /// Scales off the magic stat and deals magic damage.
    pub fn magical(mut self) -> Self {
        self.uses_magic = true;
        self.kind = DamageKind::Magic;
        self
    }

    pub fn heavy(mut self) -> Self {
        self.heavy = true;
        self
    }

    pub fn delivery(&self) -> SingleTargetDelivery {
        self.delivery
    }

    pub fn raw_damage(&self, attacker: &BattleUnit) -> f32 {
        let stats = attacker.stats();
        let base = if self.uses_magic { stats.magic } else { stats.attack };
        base * self.ratio
    }
}

impl Ability for DamageAbility {
    fn name(&self) -> &str {
        &self.name
    }

    fn mana_cost(&self) -> f32 {
        self.mana_cost
    }

    fn is_heavy(&self) -> bool {
        self.heavy
    }

    fn available_targets(
        &self,
        map: &mut BattleMap,
        roster: &Roster,
        unit: &BattleUnit,
    ) -> Result<Vec<Position>> {
        self.delivery.available_targets(map, roster, unit)
    }

    fn apply_effects(
        &self,
        map: &BattleMap,
        roster: &Roster,
        attacker: &BattleUnit,
        targets: &[Position],
    ) -> Vec<Hit> {
        let damage = self.raw_damage(attacker);

        targets
            .iter()
            .filter_map(|&position| map.unit_at(position))
            .filter_map(|unit| roster.get(unit))
            .filter(|target| target.is_alive())
            .map(|target| {
                let taken = target.inflict_damage(damage, self.kind);
                Hit {
                    target: target.id(),
                    damage: taken,
                    killed: !target.is_alive(),
                }
            })
            .collect()
    }
}
