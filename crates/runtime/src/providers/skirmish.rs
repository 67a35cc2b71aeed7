//! Default AI: close in on the nearest enemy, then hit the weakest target.

use async_trait::async_trait;
use battle_core::{BattleMap, MapQuery, Position, UnitFacts};
use tracing::{debug, trace};

use crate::api::{ActionProvider, Result, TurnCommand, TurnPlan, TurnView};
use crate::combat::{BattleUnit, Roster};

/// Greedy melee policy.
///
/// If an affordable ability already has a target, it attacks without moving.
/// Otherwise it walks to the reachable free tile closest to any enemy and
/// attacks from there when something came into range.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkirmishProvider;

impl SkirmishProvider {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous planning used by [`ActionProvider::plan_turn`].
    pub fn plan(&self, view: &TurnView) -> TurnPlan {
        let mut map = view.map.clone();
        let unit = view.unit.as_ref();
        let mut plan = TurnPlan::idle();

        if view.can_use_ability
            && let Some(attack) = Self::pick_attack(&mut map, &view.roster, unit)
        {
            trace!(unit = %unit.id(), "attacking without moving");
            return plan.then(attack);
        }

        let enemies = view.enemy_positions();
        if enemies.is_empty() || !view.can_move {
            return plan;
        }

        if let Some(destination) = Self::approach(&mut map, unit, view.position, &enemies) {
            plan = plan.then(TurnCommand::Move(destination));
            if map.place_unit(unit, destination).is_err() {
                return plan;
            }
        }

        if view.can_use_ability
            && let Some(attack) = Self::pick_attack(&mut map, &view.roster, unit)
        {
            plan = plan.then(attack);
        }

        debug!(unit = %unit.id(), commands = plan.commands.len(), "skirmish plan");
        plan
    }

    /// Reachable free tile minimising the distance to the nearest enemy.
    /// `None` when staying put is already best.
    fn approach(
        map: &mut BattleMap,
        unit: &BattleUnit,
        origin: Position,
        enemies: &[Position],
    ) -> Option<Position> {
        let nearest = |position: Position| {
            enemies
                .iter()
                .map(|enemy| enemy.manhattan_distance(position))
                .min()
                .unwrap_or(u32::MAX)
        };

        let reachable = map
            .reachable_from_unit(unit, unit.current_movement(), true)
            .ok()?;
        let best = reachable
            .into_iter()
            .filter(|&position| position == origin || map.unit_at(position).is_none())
            .min_by_key(|&position| (nearest(position), position != origin))?;

        (best != origin).then_some(best)
    }

    /// First affordable ability with a target, aimed at the weakest enemy.
    fn pick_attack(map: &mut BattleMap, roster: &Roster, unit: &BattleUnit) -> Option<TurnCommand> {
        unit.abilities()
            .iter()
            .enumerate()
            .filter(|(_, ability)| unit.can_pay(ability.mana_cost()))
            .find_map(|(index, ability)| {
                let targets = ability.available_targets(map, roster, unit).ok()?;
                let target = targets.into_iter().min_by(|a, b| {
                    let health = |position: Position| {
                        map.unit_at(position)
                            .and_then(|id| roster.get(id))
                            .map_or(f32::MAX, |target| target.health())
                    };
                    health(*a).total_cmp(&health(*b))
                })?;
                Some(TurnCommand::UseAbility {
                    index,
                    targets: vec![target],
                })
            })
    }
}

#[async_trait]
impl ActionProvider for SkirmishProvider {
    async fn plan_turn(&self, view: &TurnView) -> Result<TurnPlan> {
        Ok(self.plan(view))
    }
}
