//! Units, their stats and the abilities they use on each other.
mod ability;
mod unit;

pub use ability::{Ability, DamageAbility, Hit, SingleTargetDelivery};
pub use unit::{BattleUnit, DEFENSE_CONSTANT, DamageKind, Roster, UnitStats};
