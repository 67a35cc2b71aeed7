//! Battle orchestration on top of `battle-core`.
//!
//! This crate owns concrete units and abilities, enforces the per-turn action
//! budget, routes battle events, and drives a battle to its outcome with
//! pluggable action providers.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator, its builder and the async driver
//! - [`api`] exposes errors and the provider abstraction
//! - [`combat`] holds units, stats and abilities
//! - [`executor`] enforces what the active unit may still do
//! - [`events`] provides the topic-based event bus
//! - [`providers`] ships the default AI
pub mod api;
pub mod combat;
pub mod config;
pub mod events;
pub mod executor;
pub mod providers;
pub mod runtime;

pub use api::{
    AbilityView, ActionProvider, IdleProvider, Result, RuntimeError, TurnCommand, TurnPlan,
    TurnView,
};
pub use combat::{
    Ability, BattleUnit, DamageAbility, DamageKind, Hit, Roster, SingleTargetDelivery, UnitStats,
};
pub use config::RuntimeConfig;
pub use events::{BattleEvent, BattleOutcome, Event, EventBus, Topic, TurnEvent};
pub use executor::TurnExecutor;
pub use providers::SkirmishProvider;
pub use runtime::{BattleRuntime, BattleRuntimeBuilder, TickOutcome, drive_battle};
