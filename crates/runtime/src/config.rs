//! Runtime configuration loaded from the environment.
use std::env;

use battle_core::BattleConfig;

/// Runtime configuration shared by the orchestrator and the battle driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub battle: BattleConfig,
    /// Capacity of each event bus topic.
    pub event_buffer_size: usize,
    /// Ticks [`crate::drive_battle`] runs before giving up.
    pub max_ticks: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            battle: BattleConfig::default(),
            event_buffer_size: 100,
            max_ticks: 10_000,
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `BATTLE_EVENT_BUFFER_SIZE` - per-topic event capacity (default: 100)
    /// - `BATTLE_MAX_TICKS` - tick budget for a driven battle (default: 10000)
    /// - `BATTLE_MAX_CONSECUTIVE_TURNS` - fastest-unit turns per slowest-unit turn (default: 3)
    /// - `BATTLE_RECALCULATION_DELAY_TICKS` - turn queue recalculation delay (default: 3)
    /// - `BATTLE_TURN_END_DELAY_TICKS` - pause between turns (default: 6)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(size) = read_env::<usize>("BATTLE_EVENT_BUFFER_SIZE") {
            config.event_buffer_size = size.max(1);
        }
        if let Some(ticks) = read_env::<u64>("BATTLE_MAX_TICKS") {
            config.max_ticks = ticks;
        }
        if let Some(turns) = read_env::<u32>("BATTLE_MAX_CONSECUTIVE_TURNS") {
            config.battle.max_consecutive_turns = turns.max(1);
        }
        if let Some(ticks) = read_env::<u32>("BATTLE_RECALCULATION_DELAY_TICKS") {
            config.battle.recalculation_delay_ticks = ticks;
        }
        if let Some(ticks) = read_env::<u32>("BATTLE_TURN_END_DELAY_TICKS") {
            config.battle.turn_end_delay_ticks = ticks;
        }

        config
    }

    pub fn with_battle(mut self, battle: BattleConfig) -> Self {
        self.battle = battle;
        self
    }

    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = ticks;
        self
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
