/// Battle configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleConfig {
    /// How many turns the fastest unit may take while the slowest unit waits
    /// for one.
    pub max_consecutive_turns: u32,

    /// Ticks a scheduler recomputation waits so bursts of death/speed events
    /// collapse into a single pass.
    pub recalculation_delay_ticks: u32,

    /// Ticks between a unit ending its turn and the next turn starting.
    pub turn_end_delay_ticks: u32,

    /// Actions a unit may execute in one turn (moves and abilities combined).
    pub max_actions_per_turn: u32,
}

impl BattleConfig {
    // ===== design constants =====
    pub const MAX_CONSECUTIVE_TURNS: u32 = 3;
    pub const MAX_EXECUTED_ACTIONS: u32 = 2;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_RECALCULATION_DELAY_TICKS: u32 = 3;
    pub const DEFAULT_TURN_END_DELAY_TICKS: u32 = 6;

    pub fn new() -> Self {
        Self {
            max_consecutive_turns: Self::MAX_CONSECUTIVE_TURNS,
            recalculation_delay_ticks: Self::DEFAULT_RECALCULATION_DELAY_TICKS,
            turn_end_delay_ticks: Self::DEFAULT_TURN_END_DELAY_TICKS,
            max_actions_per_turn: Self::MAX_EXECUTED_ACTIONS,
        }
    }

    pub fn with_recalculation_delay(mut self, ticks: u32) -> Self {
        self.recalculation_delay_ticks = ticks;
        self
    }

    pub fn with_turn_end_delay(mut self, ticks: u32) -> Self {
        self.turn_end_delay_ticks = ticks;
        self
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
