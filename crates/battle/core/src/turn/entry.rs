use std::cmp::Ordering;

use crate::collections::HeapIdentity;
use crate::state::UnitId;

/// Timeline increment for a unit of `speed` when the fastest unit has
/// `max_speed`.
///
/// `delta = ((max_speed + 1 - speed) / (max_speed / max_consecutive_turns)) + 1`
///
/// The fastest unit gets the smallest delta, so it may act up to
/// `max_consecutive_turns` times while the slowest unit acts once. When no
/// unit has positive speed every unit advances by `1.0`.
pub fn compute_delta(speed: f32, max_speed: f32, max_consecutive_turns: u32) -> f32 {
    if max_speed <= 0.0 || max_consecutive_turns == 0 {
        return 1.0;
    }
    let turn_span = max_speed / max_consecutive_turns as f32;
    ((max_speed + 1.0 - speed) / turn_span) + 1.0
}

/// A unit's place on the scheduling timeline.
///
/// Entries order by `(timeline_position, earliest_last_turn)`: the earliest
/// timeline position acts first, and among equal positions the entry that
/// has waited longest goes first. The unit id breaks any remaining tie.
#[derive(Clone, Copy, Debug)]
pub struct TurnEntry {
    unit: UnitId,
    delta: f32,
    timeline_position: f32,
    earliest_last_turn: f32,
}

impl TurnEntry {
    pub fn new(unit: UnitId, speed: f32, max_speed: f32, max_consecutive_turns: u32) -> Self {
        let delta = compute_delta(speed, max_speed, max_consecutive_turns);
        Self {
            unit,
            delta,
            timeline_position: 0.0,
            earliest_last_turn: delta,
        }
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn timeline_position(&self) -> f32 {
        self.timeline_position
    }

    pub fn earliest_last_turn(&self) -> f32 {
        self.earliest_last_turn
    }

    pub fn recalculate_delta(&mut self, speed: f32, max_speed: f32, max_consecutive_turns: u32) {
        self.delta = compute_delta(speed, max_speed, max_consecutive_turns);
    }

    /// Moves the entry one turn along the timeline. Run once per completed turn.
    pub fn calculate_next_turn(&mut self) {
        self.earliest_last_turn = self.timeline_position;
        self.timeline_position += self.delta;
    }
}

impl HeapIdentity for TurnEntry {
    type Id = UnitId;

    fn identity(&self) -> UnitId {
        self.unit
    }
}

impl Ord for TurnEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timeline_position
            .total_cmp(&other.timeline_position)
            .then_with(|| self.earliest_last_turn.total_cmp(&other.earliest_last_turn))
            .then_with(|| self.unit.cmp(&other.unit))
    }
}

impl PartialOrd for TurnEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TurnEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TurnEntry {}
