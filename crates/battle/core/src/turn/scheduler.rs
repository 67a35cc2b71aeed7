use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, trace};

use crate::collections::PriorityQueue;
use crate::config::BattleConfig;
use crate::state::UnitId;
use crate::units::{SubscriptionId, UnitRef};

use super::{DeferredTask, TurnEntry, TurnError};

/// Lifecycle of a [`TurnScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SchedulerPhase {
    Uninitialized,
    /// Queue is ordered and every delta is current.
    Active,
    /// A recomputation pass is pending; ordering still works on old deltas.
    Draining,
    Cleared,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub max_consecutive_turns: u32,
    pub recalculation_delay_ticks: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&BattleConfig::default())
    }
}

impl From<&BattleConfig> for SchedulerConfig {
    fn from(config: &BattleConfig) -> Self {
        Self {
            max_consecutive_turns: config.max_consecutive_turns,
            recalculation_delay_ticks: config.recalculation_delay_ticks,
        }
    }
}

/// Summary of one recomputation pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecalculationReport {
    /// 1-based pass counter.
    pub pass: u64,
    pub entries: usize,
    pub max_speed: f32,
    pub max_speed_recomputed: bool,
    /// Death and speed-change notifications folded into this pass.
    pub coalesced_events: u32,
}

struct Tracked {
    unit: UnitRef,
    on_death: SubscriptionId,
    on_speed_changed: SubscriptionId,
}

impl Tracked {
    fn unsubscribe(&self) {
        let signals = self.unit.signals();
        signals.death.unsubscribe(self.on_death);
        signals.speed_changed.unsubscribe(self.on_speed_changed);
    }
}

struct SchedulerState {
    config: SchedulerConfig,
    phase: SchedulerPhase,
    queue: PriorityQueue<TurnEntry>,
    tracked: HashMap<UnitId, Tracked>,
    turn_number: u32,
    fastest: Option<UnitId>,
    max_speed: f32,
    max_speed_outdated: bool,
    pending: Option<DeferredTask>,
    pending_events: u32,
    passes: u64,
}

impl SchedulerState {
    fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            phase: SchedulerPhase::Uninitialized,
            queue: PriorityQueue::new(),
            tracked: HashMap::new(),
            turn_number: 0,
            fastest: None,
            max_speed: 0.0,
            max_speed_outdated: false,
            pending: None,
            pending_events: 0,
            passes: 0,
        }
    }

    fn refresh_max_speed(&mut self) {
        let fastest = self
            .tracked
            .values()
            .map(|tracked| (tracked.unit.id(), tracked.unit.speed()))
            .max_by(|(a_id, a), (b_id, b)| a.total_cmp(b).then_with(|| b_id.cmp(a_id)));

        match fastest {
            Some((unit, speed)) => {
                self.fastest = Some(unit);
                self.max_speed = speed;
            }
            None => {
                self.fastest = None;
                self.max_speed = 0.0;
            }
        }
        self.max_speed_outdated = false;
    }

    fn schedule_recalculation(&mut self) {
        self.pending_events += 1;
        if self.pending.is_some() {
            return;
        }
        self.pending = Some(DeferredTask::after(self.config.recalculation_delay_ticks));
        self.phase = SchedulerPhase::Draining;
        debug!(
            delay = self.config.recalculation_delay_ticks,
            "turn queue recalculation scheduled"
        );
    }

    fn recalculate(&mut self) -> RecalculationReport {
        let max_speed_recomputed = self.max_speed_outdated;
        if max_speed_recomputed {
            self.refresh_max_speed();
        }

        let k = self.config.max_consecutive_turns;
        for mut entry in self.queue.drain() {
            let Some(tracked) = self.tracked.get(&entry.unit()) else {
                continue;
            };
            entry.recalculate_delta(tracked.unit.speed(), self.max_speed, k);
            self.queue.insert(entry);
        }

        self.passes += 1;
        self.phase = SchedulerPhase::Active;
        let report = RecalculationReport {
            pass: self.passes,
            entries: self.queue.len(),
            max_speed: self.max_speed,
            max_speed_recomputed,
            coalesced_events: std::mem::take(&mut self.pending_events),
        };
        debug!(
            pass = report.pass,
            entries = report.entries,
            max_speed = report.max_speed,
            coalesced = report.coalesced_events,
            "turn queue recalculated"
        );
        report
    }

    fn clear(&mut self) {
        for (_, tracked) in self.tracked.drain() {
            tracked.unsubscribe();
        }
        self.queue.clear();
        self.fastest = None;
        self.max_speed = 0.0;
        self.max_speed_outdated = false;
        self.pending = None;
        self.pending_events = 0;
        self.phase = SchedulerPhase::Cleared;
    }
}

/// Speed-weighted turn order.
///
/// Every tracked unit owns one [`TurnEntry`] in a min-heap; the root is the
/// unit whose turn it is. Faster units advance along the timeline in smaller
/// steps and so come up more often.
///
/// Deaths are applied synchronously so the dead unit can never be handed out
/// again. Delta recomputation after deaths or speed changes is deferred by
/// [`SchedulerConfig::recalculation_delay_ticks`] and at most one pass is
/// pending at a time, so a burst of notifications collapses into one pass.
///
/// The handle is cheap to clone; all clones share one state. Signal
/// subscriptions only hold a weak reference, and [`TurnScheduler::clear`]
/// removes them.
#[derive(Clone)]
pub struct TurnScheduler {
    state: Arc<Mutex<SchedulerState>>,
}

impl TurnScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(SchedulerState::new(config))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn from_weak(weak: &Weak<Mutex<SchedulerState>>) -> Option<Self> {
        weak.upgrade().map(|state| Self { state })
    }

    /// Starts tracking `units`, replacing whatever was tracked before.
    ///
    /// Dead units are skipped. Every entry starts at timeline position zero.
    pub fn initialize(&self, units: &[UnitRef]) {
        let mut state = self.lock();
        if !state.tracked.is_empty() {
            state.clear();
        }

        for unit in units.iter().filter(|unit| unit.is_alive()) {
            let id = unit.id();
            let signals = unit.signals();

            let weak = Arc::downgrade(&self.state);
            let on_death = signals.death.subscribe(move |unit| {
                if let Some(scheduler) = Self::from_weak(&weak) {
                    scheduler.on_unit_death(unit);
                }
            });
            let weak = Arc::downgrade(&self.state);
            let on_speed_changed = signals.speed_changed.subscribe(move |unit| {
                if let Some(scheduler) = Self::from_weak(&weak) {
                    scheduler.on_unit_speed_changed(unit);
                }
            });

            let tracked = Tracked {
                unit: Arc::clone(unit),
                on_death,
                on_speed_changed,
            };
            if let Some(previous) = state.tracked.insert(id, tracked) {
                previous.unsubscribe();
            }
        }

        state.refresh_max_speed();
        let k = state.config.max_consecutive_turns;
        let max_speed = state.max_speed;
        let entries: Vec<TurnEntry> = state
            .tracked
            .values()
            .map(|tracked| TurnEntry::new(tracked.unit.id(), tracked.unit.speed(), max_speed, k))
            .collect();
        for entry in entries {
            state.queue.insert(entry);
        }

        state.turn_number = 1;
        state.phase = SchedulerPhase::Active;
        debug!(
            units = state.queue.len(),
            max_speed = state.max_speed,
            "turn scheduler initialized"
        );
    }

    /// The unit whose turn it currently is.
    pub fn next_unit(&self) -> Result<UnitRef, TurnError> {
        let state = self.lock();
        let entry = state.queue.peek_min().ok_or(TurnError::EmptyQueue)?;
        state
            .tracked
            .get(&entry.unit())
            .map(|tracked| Arc::clone(&tracked.unit))
            .ok_or(TurnError::UntrackedEntry { unit: entry.unit() })
    }

    /// Completes the current turn and returns the unit that just acted.
    pub fn advance(&self) -> Result<UnitId, TurnError> {
        let mut state = self.lock();
        let mut entry = state.queue.pop_min().ok_or(TurnError::EmptyQueue)?;
        entry.calculate_next_turn();
        let unit = entry.unit();
        state.queue.insert(entry);
        state.turn_number += 1;
        trace!(%unit, turn = state.turn_number, "turn advanced");
        Ok(unit)
    }

    /// Removes a dead unit from the queue and drops its subscriptions.
    pub fn on_unit_death(&self, unit: UnitId) {
        let mut state = self.lock();
        let Some(tracked) = state.tracked.remove(&unit) else {
            trace!(%unit, "death of untracked unit ignored");
            return;
        };
        tracked.unsubscribe();
        state.queue.remove(&unit);

        if state.fastest == Some(unit) {
            state.max_speed_outdated = true;
        }
        debug!(%unit, remaining = state.queue.len(), "unit removed from turn queue");
        state.schedule_recalculation();
    }

    pub fn on_unit_speed_changed(&self, unit: UnitId) {
        let mut state = self.lock();
        let Some(speed) = state.tracked.get(&unit).map(|tracked| tracked.unit.speed()) else {
            trace!(%unit, "stale speed change ignored");
            return;
        };

        if state.fastest == Some(unit) {
            if speed < state.max_speed {
                state.max_speed_outdated = true;
            } else {
                state.max_speed = speed;
            }
        } else if speed > state.max_speed {
            state.fastest = Some(unit);
            state.max_speed = speed;
        }
        state.schedule_recalculation();
    }

    /// Drives the pending recomputation, if any. Call once per simulation tick.
    pub fn tick(&self) -> Option<RecalculationReport> {
        let mut state = self.lock();
        let due = state.pending.as_mut().is_some_and(DeferredTask::tick);
        if !due {
            return None;
        }
        state.pending = None;
        Some(state.recalculate())
    }

    /// Unsubscribes from every unit and empties the queue.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.clear();
        debug!("turn scheduler cleared");
    }

    pub fn current_turn_number(&self) -> u32 {
        self.lock().turn_number
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.lock().phase
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    pub fn is_tracked(&self, unit: UnitId) -> bool {
        self.lock().tracked.contains_key(&unit)
    }

    pub fn recalculation_passes(&self) -> u64 {
        self.lock().passes
    }

    pub fn max_speed(&self) -> f32 {
        self.lock().max_speed
    }

    pub fn fastest_unit(&self) -> Option<UnitId> {
        self.lock().fastest
    }

    pub fn is_recalculation_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    pub fn entry(&self, unit: UnitId) -> Option<TurnEntry> {
        self.lock().queue.get(&unit).copied()
    }

    /// The next `count` activations, assuming nothing changes in between.
    pub fn preview(&self, count: usize) -> Vec<UnitId> {
        let mut queue = self.lock().queue.clone();
        let mut order = Vec::with_capacity(count);
        for _ in 0..count {
            let Some(mut entry) = queue.pop_min() else {
                break;
            };
            order.push(entry.unit());
            entry.calculate_next_turn();
            queue.insert(entry);
        }
        order
    }
}

impl Default for TurnScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl std::fmt::Debug for TurnScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("TurnScheduler")
            .field("phase", &state.phase)
            .field("units", &state.queue.len())
            .field("turn_number", &state.turn_number)
            .field("max_speed", &state.max_speed)
            .field("pending", &state.pending)
            .finish()
    }
}
