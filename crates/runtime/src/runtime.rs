//! High-level battle orchestrator.
//!
//! [`BattleRuntime`] owns the scheduler, the map, the turn executor and the
//! event bus, and advances them one tick at a time. Nothing is global: every
//! collaborator is handed in through [`BattleRuntimeBuilder`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use battle_core::{
    BattleMap, Path, Position, SchedulerConfig, SubscriptionId, TeamId, Tick, TurnScheduler,
    UnitFacts, UnitId, UnitRef,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::api::{AbilityView, ActionProvider, Result, RuntimeError, TurnCommand, TurnPlan, TurnView};
use crate::combat::{BattleUnit, Hit, Roster};
use crate::config::RuntimeConfig;
use crate::events::{BattleEvent, BattleOutcome, Event, EventBus, Topic, TurnEvent};
use crate::executor::TurnExecutor;

/// What a single [`BattleRuntime::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// A turn is in progress or ending.
    Waiting,
    /// `unit` became the active unit and awaits commands.
    TurnStarted(UnitId),
    Finished(BattleOutcome),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Finished(BattleOutcome),
}

/// Tick-driven battle orchestrator.
pub struct BattleRuntime {
    config: RuntimeConfig,
    scheduler: TurnScheduler,
    map: BattleMap,
    executor: TurnExecutor,
    events: EventBus,
    roster: Roster,
    phase: Phase,
    clock: Tick,
    team_counts: BTreeMap<TeamId, usize>,
    death_subscriptions: Vec<(Arc<BattleUnit>, SubscriptionId)>,
    deaths_tx: mpsc::UnboundedSender<UnitId>,
    deaths_rx: mpsc::UnboundedReceiver<UnitId>,
}

impl BattleRuntime {
    /// Create a new runtime builder
    pub fn builder() -> BattleRuntimeBuilder {
        BattleRuntimeBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn map(&self) -> &BattleMap {
        &self.map
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Cloneable handle sharing this runtime's turn queue.
    pub fn scheduler(&self) -> TurnScheduler {
        self.scheduler.clone()
    }

    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.events.subscribe(topic)
    }

    pub fn clock(&self) -> Tick {
        self.clock
    }

    pub fn turn_number(&self) -> u32 {
        self.scheduler.current_turn_number()
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        match self.phase {
            Phase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn active_unit(&self) -> Option<Arc<BattleUnit>> {
        self.executor.active_unit().cloned()
    }

    pub fn alive_in_team(&self, team: TeamId) -> usize {
        self.team_counts.get(&team).copied().unwrap_or(0)
    }

    /// Spawns `roster` on the map and starts tracking turn order.
    ///
    /// The first turn starts on the next [`BattleRuntime::tick`].
    pub fn start(&mut self, roster: Vec<(Arc<BattleUnit>, Position)>) -> Result<()> {
        match self.phase {
            Phase::Running => return Err(RuntimeError::AlreadyStarted),
            Phase::Finished(outcome) => return Err(RuntimeError::Finished { outcome }),
            Phase::Idle => {}
        }
        if roster.is_empty() {
            return Err(RuntimeError::EmptyRoster);
        }

        let spawns: Vec<(UnitRef, Position)> = roster
            .iter()
            .map(|(unit, position)| (Arc::clone(unit) as UnitRef, *position))
            .collect();
        self.map.spawn_units(&spawns)?;

        for (unit, _) in &roster {
            self.roster.insert(Arc::clone(unit));
            if unit.is_alive() {
                *self.team_counts.entry(unit.team()).or_default() += 1;
            }

            let deaths = self.deaths_tx.clone();
            let subscription = unit.signals().death.subscribe(move |id| {
                // Receiver gone means the runtime was dropped mid-battle.
                let _ = deaths.send(id);
            });
            self.death_subscriptions.push((Arc::clone(unit), subscription));
        }

        let units: Vec<UnitRef> = spawns.into_iter().map(|(unit, _)| unit).collect();
        self.scheduler.initialize(&units);

        self.phase = Phase::Running;
        self.events.publish(BattleEvent::Started {
            units: self.roster.len(),
        });
        info!(
            units = self.roster.len(),
            teams = self.team_counts.len(),
            "battle started"
        );
        Ok(())
    }

    /// Advances the battle by one tick.
    ///
    /// In order: pending deaths are applied and may end the battle, the
    /// scheduler's deferred recomputation runs, the turn-end countdown runs,
    /// and a new turn starts when no unit is active.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        match self.phase {
            Phase::Idle => return Err(RuntimeError::NotStarted),
            Phase::Finished(outcome) => return Ok(TickOutcome::Finished(outcome)),
            Phase::Running => {}
        }
        self.clock = self.clock.next();

        self.apply_pending_deaths();
        if let Some(outcome) = self.elimination() {
            self.finish(outcome);
            return Ok(TickOutcome::Finished(outcome));
        }

        if let Some(report) = self.scheduler.tick() {
            self.events.publish(TurnEvent::QueueRecalculated {
                pass: report.pass,
                entries: report.entries,
            });
        }

        if let Some(unit) = self.executor.tick() {
            self.complete_turn(unit)?;
        }

        if self.executor.active_unit().is_none() {
            let unit = self.start_next_turn()?;
            return Ok(TickOutcome::TurnStarted(unit));
        }
        Ok(TickOutcome::Waiting)
    }

    fn apply_pending_deaths(&mut self) {
        while let Ok(unit) = self.deaths_rx.try_recv() {
            self.handle_death(unit);
        }
    }

    fn handle_death(&mut self, unit: UnitId) {
        let Some(team) = self.roster.get(unit).map(|unit| unit.team()) else {
            return;
        };
        let position = self.map.remove_unit(unit);
        if let Some(count) = self.team_counts.get_mut(&team) {
            *count = count.saturating_sub(1);
        }

        self.events.publish(BattleEvent::UnitDied {
            unit,
            team,
            position,
        });
        info!(%unit, %team, remaining = self.alive_in_team(team), "unit died");
    }

    fn elimination(&self) -> Option<BattleOutcome> {
        let players = self.alive_in_team(TeamId::PLAYER);
        let hostiles: usize = self
            .team_counts
            .iter()
            .filter(|(team, _)| !team.is_player())
            .map(|(_, count)| count)
            .sum();

        if players == 0 {
            Some(BattleOutcome::Defeat)
        } else if hostiles == 0 {
            Some(BattleOutcome::Victory)
        } else {
            None
        }
    }

    fn complete_turn(&mut self, unit: UnitId) -> Result<()> {
        let turn = self.scheduler.current_turn_number();
        // A unit that died on its own turn already left the queue.
        if self.scheduler.is_tracked(unit) {
            let head = self.scheduler.next_unit()?.id();
            if head == unit {
                self.scheduler.advance()?;
            } else {
                warn!(%unit, %head, "turn queue head changed during the turn");
            }
        }
        self.events.publish(TurnEvent::Ended { unit, turn });
        Ok(())
    }

    fn start_next_turn(&mut self) -> Result<UnitId> {
        let next = self.scheduler.next_unit()?;
        let unit = Arc::clone(self.roster.require(next.id())?);
        self.executor.start_turn(&unit);

        let turn = self.scheduler.current_turn_number();
        self.events.publish(TurnEvent::Started {
            unit: unit.id(),
            turn,
        });
        debug!(unit = %unit.id(), name = unit.name(), turn, "next turn");
        Ok(unit.id())
    }

    fn finish(&mut self, outcome: BattleOutcome) {
        let turns = self.scheduler.current_turn_number();
        self.executor.abort();
        self.scheduler.clear();
        self.map.deactivate();
        for (unit, subscription) in self.death_subscriptions.drain(..) {
            unit.signals().death.unsubscribe(subscription);
        }
        self.team_counts.clear();
        self.phase = Phase::Finished(outcome);

        self.events.publish(BattleEvent::Finished { outcome, turns });
        info!(%outcome, turns, ticks = self.clock.0, "battle finished");
    }

    fn require_running(&self) -> Result<Arc<BattleUnit>> {
        match self.phase {
            Phase::Idle => Err(RuntimeError::NotStarted),
            Phase::Finished(outcome) => Err(RuntimeError::Finished { outcome }),
            Phase::Running => self.active_unit().ok_or(RuntimeError::NoActiveUnit),
        }
    }

    /// Moves the active unit along its shortest path.
    pub fn move_active(&mut self, destination: Position) -> Result<Path> {
        let unit = self.require_running()?;
        let from = self
            .map
            .position_of(unit.id())
            .ok_or(RuntimeError::UnknownUnit { unit: unit.id() })?;

        let path = self.executor.execute_move(&mut self.map, destination)?;
        self.events.publish(TurnEvent::UnitMoved {
            unit: unit.id(),
            from,
            to: destination,
            cost: path.cost,
        });
        Ok(path)
    }

    /// Uses ability `index` of the active unit on `targets`.
    pub fn use_ability(&mut self, index: usize, targets: &[Position]) -> Result<Vec<Hit>> {
        let unit = self.require_running()?;
        let name = unit.ability(index)?.name().to_string();

        let hits = self
            .executor
            .execute_ability(&mut self.map, &self.roster, index, targets)?;
        self.events.publish(TurnEvent::AbilityUsed {
            unit: unit.id(),
            ability: name,
            hits: hits.clone(),
        });
        // Units killed by this ability leave the map before the next command.
        self.apply_pending_deaths();
        Ok(hits)
    }

    /// Starts the turn-end countdown for the active unit.
    pub fn end_turn(&mut self) -> Result<()> {
        self.require_running()?;
        self.executor.end_turn();
        Ok(())
    }

    /// Tiles the active unit could reach within `radius`.
    pub fn reachable_for_active(
        &mut self,
        radius: u32,
        considers_collision: bool,
    ) -> Result<BTreeSet<Position>> {
        let unit = self.require_running()?;
        Ok(self
            .map
            .reachable_from_unit(unit.as_ref(), radius, considers_collision)?)
    }

    /// Targets ability `index` of the active unit offers right now.
    pub fn ability_targets(&mut self, index: usize) -> Result<Vec<Position>> {
        let unit = self.require_running()?;
        let ability = Arc::clone(unit.ability(index)?);
        ability.available_targets(&mut self.map, &self.roster, &unit)
    }

    /// Snapshot for an [`ActionProvider`] deciding the active unit's turn.
    pub fn turn_view(&mut self) -> Result<TurnView> {
        let unit = self.require_running()?;
        let position = self
            .map
            .position_of(unit.id())
            .ok_or(RuntimeError::UnknownUnit { unit: unit.id() })?;

        let mut abilities = Vec::with_capacity(unit.abilities().len());
        for (index, ability) in unit.abilities().iter().enumerate() {
            abilities.push(AbilityView {
                index,
                name: ability.name().to_string(),
                mana_cost: ability.mana_cost(),
                heavy: ability.is_heavy(),
                affordable: unit.can_pay(ability.mana_cost()),
                targets: ability.available_targets(&mut self.map, &self.roster, &unit)?,
            });
        }

        Ok(TurnView {
            position,
            turn: self.turn_number(),
            map: self.map.clone(),
            roster: self.roster.clone(),
            abilities,
            can_move: self.executor.can_move(),
            can_use_ability: self.executor.can_execute_ability(),
            unit,
        })
    }

    /// Runs `plan` for the active unit. Rejected commands are logged and
    /// skipped; the rest of the plan still runs.
    pub fn execute_plan(&mut self, plan: &TurnPlan) -> usize {
        let mut executed = 0;
        for command in &plan.commands {
            let result = match command {
                TurnCommand::Move(destination) => self.move_active(*destination).map(|_| ()),
                TurnCommand::UseAbility { index, targets } => {
                    self.use_ability(*index, targets).map(|_| ())
                }
            };
            match result {
                Ok(()) => executed += 1,
                Err(err) => warn!(?command, "command rejected: {}", err),
            }
        }
        executed
    }
}

impl std::fmt::Debug for BattleRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleRuntime")
            .field("phase", &self.phase)
            .field("clock", &self.clock)
            .field("units", &self.roster.len())
            .field("scheduler", &self.scheduler)
            .field("executor", &self.executor)
            .finish()
    }
}

/// Runs a started battle to completion, asking `provider` for every turn.
///
/// Yields to tokio between ticks so other tasks (event consumers) progress.
pub async fn drive_battle(
    runtime: &mut BattleRuntime,
    provider: &dyn ActionProvider,
    max_ticks: u64,
) -> Result<BattleOutcome> {
    for _ in 0..max_ticks {
        match runtime.tick()? {
            TickOutcome::Finished(outcome) => return Ok(outcome),
            TickOutcome::TurnStarted(unit) => {
                let view = runtime.turn_view()?;
                let plan = provider.plan_turn(&view).await?;
                let executed = runtime.execute_plan(&plan);
                debug!(%unit, planned = plan.commands.len(), executed, "turn played");
                runtime.end_turn()?;
            }
            TickOutcome::Waiting => {}
        }
        tokio::task::yield_now().await;
    }

    Err(RuntimeError::TickBudgetExhausted { ticks: max_ticks })
}

/// Builder for [`BattleRuntime`].
pub struct BattleRuntimeBuilder {
    config: RuntimeConfig,
    map: Option<BattleMap>,
    events: Option<EventBus>,
    scheduler: Option<TurnScheduler>,
}

impl BattleRuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            map: None,
            events: None,
            scheduler: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the required arena
    pub fn map(mut self, map: BattleMap) -> Self {
        self.map = Some(map);
        self
    }

    /// Share an existing event bus instead of creating one
    pub fn event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Use an existing scheduler handle instead of creating one
    pub fn scheduler(mut self, scheduler: TurnScheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn build(self) -> Result<BattleRuntime> {
        let map = self.map.ok_or(RuntimeError::MissingMap)?;
        let events = self
            .events
            .unwrap_or_else(|| EventBus::with_capacity(self.config.event_buffer_size));
        let scheduler = self
            .scheduler
            .unwrap_or_else(|| TurnScheduler::new(SchedulerConfig::from(&self.config.battle)));
        let executor = TurnExecutor::new(&self.config.battle);
        let (deaths_tx, deaths_rx) = mpsc::unbounded_channel();

        Ok(BattleRuntime {
            config: self.config,
            scheduler,
            map,
            executor,
            events,
            roster: Roster::new(),
            phase: Phase::Idle,
            clock: Tick::ZERO,
            team_counts: BTreeMap::new(),
            death_subscriptions: Vec::new(),
            deaths_tx,
            deaths_rx,
        })
    }
}
