#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

use battle_core::{Position, TeamId, UnitFacts, UnitId, UnitRef, UnitSignals};

/// Minimal unit used to drive the pathfinder and the scheduler.
#[derive(Debug)]
pub struct TestUnit {
    id: UnitId,
    team: TeamId,
    speed: Mutex<f32>,
    alive: AtomicBool,
    signals: UnitSignals,
}

impl TestUnit {
    pub fn new(id: u32, team: TeamId, speed: f32) -> Arc<Self> {
        Arc::new(Self {
            id: UnitId(id),
            team,
            speed: Mutex::new(speed),
            alive: AtomicBool::new(true),
            signals: UnitSignals::new(),
        })
    }

    pub fn player(id: u32) -> Arc<Self> {
        Self::new(id, TeamId::PLAYER, 5.0)
    }

    pub fn enemy(id: u32) -> Arc<Self> {
        Self::new(id, TeamId::ENEMY, 5.0)
    }

    pub fn set_speed(&self, speed: f32) {
        *self.speed.lock().unwrap() = speed;
        self.signals.notify_speed_changed(self.id);
    }

    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.signals.notify_death(self.id);
    }
}

impl UnitFacts for TestUnit {
    fn id(&self) -> UnitId {
        self.id
    }

    fn team(&self) -> TeamId {
        self.team
    }

    fn speed(&self) -> f32 {
        *self.speed.lock().unwrap()
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn signals(&self) -> &UnitSignals {
        &self.signals
    }
}

pub fn as_refs(units: &[Arc<TestUnit>]) -> Vec<UnitRef> {
    units
        .iter()
        .map(|unit| Arc::clone(unit) as UnitRef)
        .collect()
}

pub fn spawn(unit: &Arc<TestUnit>, position: Position) -> (UnitRef, Position) {
    (Arc::clone(unit) as UnitRef, position)
}
