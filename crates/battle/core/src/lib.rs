//! Deterministic tactical-battle core: tile graph, grid pathfinding and a
//! speed-weighted turn scheduler. No async, no I/O.
pub mod collections;
pub mod config;
pub mod map;
pub mod nav;
pub mod state;
pub mod turn;
pub mod units;

pub use collections::{HeapIdentity, PriorityQueue};
pub use config::BattleConfig;
pub use map::{
    BattleMap, MapDimensions, MapError, MapQuery, Occupant, TerrainKind, Tile, TileGraph, TileSpec,
};
pub use nav::{FrontierEdge, NavError, NavMesh, Path, SearchNode};
pub use state::{Position, TeamId, Tick, UnitId};
pub use turn::{
    DeferredTask, RecalculationReport, SchedulerConfig, SchedulerPhase, TurnEntry, TurnError,
    TurnScheduler, compute_delta,
};
pub use units::{Signal, SignalCallback, SubscriptionId, UnitFacts, UnitRef, UnitSignals};
