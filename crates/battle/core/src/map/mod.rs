//! Arena tiles, occupancy, and the map query surface used by the orchestrator.
mod graph;
mod manager;
mod tile;

use std::collections::BTreeSet;

use crate::nav::{NavError, Path};
use crate::state::{Position, UnitId};
use crate::units::UnitFacts;

pub use graph::{MapDimensions, TileGraph};
pub use manager::BattleMap;
pub use tile::{Occupant, TerrainKind, Tile, TileSpec};

/// Errors raised by map management and queries.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("position {position} is outside the arena")]
    OutOfBounds { position: Position },

    #[error("tile {position} is not walkable")]
    NotWalkable { position: Position },

    #[error("tile {position} is already occupied by {occupant}")]
    Occupied { position: Position, occupant: UnitId },

    #[error("unit {unit} is not on the map")]
    UnknownUnit { unit: UnitId },

    #[error("no path from {from} to {to}")]
    Unreachable { from: Position, to: Position },

    #[error("invalid map layout: {reason}")]
    InvalidLayout { reason: String },

    #[error(transparent)]
    Nav(#[from] NavError),
}

/// Read-mostly queries the orchestrator and ability targeting run against
/// the arena.
///
/// Queries take `&mut self` because searches reuse scratch state.
pub trait MapQuery {
    fn reachable_tiles(
        &mut self,
        source: Position,
        radius: u32,
        unit: &dyn UnitFacts,
        considers_collision: bool,
    ) -> Result<BTreeSet<Position>, MapError>;

    fn shortest_path(
        &mut self,
        source: Position,
        destination: Position,
        unit: &dyn UnitFacts,
    ) -> Result<Option<Path>, MapError>;

    fn unit_at(&self, position: Position) -> Option<UnitId>;

    fn blocks_movement(&self, position: Position, unit: &dyn UnitFacts) -> bool;
}
