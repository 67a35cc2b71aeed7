use std::collections::{BTreeSet, HashMap};

use tracing::{debug, error};

use crate::nav::{NavMesh, Path};
use crate::state::{Position, UnitId};
use crate::units::{UnitFacts, UnitRef};

use super::{MapError, MapQuery, Occupant, TileGraph};

/// Owns the arena tiles, tracks where units stand, and answers range and
/// path queries through its [`NavMesh`].
///
/// This is the only place occupancy is toggled.
#[derive(Clone, Debug)]
pub struct BattleMap {
    graph: TileGraph,
    nav: NavMesh,
    placements: HashMap<UnitId, Position>,
}

impl BattleMap {
    pub fn new(graph: TileGraph) -> Self {
        let nav = NavMesh::new(&graph);
        Self {
            graph,
            nav,
            placements: HashMap::new(),
        }
    }

    pub fn graph(&self) -> &TileGraph {
        &self.graph
    }

    pub fn nav(&self) -> &NavMesh {
        &self.nav
    }

    pub fn position_of(&self, unit: UnitId) -> Option<Position> {
        self.placements.get(&unit).copied()
    }

    pub fn placements(&self) -> impl Iterator<Item = (UnitId, Position)> + '_ {
        self.placements.iter().map(|(&unit, &position)| (unit, position))
    }

    /// Places every unit on its starting tile.
    ///
    /// An invalid spawn (off the arena, unwalkable, or already occupied) is
    /// logged and returned; units before it stay placed.
    pub fn spawn_units(&mut self, spawns: &[(UnitRef, Position)]) -> Result<(), MapError> {
        for (unit, position) in spawns {
            if let Err(err) = self.place_unit(unit.as_ref(), *position) {
                error!(
                    unit = %unit.id(),
                    %position,
                    "unit spawned on an invalid tile: {}",
                    err
                );
                return Err(err);
            }
        }
        debug!(units = spawns.len(), "units spawned");
        Ok(())
    }

    /// Moves `unit` straight to `destination` without pathing.
    pub fn place_unit(&mut self, unit: &dyn UnitFacts, destination: Position) -> Result<(), MapError> {
        let origin = self.placements.get(&unit.id()).copied();
        if origin == Some(destination) {
            return Ok(());
        }

        self.graph.occupy(destination, Occupant::of(unit))?;
        if let Some(origin) = origin {
            self.graph.vacate(origin);
        }
        self.placements.insert(unit.id(), destination);
        Ok(())
    }

    /// Walks `unit` to `destination` along the shortest path.
    ///
    /// Returns the path taken; it is empty when the unit already stands on
    /// `destination`.
    pub fn move_unit(&mut self, unit: &dyn UnitFacts, destination: Position) -> Result<Path, MapError> {
        let origin = self
            .position_of(unit.id())
            .ok_or(MapError::UnknownUnit { unit: unit.id() })?;
        if origin == destination {
            return Ok(Path::default());
        }

        let tile = self
            .graph
            .tile(destination)
            .ok_or(MapError::OutOfBounds {
                position: destination,
            })?;
        if !tile.is_walkable() {
            return Err(MapError::NotWalkable {
                position: destination,
            });
        }
        if let Some(occupant) = tile.occupant() {
            return Err(MapError::Occupied {
                position: destination,
                occupant: occupant.unit,
            });
        }

        let path = self
            .nav
            .shortest_path(&self.graph, origin, destination, unit)?
            .ok_or(MapError::Unreachable {
                from: origin,
                to: destination,
            })?;

        self.place_unit(unit, destination)?;
        debug!(unit = %unit.id(), from = %origin, to = %destination, cost = path.cost, "unit moved");
        Ok(path)
    }

    /// Stops tracking `unit` and frees its tile.
    pub fn remove_unit(&mut self, unit: UnitId) -> Option<Position> {
        let position = self.placements.remove(&unit)?;
        self.graph.vacate(position);
        Some(position)
    }

    /// Clears every placement and all pathfinding state at battle end.
    pub fn deactivate(&mut self) {
        for (_, position) in self.placements.drain() {
            self.graph.vacate(position);
        }
        self.nav.reset();
    }

    /// Reachable positions around wherever `unit` currently stands.
    pub fn reachable_from_unit(
        &mut self,
        unit: &dyn UnitFacts,
        radius: u32,
        considers_collision: bool,
    ) -> Result<BTreeSet<Position>, MapError> {
        let source = self
            .position_of(unit.id())
            .ok_or(MapError::UnknownUnit { unit: unit.id() })?;
        self.reachable_tiles(source, radius, unit, considers_collision)
    }

    /// Positions within `radius` of `unit` holding a unit from another team.
    pub fn enemies_in_range(
        &mut self,
        unit: &dyn UnitFacts,
        radius: u32,
        considers_collision: bool,
    ) -> Result<Vec<Position>, MapError> {
        let reachable = self.reachable_from_unit(unit, radius, considers_collision)?;

        Ok(reachable
            .into_iter()
            .filter(|&position| {
                self.graph
                    .tile(position)
                    .and_then(|tile| tile.occupant())
                    .is_some_and(|occupant| occupant.team != unit.team())
            })
            .collect())
    }
}

impl MapQuery for BattleMap {
    fn reachable_tiles(
        &mut self,
        source: Position,
        radius: u32,
        unit: &dyn UnitFacts,
        considers_collision: bool,
    ) -> Result<BTreeSet<Position>, MapError> {
        Ok(self
            .nav
            .reachable_tiles(&self.graph, source, radius, unit, considers_collision)?)
    }

    fn shortest_path(
        &mut self,
        source: Position,
        destination: Position,
        unit: &dyn UnitFacts,
    ) -> Result<Option<Path>, MapError> {
        Ok(self
            .nav
            .shortest_path(&self.graph, source, destination, unit)?)
    }

    fn unit_at(&self, position: Position) -> Option<UnitId> {
        self.graph.unit_at(position)
    }

    fn blocks_movement(&self, position: Position, unit: &dyn UnitFacts) -> bool {
        self.graph.blocks_movement(position, unit)
    }
}
