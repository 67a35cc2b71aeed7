use std::collections::HashMap;

use crate::state::{Position, UnitId};
use crate::units::UnitFacts;

use super::{MapError, Occupant, TerrainKind, Tile, TileSpec};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapDimensions {
    pub width: u32,
    pub height: u32,
}

impl MapDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as u32) < self.width
            && (position.y as u32) < self.height
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height as i32)
            .flat_map(move |y| (0..self.width as i32).map(move |x| Position::new(x, y)))
    }
}

/// Walkability, movement cost and occupancy of every arena position.
///
/// Every occupancy or terrain mutation bumps [`TileGraph::revision`], which
/// pathfinding uses to tell whether a cached search is still valid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGraph {
    dimensions: MapDimensions,
    tiles: HashMap<Position, Tile>,
    revision: u64,
}

impl TileGraph {
    pub fn from_fn<F>(dimensions: MapDimensions, mut spec_at: F) -> Self
    where
        F: FnMut(Position) -> TileSpec,
    {
        let tiles = dimensions
            .positions()
            .map(|position| (position, Tile::new(position, spec_at(position))))
            .collect();

        Self {
            dimensions,
            tiles,
            revision: 0,
        }
    }

    /// Uniform arena where every tile shares `spec`.
    pub fn open(dimensions: MapDimensions, spec: TileSpec) -> Self {
        Self::from_fn(dimensions, |_| spec)
    }

    /// Builds a graph from ASCII rows; row `i` holds the tiles with `y == i`.
    ///
    /// See [`TerrainKind::from_symbol`] for the accepted symbols.
    pub fn from_rows(rows: &[&str]) -> Result<Self, MapError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.chars().count());
        if width == 0 {
            return Err(MapError::InvalidLayout {
                reason: "layout has no tiles".to_string(),
            });
        }

        let mut tiles = HashMap::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(MapError::InvalidLayout {
                    reason: format!("row {} is not {} tiles wide", y, width),
                });
            }
            for (x, symbol) in row.chars().enumerate() {
                let terrain =
                    TerrainKind::from_symbol(symbol).ok_or_else(|| MapError::InvalidLayout {
                        reason: format!("unknown tile symbol {:?} at ({}, {})", symbol, x, y),
                    })?;
                let position = Position::new(x as i32, y as i32);
                tiles.insert(position, Tile::new(position, terrain.spec()));
            }
        }

        Ok(Self {
            dimensions: MapDimensions::new(width as u32, height as u32),
            tiles,
            revision: 0,
        })
    }

    pub fn dimensions(&self) -> MapDimensions {
        self.dimensions
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, position: Position) -> bool {
        self.tiles.contains_key(&position)
    }

    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.tiles.get(&position)
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.tiles.keys().copied()
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.values()
    }

    pub fn unit_at(&self, position: Position) -> Option<UnitId> {
        self.tile(position)
            .and_then(Tile::occupant)
            .map(|occupant| occupant.unit)
    }

    /// Positions outside the graph block everything.
    pub fn blocks_movement(&self, position: Position, unit: &dyn UnitFacts) -> bool {
        self.tile(position)
            .is_none_or(|tile| tile.blocks_movement(unit))
    }

    /// Changes terrain at `position`. Occupied tiles cannot become unwalkable.
    pub fn set_spec(&mut self, position: Position, spec: TileSpec) -> Result<(), MapError> {
        let tile = self
            .tiles
            .get_mut(&position)
            .ok_or(MapError::OutOfBounds { position })?;
        if let Some(occupant) = tile.occupant()
            && !spec.is_walkable()
        {
            return Err(MapError::Occupied {
                position,
                occupant: occupant.unit,
            });
        }

        tile.set_spec(spec);
        self.revision += 1;
        Ok(())
    }

    pub(crate) fn occupy(&mut self, position: Position, occupant: Occupant) -> Result<(), MapError> {
        let tile = self
            .tiles
            .get_mut(&position)
            .ok_or(MapError::OutOfBounds { position })?;
        if !tile.is_walkable() {
            return Err(MapError::NotWalkable { position });
        }
        if let Some(existing) = tile.occupant() {
            return Err(MapError::Occupied {
                position,
                occupant: existing.unit,
            });
        }

        tile.set_occupant(occupant);
        self.revision += 1;
        Ok(())
    }

    pub(crate) fn vacate(&mut self, position: Position) -> Option<Occupant> {
        let occupant = self.tiles.get_mut(&position)?.take_occupant();
        if occupant.is_some() {
            self.revision += 1;
        }
        occupant
    }
}
