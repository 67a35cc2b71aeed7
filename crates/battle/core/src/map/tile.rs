use crate::state::{Position, TeamId, UnitId};
use crate::units::UnitFacts;

/// Canonical terrain classes for arena tiles.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TerrainKind {
    Floor,
    Mud,
    Water,
    Wall,
}

impl TerrainKind {
    pub const fn spec(self) -> TileSpec {
        match self {
            TerrainKind::Floor => TileSpec::new(1, true),
            TerrainKind::Mud => TileSpec::new(2, true),
            TerrainKind::Water => TileSpec::new(3, true),
            TerrainKind::Wall => TileSpec::new(1, false),
        }
    }

    /// ASCII layout symbol: `.` floor, `~` mud, `w` water, `#` wall.
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '.' => Some(TerrainKind::Floor),
            '~' => Some(TerrainKind::Mud),
            'w' => Some(TerrainKind::Water),
            '#' => Some(TerrainKind::Wall),
            _ => None,
        }
    }
}

/// Static properties of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileSpec {
    movement_cost: u32,
    walkable: bool,
}

impl TileSpec {
    pub const FLOOR: Self = TerrainKind::Floor.spec();
    pub const WALL: Self = TerrainKind::Wall.spec();

    /// Movement costs below one are raised to one so path heuristics stay
    /// admissible.
    pub const fn new(movement_cost: u32, walkable: bool) -> Self {
        let movement_cost = if movement_cost == 0 { 1 } else { movement_cost };
        Self {
            movement_cost,
            walkable,
        }
    }

    pub const fn movement_cost(self) -> u32 {
        self.movement_cost
    }

    pub const fn is_walkable(self) -> bool {
        self.walkable
    }
}

impl From<TerrainKind> for TileSpec {
    fn from(kind: TerrainKind) -> Self {
        kind.spec()
    }
}

/// Unit standing on a tile. A handle only; the tile never owns the unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Occupant {
    pub unit: UnitId,
    pub team: TeamId,
}

impl Occupant {
    pub fn of(unit: &dyn UnitFacts) -> Self {
        Self {
            unit: unit.id(),
            team: unit.team(),
        }
    }
}

/// A tile of the battle arena with its dynamic occupancy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tile {
    position: Position,
    spec: TileSpec,
    occupant: Option<Occupant>,
}

impl Tile {
    pub fn new(position: Position, spec: TileSpec) -> Self {
        Self {
            position,
            spec,
            occupant: None,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn spec(&self) -> TileSpec {
        self.spec
    }

    pub fn movement_cost(&self) -> u32 {
        self.spec.movement_cost()
    }

    pub fn is_walkable(&self) -> bool {
        self.spec.is_walkable()
    }

    pub fn occupant(&self) -> Option<Occupant> {
        self.occupant
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn can_occupy(&self) -> bool {
        self.is_walkable() && self.occupant.is_none()
    }

    /// A tile blocks `moving` when it is not walkable, or when a unit that is
    /// not an ally of `moving` stands on it.
    pub fn blocks_movement(&self, moving: &dyn UnitFacts) -> bool {
        if !self.is_walkable() {
            return true;
        }
        self.occupant
            .is_some_and(|occupant| occupant.team != moving.team())
    }

    pub(crate) fn set_spec(&mut self, spec: TileSpec) {
        self.spec = spec;
    }

    pub(crate) fn set_occupant(&mut self, occupant: Occupant) {
        self.occupant = Some(occupant);
    }

    pub(crate) fn take_occupant(&mut self) -> Option<Occupant> {
        self.occupant.take()
    }
}
