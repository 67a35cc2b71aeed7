use crate::state::Position;

/// Per-tile scratch state reused by every search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchNode {
    position: Position,
    distance: Option<u32>,
    back_pointer: Option<Position>,
}

impl SearchNode {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            distance: None,
            back_pointer: None,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Finalised distance from the search source, `None` while unvisited.
    pub fn distance(&self) -> Option<u32> {
        self.distance
    }

    /// Node this one was reached from. `None` for the source or unvisited nodes.
    pub fn back_pointer(&self) -> Option<Position> {
        self.back_pointer
    }

    pub fn is_visited(&self) -> bool {
        self.distance.is_some()
    }

    pub(crate) fn finalize(&mut self, distance: u32, from: Option<Position>) {
        self.distance = Some(distance);
        self.back_pointer = from;
    }

    pub(crate) fn reset(&mut self) {
        self.distance = None;
        self.back_pointer = None;
    }
}

/// Candidate relaxation step waiting in the frontier.
///
/// Ordered by `sort_key` (accumulated cost plus heuristic). The trailing
/// fields only make the order total; equal keys carry no stability promise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FrontierEdge {
    sort_key: u32,
    cost: u32,
    destination: Position,
    source: Position,
}

impl FrontierEdge {
    pub fn new(source: Position, destination: Position, cost: u32, heuristic: u32) -> Self {
        Self {
            sort_key: cost.saturating_add(heuristic),
            cost,
            destination,
            source,
        }
    }

    pub fn source(&self) -> Position {
        self.source
    }

    pub fn destination(&self) -> Position {
        self.destination
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

/// Route produced by a path query.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path {
    /// Positions after the source, ending at the destination. Empty when the
    /// source already is the destination.
    pub steps: Vec<Position>,

    /// Sum of the movement costs of every entered tile.
    pub cost: u32,
}

impl Path {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn destination(&self) -> Option<Position> {
        self.steps.last().copied()
    }
}
