//! Dijkstra / A* relaxation over the 4-connected tile graph.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, trace};

use crate::collections::PriorityQueue;
use crate::map::TileGraph;
use crate::state::{Position, TeamId};
use crate::units::UnitFacts;

use super::{FrontierEdge, NavError, Path, SearchNode};

/// Parameters of the last completed search, used to skip recomputation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SearchMemo {
    source: Position,
    team: TeamId,
    blocking_aware: bool,
    revision: u64,
}

/// Pathfinding state layered over a borrowed [`TileGraph`].
///
/// Search nodes are allocated once, one per tile, and reset before every
/// search. The graph itself is passed into each query and never mutated here.
#[derive(Clone, Debug, Default)]
pub struct NavMesh {
    nodes: HashMap<Position, SearchNode>,
    memo: Option<SearchMemo>,
    searches: u64,
}

impl NavMesh {
    pub fn new(graph: &TileGraph) -> Self {
        let nodes = graph
            .positions()
            .map(|position| (position, SearchNode::new(position)))
            .collect();

        Self {
            nodes,
            memo: None,
            searches: 0,
        }
    }

    /// Every position reachable from `source` within `radius` accumulated
    /// movement cost, the source included.
    ///
    /// With `considers_collision` unset, walls and hostile units are ignored,
    /// which is what ranged abilities use.
    pub fn reachable_tiles(
        &mut self,
        graph: &TileGraph,
        source: Position,
        radius: u32,
        unit: &dyn UnitFacts,
        considers_collision: bool,
    ) -> Result<BTreeSet<Position>, NavError> {
        let visited = self.search(
            graph,
            source,
            unit,
            considers_collision,
            |cost| cost <= radius,
            |_| 0,
            None,
        )?;

        Ok(visited.into_iter().collect())
    }

    /// Cheapest route from `source` to `destination` for `unit`.
    ///
    /// Returns `Ok(None)` when the destination is unreachable or not on the
    /// map, and `Ok(Some(path))` with an empty path when `source` already is
    /// the destination. A previous blocking-aware search from the same source,
    /// for the same team and graph revision, is reused when it already
    /// finalised `destination`.
    pub fn shortest_path(
        &mut self,
        graph: &TileGraph,
        source: Position,
        destination: Position,
        unit: &dyn UnitFacts,
    ) -> Result<Option<Path>, NavError> {
        if !graph.contains(source) {
            return Err(NavError::UnknownSource { position: source });
        }
        if !self.nodes.contains_key(&destination) {
            return Ok(None);
        }

        if self.covers(graph, source, destination, unit) {
            trace!(%source, %destination, "reusing cached search");
        } else {
            self.search(
                graph,
                source,
                unit,
                true,
                |_| true,
                |position| position.manhattan_distance(destination),
                Some(destination),
            )?;
        }

        Ok(self.trace_path(destination))
    }

    /// Finalised distance of `position` in the most recent search.
    pub fn distance_to(&self, position: Position) -> Option<u32> {
        self.nodes.get(&position).and_then(SearchNode::distance)
    }

    pub fn node(&self, position: Position) -> Option<&SearchNode> {
        self.nodes.get(&position)
    }

    /// Number of full searches run so far. Cached path lookups do not count.
    pub fn searches(&self) -> u64 {
        self.searches
    }

    /// Forgets every search result and the memo.
    pub fn reset(&mut self) {
        self.clear_nodes();
        self.memo = None;
    }

    fn clear_nodes(&mut self) {
        self.nodes.values_mut().for_each(SearchNode::reset);
    }

    fn covers(
        &self,
        graph: &TileGraph,
        source: Position,
        destination: Position,
        unit: &dyn UnitFacts,
    ) -> bool {
        let expected = SearchMemo {
            source,
            team: unit.team(),
            blocking_aware: true,
            revision: graph.revision(),
        };

        self.memo == Some(expected)
            && self
                .nodes
                .get(&destination)
                .is_some_and(SearchNode::is_visited)
    }

    /// Shared relaxation loop.
    ///
    /// `keep_going` receives the accumulated cost of each popped edge and
    /// decides whether its destination may be finalised. `stop_at` ends the
    /// search as soon as that position is finalised.
    #[allow(clippy::too_many_arguments)]
    fn search<K, H>(
        &mut self,
        graph: &TileGraph,
        source: Position,
        unit: &dyn UnitFacts,
        blocking_aware: bool,
        mut keep_going: K,
        heuristic: H,
        stop_at: Option<Position>,
    ) -> Result<Vec<Position>, NavError>
    where
        K: FnMut(u32) -> bool,
        H: Fn(Position) -> u32,
    {
        if !graph.contains(source) || !self.nodes.contains_key(&source) {
            return Err(NavError::UnknownSource { position: source });
        }

        self.clear_nodes();
        self.searches += 1;

        let mut frontier = PriorityQueue::new();
        let mut visited = vec![source];
        if let Some(node) = self.nodes.get_mut(&source) {
            node.finalize(0, None);
        }

        if stop_at != Some(source) {
            self.expand(graph, source, 0, unit, blocking_aware, &heuristic, &mut frontier);

            while let Some(edge) = frontier.pop_min() {
                let destination = edge.destination();
                let Some(node) = self.nodes.get_mut(&destination) else {
                    continue;
                };
                if node.is_visited() || !keep_going(edge.cost()) {
                    continue;
                }

                node.finalize(edge.cost(), Some(edge.source()));
                visited.push(destination);

                if stop_at == Some(destination) {
                    break;
                }
                self.expand(
                    graph,
                    destination,
                    edge.cost(),
                    unit,
                    blocking_aware,
                    &heuristic,
                    &mut frontier,
                );
            }
        }

        self.memo = Some(SearchMemo {
            source,
            team: unit.team(),
            blocking_aware,
            revision: graph.revision(),
        });

        debug!(
            %source,
            unit = %unit.id(),
            blocking_aware,
            visited = visited.len(),
            "search complete"
        );
        Ok(visited)
    }

    /// Pushes an edge to every unvisited, in-bounds, non-blocked neighbour of
    /// `from`. The edge cost is the cost of entering the neighbour.
    #[allow(clippy::too_many_arguments)]
    fn expand<H>(
        &self,
        graph: &TileGraph,
        from: Position,
        distance: u32,
        unit: &dyn UnitFacts,
        blocking_aware: bool,
        heuristic: &H,
        frontier: &mut PriorityQueue<FrontierEdge>,
    ) where
        H: Fn(Position) -> u32,
    {
        for neighbor in from.neighbors() {
            let Some(tile) = graph.tile(neighbor) else {
                continue;
            };
            if blocking_aware && tile.blocks_movement(unit) {
                continue;
            }
            if self
                .nodes
                .get(&neighbor)
                .is_none_or(SearchNode::is_visited)
            {
                continue;
            }

            let cost = distance.saturating_add(tile.movement_cost());
            frontier.insert(FrontierEdge::new(from, neighbor, cost, heuristic(neighbor)));
        }
    }

    fn trace_path(&self, destination: Position) -> Option<Path> {
        let node = self.nodes.get(&destination)?;
        let cost = node.distance()?;

        let mut steps = Vec::new();
        let mut current = *node;
        while let Some(previous) = current.back_pointer() {
            steps.push(current.position());
            current = *self.nodes.get(&previous)?;
        }
        steps.reverse();

        Some(Path { steps, cost })
    }
}
