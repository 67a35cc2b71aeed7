mod common;

use std::collections::BTreeSet;

use battle_core::{
    BattleMap, MapDimensions, MapError, MapQuery, NavError, NavMesh, Position, TileGraph,
    TileSpec, UnitFacts,
};
use common::{TestUnit, spawn};
use proptest::prelude::*;

fn open_grid(size: u32) -> TileGraph {
    TileGraph::open(MapDimensions::new(size, size), TileSpec::FLOOR)
}

fn manhattan_ball(graph: &TileGraph, center: Position, radius: u32) -> BTreeSet<Position> {
    graph
        .positions()
        .filter(|position| position.manhattan_distance(center) <= radius)
        .collect()
}

#[test]
fn corner_radius_covers_in_bounds_manhattan_ball() {
    let graph = open_grid(4);
    let mut nav = NavMesh::new(&graph);
    let unit = TestUnit::player(1);

    let reachable = nav
        .reachable_tiles(&graph, Position::ORIGIN, 2, unit.as_ref(), true)
        .unwrap();

    assert_eq!(reachable, manhattan_ball(&graph, Position::ORIGIN, 2));
    assert_eq!(reachable.len(), 6);
}

#[test]
fn interior_radius_covers_full_diamond() {
    let graph = open_grid(5);
    let mut nav = NavMesh::new(&graph);
    let unit = TestUnit::player(1);
    let center = Position::new(2, 2);

    let reachable = nav
        .reachable_tiles(&graph, center, 2, unit.as_ref(), true)
        .unwrap();

    assert_eq!(reachable.len(), 13);
    assert_eq!(reachable, manhattan_ball(&graph, center, 2));
}

#[test]
fn reachable_tiles_is_idempotent() {
    let graph = TileGraph::from_rows(&["..~.", ".#..", "..w.", "...."]).unwrap();
    let mut nav = NavMesh::new(&graph);
    let unit = TestUnit::player(1);

    let first = nav
        .reachable_tiles(&graph, Position::ORIGIN, 4, unit.as_ref(), true)
        .unwrap();
    let second = nav
        .reachable_tiles(&graph, Position::ORIGIN, 4, unit.as_ref(), true)
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn path_routes_around_blocked_tile() {
    let mut graph = open_grid(4);
    graph.set_spec(Position::new(1, 0), TileSpec::WALL).unwrap();
    let mut nav = NavMesh::new(&graph);
    let unit = TestUnit::player(1);

    let path = nav
        .shortest_path(&graph, Position::ORIGIN, Position::new(2, 0), unit.as_ref())
        .unwrap()
        .expect("destination should be reachable");

    assert_eq!(path.len(), 4);
    assert_eq!(path.cost, 4);
    assert!(!path.steps.contains(&Position::new(1, 0)));
    assert_eq!(path.destination(), Some(Position::new(2, 0)));
}

#[test]
fn open_grid_path_is_straight() {
    let graph = open_grid(4);
    let mut nav = NavMesh::new(&graph);
    let unit = TestUnit::player(1);

    let path = nav
        .shortest_path(&graph, Position::ORIGIN, Position::new(2, 0), unit.as_ref())
        .unwrap()
        .unwrap();

    assert_eq!(path.steps, vec![Position::new(1, 0), Position::new(2, 0)]);
}

#[test]
fn path_to_self_is_found_and_empty() {
    let graph = open_grid(3);
    let mut nav = NavMesh::new(&graph);
    let unit = TestUnit::player(1);

    let path = nav
        .shortest_path(&graph, Position::new(1, 1), Position::new(1, 1), unit.as_ref())
        .unwrap();

    assert_eq!(path.map(|path| path.is_empty()), Some(true));
}

#[test]
fn walled_off_destination_is_unreachable() {
    let graph = TileGraph::from_rows(&["..#.", "..#.", "..#.", "..#."]).unwrap();
    let mut nav = NavMesh::new(&graph);
    let unit = TestUnit::player(1);

    let path = nav
        .shortest_path(&graph, Position::ORIGIN, Position::new(3, 0), unit.as_ref())
        .unwrap();
    assert!(path.is_none());

    let off_map = nav
        .shortest_path(&graph, Position::ORIGIN, Position::new(9, 9), unit.as_ref())
        .unwrap();
    assert!(off_map.is_none());
}

#[test]
fn unknown_source_is_an_error() {
    let graph = open_grid(3);
    let mut nav = NavMesh::new(&graph);
    let unit = TestUnit::player(1);

    let err = nav
        .reachable_tiles(&graph, Position::new(-1, 0), 2, unit.as_ref(), true)
        .unwrap_err();
    assert_eq!(err, NavError::UnknownSource { position: Position::new(-1, 0) });
}

#[test]
fn costly_terrain_shrinks_reach() {
    let graph = TileGraph::from_rows(&[".w..", "....", "....", "...."]).unwrap();
    let mut nav = NavMesh::new(&graph);
    let unit = TestUnit::player(1);

    let reachable = nav
        .reachable_tiles(&graph, Position::ORIGIN, 2, unit.as_ref(), true)
        .unwrap();

    assert!(!reachable.contains(&Position::new(1, 0)));
    assert!(reachable.contains(&Position::new(1, 1)));
}

#[test]
fn ranged_reach_ignores_walls_but_movement_does_not() {
    let graph = TileGraph::from_rows(&[".#..", "##..", "....", "...."]).unwrap();
    let mut nav = NavMesh::new(&graph);
    let unit = TestUnit::player(1);

    let walking = nav
        .reachable_tiles(&graph, Position::ORIGIN, 2, unit.as_ref(), true)
        .unwrap();
    let ranged = nav
        .reachable_tiles(&graph, Position::ORIGIN, 2, unit.as_ref(), false)
        .unwrap();

    assert_eq!(walking, BTreeSet::from([Position::ORIGIN]));
    assert!(ranged.contains(&Position::new(1, 1)));
    assert!(ranged.contains(&Position::new(2, 0)));
}

#[test]
fn hostile_units_block_but_allies_do_not() {
    let mut map = BattleMap::new(TileGraph::from_rows(&["...", "###", "..."]).unwrap());
    let walker = TestUnit::player(1);
    let ally = TestUnit::player(2);
    let enemy = TestUnit::enemy(3);

    map.place_unit(walker.as_ref(), Position::ORIGIN).unwrap();
    map.place_unit(ally.as_ref(), Position::new(1, 0)).unwrap();

    let through_ally = map
        .shortest_path(Position::ORIGIN, Position::new(2, 0), walker.as_ref())
        .unwrap();
    assert_eq!(through_ally.map(|path| path.len()), Some(2));

    map.remove_unit(ally.id());
    map.place_unit(enemy.as_ref(), Position::new(1, 0)).unwrap();

    let through_enemy = map
        .shortest_path(Position::ORIGIN, Position::new(2, 0), walker.as_ref())
        .unwrap();
    assert!(through_enemy.is_none());
}

#[test]
fn cached_search_is_dropped_after_occupancy_change() {
    let mut map = BattleMap::new(open_grid(4));
    let walker = TestUnit::player(1);
    let enemy = TestUnit::enemy(2);
    map.place_unit(walker.as_ref(), Position::ORIGIN).unwrap();

    let before = map
        .shortest_path(Position::ORIGIN, Position::new(2, 0), walker.as_ref())
        .unwrap()
        .unwrap();
    assert_eq!(before.len(), 2);

    map.place_unit(enemy.as_ref(), Position::new(1, 0)).unwrap();
    let after = map
        .shortest_path(Position::ORIGIN, Position::new(2, 0), walker.as_ref())
        .unwrap()
        .unwrap();
    assert_eq!(after.len(), 4);
}

#[test]
fn repeated_path_query_reuses_search() {
    let graph = open_grid(6);
    let mut nav = NavMesh::new(&graph);
    let unit = TestUnit::player(1);

    nav.reachable_tiles(&graph, Position::ORIGIN, 10, unit.as_ref(), true)
        .unwrap();
    let searches = nav.searches();

    let path = nav
        .shortest_path(&graph, Position::ORIGIN, Position::new(3, 4), unit.as_ref())
        .unwrap()
        .unwrap();

    assert_eq!(path.cost, 7);
    assert_eq!(nav.searches(), searches);
}

#[test]
fn move_unit_walks_and_updates_occupancy() {
    let mut map = BattleMap::new(open_grid(4));
    let unit = TestUnit::player(1);
    map.spawn_units(&[spawn(&unit, Position::ORIGIN)]).unwrap();

    let path = map.move_unit(unit.as_ref(), Position::new(2, 1)).unwrap();

    assert_eq!(path.cost, 3);
    assert_eq!(map.position_of(unit.id()), Some(Position::new(2, 1)));
    assert_eq!(map.unit_at(Position::ORIGIN), None);
    assert_eq!(map.unit_at(Position::new(2, 1)), Some(unit.id()));
}

#[test]
fn move_onto_occupied_tile_is_rejected() {
    let mut map = BattleMap::new(open_grid(3));
    let unit = TestUnit::player(1);
    let other = TestUnit::player(2);
    map.spawn_units(&[spawn(&unit, Position::ORIGIN), spawn(&other, Position::new(1, 1))])
        .unwrap();

    let err = map.move_unit(unit.as_ref(), Position::new(1, 1)).unwrap_err();
    assert_eq!(
        err,
        MapError::Occupied {
            position: Position::new(1, 1),
            occupant: other.id(),
        }
    );
}

#[test]
fn spawn_on_wall_fails() {
    let mut map = BattleMap::new(TileGraph::from_rows(&[".#", ".."]).unwrap());
    let unit = TestUnit::player(1);

    let err = map.spawn_units(&[spawn(&unit, Position::new(1, 0))]).unwrap_err();
    assert_eq!(err, MapError::NotWalkable { position: Position::new(1, 0) });
}

#[test]
fn enemies_in_range_lists_only_hostiles() {
    let mut map = BattleMap::new(open_grid(5));
    let archer = TestUnit::player(1);
    let ally = TestUnit::player(2);
    let near = TestUnit::enemy(3);
    let far = TestUnit::enemy(4);
    map.spawn_units(&[
        spawn(&archer, Position::ORIGIN),
        spawn(&ally, Position::new(1, 0)),
        spawn(&near, Position::new(0, 2)),
        spawn(&far, Position::new(4, 4)),
    ])
    .unwrap();

    let targets = map.enemies_in_range(archer.as_ref(), 3, false).unwrap();
    assert_eq!(targets, vec![Position::new(0, 2)]);
}

#[test]
fn deactivate_clears_every_placement() {
    let mut map = BattleMap::new(open_grid(3));
    let a = TestUnit::player(1);
    let b = TestUnit::enemy(2);
    map.spawn_units(&[spawn(&a, Position::ORIGIN), spawn(&b, Position::new(2, 2))])
        .unwrap();

    map.deactivate();

    assert_eq!(map.position_of(a.id()), None);
    assert!(map.graph().tiles().all(|tile| !tile.is_occupied()));
}

#[test]
fn from_rows_rejects_ragged_layout() {
    let err = TileGraph::from_rows(&["...", ".."]).unwrap_err();
    assert!(matches!(err, MapError::InvalidLayout { .. }));
}

#[test]
fn extreme_tile_costs_saturate_instead_of_overflowing() {
    let graph = TileGraph::open(MapDimensions::new(3, 1), TileSpec::new(u32::MAX, true));
    let mut nav = NavMesh::new(&graph);
    let unit = TestUnit::player(1);

    let reachable = nav
        .reachable_tiles(&graph, Position::ORIGIN, u32::MAX, unit.as_ref(), true)
        .unwrap();
    assert_eq!(reachable.len(), 3);

    let mut nav = NavMesh::new(&graph);
    let path = nav
        .shortest_path(&graph, Position::ORIGIN, Position::new(2, 0), unit.as_ref())
        .unwrap()
        .unwrap();
    assert_eq!(path.steps, vec![Position::new(1, 0), Position::new(2, 0)]);
    assert_eq!(path.cost, u32::MAX);
}

/// Random 6x6 layouts whose origin is always walkable floor.
fn layout() -> impl Strategy<Value = Vec<String>> {
    let symbols = prop::sample::select(vec!['.', '.', '.', '~', 'w', '#']);
    prop::collection::vec(prop::collection::vec(symbols, 6), 6).prop_map(|rows| {
        let mut rows: Vec<String> = rows.into_iter().map(|row| row.into_iter().collect()).collect();
        rows[0].replace_range(0..1, ".");
        rows
    })
}

proptest! {
    #[test]
    fn radius_is_monotone(rows in layout(), r1 in 0u32..6, extra in 0u32..6, collide in any::<bool>()) {
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let graph = TileGraph::from_rows(&rows).unwrap();
        let mut nav = NavMesh::new(&graph);
        let unit = TestUnit::player(1);

        let small = nav.reachable_tiles(&graph, Position::ORIGIN, r1, unit.as_ref(), collide).unwrap();
        let large = nav.reachable_tiles(&graph, Position::ORIGIN, r1 + extra, unit.as_ref(), collide).unwrap();

        prop_assert!(small.is_subset(&large));
    }

    #[test]
    fn paths_are_adjacent_and_cost_matches_distance(rows in layout()) {
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let graph = TileGraph::from_rows(&rows).unwrap();
        let unit = TestUnit::player(1);

        let mut flood = NavMesh::new(&graph);
        let reachable = flood.reachable_tiles(&graph, Position::ORIGIN, u32::MAX, unit.as_ref(), true).unwrap();
        for destination in reachable {
            let expected = flood.distance_to(destination);

            // A mesh per query so the heuristic search runs every time.
            let mut nav = NavMesh::new(&graph);
            let path = nav.shortest_path(&graph, Position::ORIGIN, destination, unit.as_ref()).unwrap();
            prop_assert_eq!(nav.searches(), 1);
            prop_assert!(path.is_some());
            let path = path.unwrap();

            let mut previous = Position::ORIGIN;
            let mut cost = 0;
            for &step in &path.steps {
                prop_assert!(previous.is_adjacent(step));
                cost += graph.tile(step).unwrap().movement_cost();
                previous = step;
            }
            prop_assert_eq!(previous, destination);
            prop_assert_eq!(cost, path.cost);
            prop_assert_eq!(Some(path.cost), expected);
        }
    }
}
