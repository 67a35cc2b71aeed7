use std::sync::Arc;

use battle_core::{BattleMap, MapDimensions, Position, TeamId, TileGraph, TileSpec, UnitFacts, UnitId};
use battle_runtime::{
    BattleEvent, BattleOutcome, BattleRuntime, BattleUnit, DamageAbility, Event, IdleProvider,
    RuntimeConfig, RuntimeError, SkirmishProvider, TickOutcome, Topic, TurnCommand, TurnEvent,
    TurnPlan, UnitStats, drive_battle,
};
use tokio::sync::broadcast::Receiver;

fn knight(id: u32) -> Arc<BattleUnit> {
    Arc::new(
        BattleUnit::new(
            UnitId(id),
            format!("knight-{id}"),
            TeamId::PLAYER,
            UnitStats {
                attack: 20.0,
                defense: 5.0,
                speed: 8.0,
                movement: 3,
                max_health: 40.0,
                max_mana: 50.0,
                ..UnitStats::default()
            },
        )
        .with_ability(DamageAbility::new("slash")),
    )
}

fn goblin(id: u32) -> Arc<BattleUnit> {
    Arc::new(
        BattleUnit::new(
            UnitId(id),
            format!("goblin-{id}"),
            TeamId::ENEMY,
            UnitStats {
                attack: 4.0,
                speed: 4.0,
                movement: 2,
                max_health: 12.0,
                max_mana: 20.0,
                ..UnitStats::default()
            },
        )
        .with_ability(DamageAbility::new("stab")),
    )
}

fn runtime(size: u32) -> BattleRuntime {
    BattleRuntime::builder()
        .config(RuntimeConfig::default())
        .map(BattleMap::new(TileGraph::open(
            MapDimensions::new(size, size),
            TileSpec::FLOOR,
        )))
        .build()
        .expect("runtime should build")
}

fn drain(rx: &mut Receiver<Event>) -> Vec<Event> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

/// Ticks until the next turn starts, ending turns as they come.
fn next_turn(runtime: &mut BattleRuntime) -> TickOutcome {
    for _ in 0..50 {
        match runtime.tick().unwrap() {
            TickOutcome::Waiting => continue,
            outcome => return outcome,
        }
    }
    panic!("no turn started within 50 ticks");
}

#[test]
fn builder_requires_a_map() {
    let err = BattleRuntime::builder().build().unwrap_err();
    assert!(matches!(err, RuntimeError::MissingMap));
}

#[test]
fn tick_before_start_is_an_error() {
    let mut runtime = runtime(4);
    assert!(matches!(runtime.tick(), Err(RuntimeError::NotStarted)));
}

#[test]
fn empty_roster_is_rejected() {
    let mut runtime = runtime(4);
    assert!(matches!(runtime.start(Vec::new()), Err(RuntimeError::EmptyRoster)));
}

#[test]
fn invalid_spawn_aborts_start() {
    let mut runtime = runtime(4);
    let err = runtime
        .start(vec![(knight(1), Position::new(9, 9)), (goblin(2), Position::ORIGIN)])
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Map(_)));
}

#[test]
fn fastest_unit_opens_the_battle() {
    let mut runtime = runtime(6);
    runtime
        .start(vec![
            (goblin(3), Position::new(5, 5)),
            (knight(1), Position::ORIGIN),
            (knight(2), Position::new(0, 1)),
        ])
        .unwrap();

    assert_eq!(runtime.tick().unwrap(), TickOutcome::TurnStarted(UnitId(1)));
    assert_eq!(runtime.active_unit().map(|unit| unit.id()), Some(UnitId(1)));
    assert_eq!(runtime.turn_number(), 1);
}

#[test]
fn next_turn_waits_for_turn_end_delay() {
    let mut runtime = runtime(6);
    runtime
        .start(vec![(knight(1), Position::ORIGIN), (goblin(2), Position::new(5, 5))])
        .unwrap();
    runtime.tick().unwrap();
    let mut turns = runtime.subscribe(Topic::Turn);

    runtime.end_turn().unwrap();
    runtime.end_turn().unwrap();
    for _ in 0..5 {
        assert_eq!(runtime.tick().unwrap(), TickOutcome::Waiting);
    }
    assert_eq!(runtime.tick().unwrap(), TickOutcome::TurnStarted(UnitId(2)));
    assert_eq!(runtime.turn_number(), 2);

    let events = drain(&mut turns);
    assert!(matches!(
        events.as_slice(),
        [
            Event::Turn(TurnEvent::Ended { unit: UnitId(1), turn: 1 }),
            Event::Turn(TurnEvent::Started { unit: UnitId(2), turn: 2 }),
        ]
    ));
}

#[test]
fn killing_last_enemy_wins() {
    let mut runtime = runtime(3);
    let mut battle = runtime.subscribe(Topic::Battle);
    runtime
        .start(vec![(knight(1), Position::ORIGIN), (goblin(2), Position::new(1, 0))])
        .unwrap();
    runtime.tick().unwrap();

    let hits = runtime.use_ability(0, &[Position::new(1, 0)]).unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].killed);

    assert_eq!(
        runtime.tick().unwrap(),
        TickOutcome::Finished(BattleOutcome::Victory)
    );
    assert_eq!(runtime.outcome(), Some(BattleOutcome::Victory));
    assert_eq!(runtime.map().placements().count(), 0);
    assert_eq!(
        runtime.tick().unwrap(),
        TickOutcome::Finished(BattleOutcome::Victory)
    );

    let events = drain(&mut battle);
    assert!(matches!(
        events.as_slice(),
        [
            Event::Battle(BattleEvent::Started { units: 2 }),
            Event::Battle(BattleEvent::UnitDied { unit: UnitId(2), .. }),
            Event::Battle(BattleEvent::Finished {
                outcome: BattleOutcome::Victory,
                ..
            }),
        ]
    ));
}

#[test]
fn losing_every_player_unit_is_defeat() {
    let ogre = Arc::new(
        BattleUnit::new(
            UnitId(9),
            "ogre",
            TeamId::ENEMY,
            UnitStats {
                attack: 100.0,
                speed: 10.0,
                movement: 1,
                max_health: 80.0,
                max_mana: 10.0,
                ..UnitStats::default()
            },
        )
        .with_ability(DamageAbility::new("smash").heavy()),
    );
    let mut runtime = runtime(3);
    runtime
        .start(vec![(knight(1), Position::ORIGIN), (ogre, Position::new(0, 1))])
        .unwrap();

    assert_eq!(runtime.tick().unwrap(), TickOutcome::TurnStarted(UnitId(9)));
    runtime.use_ability(0, &[Position::ORIGIN]).unwrap();

    assert_eq!(
        runtime.tick().unwrap(),
        TickOutcome::Finished(BattleOutcome::Defeat)
    );
    assert!(matches!(
        runtime.move_active(Position::new(1, 1)),
        Err(RuntimeError::Finished { .. })
    ));
}

#[test]
fn dead_unit_never_takes_another_turn() {
    let hero = knight(1);
    let victim = goblin(2);
    let survivor = goblin(3);
    let mut runtime = runtime(6);
    runtime
        .start(vec![
            (Arc::clone(&hero), Position::ORIGIN),
            (Arc::clone(&victim), Position::new(1, 0)),
            (Arc::clone(&survivor), Position::new(5, 5)),
        ])
        .unwrap();

    assert_eq!(runtime.tick().unwrap(), TickOutcome::TurnStarted(hero.id()));
    runtime.use_ability(0, &[Position::new(1, 0)]).unwrap();
    assert!(!runtime.scheduler().is_tracked(victim.id()));

    for _ in 0..10 {
        runtime.end_turn().unwrap();
        match next_turn(&mut runtime) {
            TickOutcome::TurnStarted(unit) => assert_ne!(unit, victim.id()),
            other => panic!("unexpected {:?}", other),
        }
    }
    assert_eq!(runtime.alive_in_team(TeamId::ENEMY), 1);
}

#[test]
fn slain_unit_leaves_the_map_within_the_same_turn() {
    let hero = knight(1);
    let victim = goblin(2);
    let mut runtime = runtime(6);
    let mut battle = runtime.subscribe(Topic::Battle);
    runtime
        .start(vec![
            (Arc::clone(&hero), Position::ORIGIN),
            (Arc::clone(&victim), Position::new(1, 0)),
            (goblin(3), Position::new(5, 5)),
        ])
        .unwrap();
    assert_eq!(runtime.tick().unwrap(), TickOutcome::TurnStarted(hero.id()));

    let hits = runtime.use_ability(0, &[Position::new(1, 0)]).unwrap();
    assert!(hits[0].killed);

    assert_eq!(runtime.map().position_of(victim.id()), None);
    assert_eq!(runtime.alive_in_team(TeamId::ENEMY), 1);
    assert!(!runtime.ability_targets(0).unwrap().contains(&Position::new(1, 0)));

    let mana = hero.mana();
    let err = runtime.use_ability(0, &[Position::new(1, 0)]).unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidTarget { position } if position == Position::new(1, 0)));
    assert_eq!(hero.mana(), mana);

    runtime.move_active(Position::new(1, 0)).unwrap();
    assert_eq!(runtime.map().position_of(hero.id()), Some(Position::new(1, 0)));

    let events = drain(&mut battle);
    assert!(events.iter().any(|event| matches!(
        event,
        Event::Battle(BattleEvent::UnitDied { unit: UnitId(2), position: Some(_), .. })
    )));
}

#[test]
fn rejected_commands_are_skipped() {
    let mut runtime = runtime(8);
    runtime
        .start(vec![(knight(1), Position::ORIGIN), (goblin(2), Position::new(7, 7))])
        .unwrap();
    runtime.tick().unwrap();

    let plan = TurnPlan::idle()
        .then(TurnCommand::Move(Position::new(7, 0)))
        .then(TurnCommand::UseAbility {
            index: 4,
            targets: vec![Position::new(7, 7)],
        })
        .then(TurnCommand::Move(Position::new(1, 1)));

    assert_eq!(runtime.execute_plan(&plan), 1);
    assert_eq!(runtime.map().position_of(UnitId(1)), Some(Position::new(1, 1)));
}

#[test]
fn speed_change_triggers_one_queue_recalculation() {
    let hero = knight(1);
    let straggler = goblin(2);
    let mut runtime = runtime(6);
    runtime
        .start(vec![
            (Arc::clone(&hero), Position::ORIGIN),
            (Arc::clone(&straggler), Position::new(5, 5)),
        ])
        .unwrap();
    runtime.tick().unwrap();
    let mut turns = runtime.subscribe(Topic::Turn);

    straggler.set_speed(20.0);
    hero.set_speed(2.0);
    for _ in 0..3 {
        runtime.tick().unwrap();
    }

    let recalculations = drain(&mut turns)
        .into_iter()
        .filter(|event| matches!(event, Event::Turn(TurnEvent::QueueRecalculated { .. })))
        .count();
    assert_eq!(recalculations, 1);
    assert_eq!(runtime.scheduler().fastest_unit(), Some(straggler.id()));
}

#[test]
fn reachable_tiles_follow_the_active_unit() {
    let mut runtime = runtime(5);
    runtime
        .start(vec![(knight(1), Position::new(2, 2)), (goblin(2), Position::new(4, 4))])
        .unwrap();
    runtime.tick().unwrap();

    let reachable = runtime.reachable_for_active(1, true).unwrap();
    assert_eq!(reachable.len(), 5);
    assert!(runtime.ability_targets(0).unwrap().is_empty());
}

#[tokio::test]
async fn skirmish_ai_wins_lopsided_battle() {
    let mut runtime = runtime(6);
    let mut battle = runtime.subscribe(Topic::Battle);
    runtime
        .start(vec![
            (knight(1), Position::ORIGIN),
            (knight(2), Position::new(0, 1)),
            (goblin(3), Position::new(5, 5)),
            (goblin(4), Position::new(5, 4)),
        ])
        .unwrap();

    let outcome = drive_battle(&mut runtime, &SkirmishProvider::new(), 5_000)
        .await
        .unwrap();

    assert_eq!(outcome, BattleOutcome::Victory);
    assert_eq!(runtime.alive_in_team(TeamId::ENEMY), 0);
    assert!(runtime.roster().iter().filter(|unit| unit.team() == TeamId::ENEMY).all(|unit| !unit.is_alive()));

    let deaths = drain(&mut battle)
        .into_iter()
        .filter(|event| matches!(event, Event::Battle(BattleEvent::UnitDied { .. })))
        .count();
    assert_eq!(deaths, 2);
}

#[tokio::test]
async fn idle_battle_runs_out_of_ticks() {
    let mut runtime = runtime(6);
    runtime
        .start(vec![(knight(1), Position::ORIGIN), (goblin(2), Position::new(5, 5))])
        .unwrap();

    let err = drive_battle(&mut runtime, &IdleProvider, 100).await.unwrap_err();
    assert!(matches!(err, RuntimeError::TickBudgetExhausted { ticks: 100 }));
}
