//! Built-in skirmish scenario.
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use battle_core::{BattleMap, Position, TeamId, TileGraph, UnitId};
use battle_runtime::{BattleUnit, DamageAbility, SingleTargetDelivery, UnitStats};

const ARENA: &[&str] = &[
    "..........",
    "...~~.....",
    "...~~..#..",
    ".......#..",
    "..w....#..",
    "..ww......",
    "......~...",
    "..........",
];

pub struct Scenario {
    pub map: BattleMap,
    pub roster: Vec<(Arc<BattleUnit>, Position)>,
}

impl Scenario {
    /// The default arena, or the layout in `BATTLE_MAP_FILE` when set.
    pub fn load() -> Result<Self> {
        let graph = match std::env::var("BATTLE_MAP_FILE") {
            Ok(path) => {
                let layout = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read map file {path}"))?;
                let rows: Vec<&str> = layout.lines().filter(|row| !row.is_empty()).collect();
                TileGraph::from_rows(&rows)?
            }
            Err(_) => TileGraph::from_rows(ARENA)?,
        };

        let roster = Self::deploy(&graph)?;
        Ok(Self {
            map: BattleMap::new(graph),
            roster,
        })
    }

    /// Players take the leftmost walkable tiles, enemies the rightmost.
    fn deploy(graph: &TileGraph) -> Result<Vec<(Arc<BattleUnit>, Position)>> {
        let mut walkable: Vec<Position> = graph
            .tiles()
            .filter(|tile| tile.is_walkable())
            .map(|tile| tile.position())
            .collect();
        walkable.sort_by_key(|position| (position.x, position.y));

        let players = [warrior(1), archer(2), mage(3)];
        let enemies = [brute(11), brute(12), skirmisher(13)];
        if walkable.len() < players.len() + enemies.len() {
            bail!("map has only {} walkable tiles", walkable.len());
        }

        let left = walkable.iter().copied();
        let right = walkable.iter().rev().copied();
        Ok(players
            .into_iter()
            .zip(left)
            .chain(enemies.into_iter().zip(right))
            .collect())
    }
}

fn warrior(id: u32) -> Arc<BattleUnit> {
    Arc::new(
        BattleUnit::new(
            UnitId(id),
            "warrior",
            TeamId::PLAYER,
            UnitStats {
                attack: 14.0,
                defense: 12.0,
                magic_defense: 4.0,
                speed: 6.0,
                movement: 3,
                max_health: 60.0,
                max_mana: 30.0,
                ..UnitStats::default()
            },
        )
        .with_ability(DamageAbility::new("slash"))
        .with_ability(DamageAbility::new("cleave").with_ratio(2.0).with_mana_cost(10.0).heavy()),
    )
}

fn archer(id: u32) -> Arc<BattleUnit> {
    Arc::new(
        BattleUnit::new(
            UnitId(id),
            "archer",
            TeamId::PLAYER,
            UnitStats {
                attack: 10.0,
                defense: 4.0,
                speed: 9.0,
                movement: 4,
                max_health: 40.0,
                max_mana: 40.0,
                ..UnitStats::default()
            },
        )
        .with_ability(
            DamageAbility::new("volley")
                .with_ratio(1.0)
                .with_mana_cost(4.0)
                .with_delivery(SingleTargetDelivery::new(4, false)),
        ),
    )
}

fn mage(id: u32) -> Arc<BattleUnit> {
    Arc::new(
        BattleUnit::new(
            UnitId(id),
            "mage",
            TeamId::PLAYER,
            UnitStats {
                magic: 16.0,
                magic_defense: 10.0,
                speed: 5.0,
                movement: 2,
                max_health: 35.0,
                max_mana: 60.0,
                ..UnitStats::default()
            },
        )
        .with_ability(
            DamageAbility::new("firebolt")
                .magical()
                .with_mana_cost(8.0)
                .with_delivery(SingleTargetDelivery::new(3, false)),
        ),
    )
}

fn brute(id: u32) -> Arc<BattleUnit> {
    Arc::new(
        BattleUnit::new(
            UnitId(id),
            "brute",
            TeamId::ENEMY,
            UnitStats {
                attack: 12.0,
                defense: 8.0,
                speed: 4.0,
                movement: 2,
                max_health: 50.0,
                max_mana: 20.0,
                ..UnitStats::default()
            },
        )
        .with_ability(DamageAbility::new("club")),
    )
}

fn skirmisher(id: u32) -> Arc<BattleUnit> {
    Arc::new(
        BattleUnit::new(
            UnitId(id),
            "skirmisher",
            TeamId::ENEMY,
            UnitStats {
                attack: 8.0,
                defense: 3.0,
                speed: 10.0,
                movement: 4,
                max_health: 30.0,
                max_mana: 30.0,
                ..UnitStats::default()
            },
        )
        .with_ability(
            DamageAbility::new("javelin")
                .with_mana_cost(3.0)
                .with_delivery(SingleTargetDelivery::new(2, true)),
        ),
    )
}
