use std::time::Duration;

use tower_siege_core::{
    CellCoord, Command, EnemyId, EnemyKind, Event, GameConfig, Map, PlayMode, TowerId, TowerKind,
    TowerTarget, Vec2, WaveId,
};
use tower_siege_system_tower_targeting::TowerTargeting;
use tower_siege_world::{self as world, query, World};

#[test]
fn deterministic_replay_follows_enemies_and_respects_pause() {
    let first = replay(scripted_commands());
    let second = replay(scripted_commands());

    assert_eq!(first, second, "replay diverged between runs");

    let after_spawns = &first.assignments[4];
    assert_eq!(
        after_spawns
            .iter()
            .map(|target| target.enemy)
            .collect::<Vec<_>>(),
        vec![EnemyId::new(1)],
        "both enemies sit on the spawn point, the first spawned wins"
    );

    let after_tick = &first.assignments[5];
    assert_eq!(after_tick.len(), 1);
    assert_eq!(after_tick[0].tower, TowerId::new(1));
    assert_eq!(
        after_tick[0].enemy,
        EnemyId::new(2),
        "slower enemy stays nearer the tower"
    );

    let paused = &first.assignments[6];
    assert!(paused.is_empty(), "paused play must clear targets");
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    events: Vec<Event>,
    assignments: Vec<Vec<TowerTarget>>,
}

fn replay(commands: Vec<Command>) -> ReplayOutcome {
    let mut world = World::new(GameConfig::default(), straight_map());
    let mut targeting = TowerTargeting::new();
    let mut current_targets = Vec::new();
    let mut assignments = Vec::new();
    let mut events = Vec::new();

    for command in commands {
        world::apply(&mut world, command, &mut events);

        targeting.handle(
            query::play_mode(&world),
            &query::tower_view(&world),
            &query::enemy_view(&world),
            &mut current_targets,
        );
        assignments.push(current_targets.clone());
    }

    ReplayOutcome {
        events,
        assignments,
    }
}

fn scripted_commands() -> Vec<Command> {
    vec![
        Command::PlaceTower {
            kind: TowerKind::Cannon,
            cell: CellCoord::new(0, 1),
        },
        Command::PlaceTower {
            kind: TowerKind::Machine,
            cell: CellCoord::new(25, 5),
        },
        Command::SpawnEnemy {
            kind: EnemyKind::Fast,
            wave: WaveId::new(1),
        },
        Command::SetPlayMode {
            mode: PlayMode::Running,
        },
        Command::SpawnEnemy {
            kind: EnemyKind::Basic,
            wave: WaveId::new(1),
        },
        Command::Tick {
            dt: Duration::from_millis(500),
        },
        Command::SetPlayMode {
            mode: PlayMode::Paused,
        },
    ]
}

fn straight_map() -> Map {
    Map::new(
        vec![Vec2::new(0.0, 100.0), Vec2::new(1000.0, 100.0)],
        32,
        8,
        32.0,
        20.0,
    )
    .expect("valid map")
}
