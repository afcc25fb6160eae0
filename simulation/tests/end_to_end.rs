use tower_siege_core::{
    CellCoord, EnemyKind, Event, GameConfig, GameOutcome, Map, TowerKind, Vec2, WaveState,
};
use tower_siege_simulation::Simulation;

const FRAME_SECONDS: f32 = 0.1;

#[test]
fn single_cannon_clears_the_first_wave_and_wins() {
    let mut simulation = Simulation::with_map(single_wave_config(), straight_map())
        .expect("valid configuration");

    let tower = simulation
        .place_tower(TowerKind::Cannon, CellCoord::new(15, 4))
        .expect("cell is buildable");
    assert_eq!(simulation.resources().money, 400);
    assert_eq!(simulation.tower_at(CellCoord::new(15, 4)), Some(tower));

    let first_wave = simulation.start_next_wave().expect("first wave starts");
    assert_eq!(simulation.wave_progress().total_enemies, 7);
    assert_eq!(simulation.wave_progress().wave, first_wave.get());

    let mut kills = 0;
    let mut escapes = 0;
    for _ in 0..1_000 {
        simulation.update(FRAME_SECONDS);
        for event in simulation.events() {
            match event {
                Event::EnemyKilled { reward, .. } => {
                    assert_eq!(*reward, 10);
                    kills += 1;
                }
                Event::EnemyEscaped { .. } => escapes += 1,
                _ => {}
            }
        }
        if simulation.is_over() {
            break;
        }
    }

    assert_eq!(simulation.outcome(), GameOutcome::Victory);
    assert_eq!(kills, 7);
    assert_eq!(escapes, 0);
    let resources = simulation.resources();
    assert_eq!(resources.money, 470);
    assert_eq!(resources.life, 20);
    assert_eq!(resources.score, 70);
    assert_eq!(simulation.wave_progress().state, WaveState::Completed);
    assert!(simulation.enemies().is_empty());
}

#[test]
fn unguarded_path_loses_life_per_escape() {
    let config = GameConfig {
        starting_life: 5,
        ..single_wave_config()
    };
    let mut simulation = Simulation::with_map(config, straight_map()).expect("valid configuration");
    let _ = simulation.force_start_wave().expect("first wave starts");

    let mut game_over = false;
    for _ in 0..1_000 {
        simulation.update(FRAME_SECONDS);
        game_over |= simulation.events().contains(&Event::GameOver);
        if simulation.is_over() {
            break;
        }
    }

    assert!(game_over);
    assert_eq!(simulation.outcome(), GameOutcome::Defeat);
    assert_eq!(simulation.resources().life, 0);
    assert_eq!(simulation.resources().money, 500);
    assert!(simulation.force_start_wave().is_err());
}

#[test]
fn selling_right_after_placement_refunds_three_quarters() {
    let mut simulation = Simulation::with_map(single_wave_config(), straight_map())
        .expect("valid configuration");

    let tower = simulation
        .place_tower(TowerKind::Machine, CellCoord::new(10, 1))
        .expect("cell is buildable");
    assert_eq!(simulation.sell_tower(tower), Ok(56));

    assert_eq!(simulation.resources().money, 500 - 75 + 56);
    assert!(simulation.towers().is_empty());
    assert_eq!(simulation.tower_at(CellCoord::new(10, 1)), None);
}

#[test]
fn wave_bonus_is_paid_when_the_field_clears() {
    let config = GameConfig {
        waves: tower_siege_core::config::WaveSettings {
            total_waves: 2,
            clear_bonus: 50,
            ..Default::default()
        },
        ..GameConfig::default()
    };
    let mut simulation = Simulation::with_map(config, straight_map()).expect("valid configuration");
    let _ = simulation
        .place_tower(TowerKind::Cannon, CellCoord::new(15, 4))
        .expect("cell is buildable");
    let _ = simulation.force_start_wave().expect("first wave starts");

    let mut bonus = None;
    for _ in 0..1_000 {
        simulation.update(FRAME_SECONDS);
        bonus = bonus.or_else(|| {
            simulation.events().iter().find_map(|event| match event {
                Event::WaveBonusAwarded { amount, .. } => Some(*amount),
                _ => None,
            })
        });
        if bonus.is_some() {
            break;
        }
    }

    assert_eq!(bonus, Some(50));
    assert_eq!(simulation.resources().money, 400 + 70 + 50);
    assert_eq!(simulation.outcome(), GameOutcome::InProgress);
    assert_eq!(simulation.wave_progress().state, WaveState::Completed);
    assert_eq!(
        tower_siege_world::query::config(simulation.world()).enemies.get(EnemyKind::Basic).reward,
        10
    );
}

fn single_wave_config() -> GameConfig {
    let mut config = GameConfig::default();
    config.waves.total_waves = 1;
    config.waves.clear_bonus = 0;
    config
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
