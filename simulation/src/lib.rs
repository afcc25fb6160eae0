#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame driver and player-facing boundary of the Tower Siege simulation.
//!
//! [`Simulation::update`] runs one fixed-order pass per frame: wave spawns,
//! enemy movement, targeting and firing, projectile resolution, settlement and
//! terminal checks. Player commands return typed rejections instead of
//! mutating anything when they cannot be honoured.

pub mod config;

use std::time::Duration;

use tower_siege_core::{
    geometry, CellCoord, Command, EnemyView, Event, GameConfig, GameOutcome, Map, PlacementError,
    PlayMode, ProjectileView, Resources, SaleError, TowerId, TowerKind, TowerTarget, TowerView,
    UpgradeError, WaveId, WaveProgress, WaveStartError,
};
use tower_siege_system_tower_combat::TowerCombat;
use tower_siege_system_tower_targeting::TowerTargeting;
use tower_siege_system_wave_manager::{self as wave_manager, WaveManager};
use tower_siege_world::{self as world, query, World};
use tracing::{debug, info};

pub use config::ConfigError;

/// Complete simulation: world state plus the systems that drive it.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    waves: WaveManager,
    targeting: TowerTargeting,
    combat: TowerCombat,
    targets: Vec<TowerTarget>,
    commands: Vec<Command>,
    events: Vec<Event>,
}

impl Simulation {
    /// Creates a simulation whose map is built from the configuration.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        let map = Map::from_settings(&config.map)?;
        Self::with_map(config, map)
    }

    /// Creates a simulation over an explicit map layout.
    pub fn with_map(config: GameConfig, map: Map) -> Result<Self, ConfigError> {
        config.validate()?;
        let waves = WaveManager::new(wave_manager::Config::new(
            config.waves.total_waves,
            config.waves.clear_bonus,
            config.waves.auto_advance,
        ));
        info!(
            seed = config.seed,
            waves = config.waves.total_waves,
            money = config.starting_money,
            life = config.starting_life,
            "simulation created"
        );
        Ok(Self {
            world: World::new(config, map),
            waves,
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            targets: Vec::new(),
            commands: Vec::new(),
            events: Vec::new(),
        })
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// Negative or non-finite values advance nothing.
    pub fn update(&mut self, dt: f32) {
        self.advance(geometry::seconds(dt));
    }

    /// Advances the simulation by one frame of length `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.events.clear();

        let play_mode = query::play_mode(&self.world);
        if play_mode != PlayMode::Running || self.is_over() {
            return;
        }

        self.waves.handle(dt, play_mode, &mut self.commands);
        self.flush_commands();

        self.apply(Command::Tick { dt });

        self.targeting.handle(
            play_mode,
            &query::tower_view(&self.world),
            &query::enemy_view(&self.world),
            &mut self.targets,
        );
        self.combat.handle(
            play_mode,
            query::tower_cooldowns(&self.world),
            &self.targets,
            &mut self.commands,
        );
        self.flush_commands();

        self.apply(Command::AdvanceProjectiles { dt });
        self.apply(Command::SettleFrame);

        self.resolve_wave_progress();
    }

    /// Places a tower, spending its build cost.
    pub fn place_tower(&mut self, kind: TowerKind, cell: CellCoord) -> Result<TowerId, PlacementError> {
        let first = self.events.len();
        self.apply(Command::PlaceTower { kind, cell });
        self.events[first..]
            .iter()
            .find_map(|event| match event {
                Event::TowerPlaced { tower, .. } => Some(Ok(*tower)),
                Event::TowerPlacementRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(PlacementError::GameEnded))
    }

    /// Upgrades a tower and reports its new level.
    pub fn upgrade_tower(&mut self, tower: TowerId) -> Result<u8, UpgradeError> {
        let first = self.events.len();
        self.apply(Command::UpgradeTower { tower });
        self.events[first..]
            .iter()
            .find_map(|event| match event {
                Event::TowerUpgraded { level, .. } => Some(Ok(*level)),
                Event::TowerUpgradeRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(UpgradeError::MissingTower))
    }

    /// Sells a tower and reports the refund paid.
    pub fn sell_tower(&mut self, tower: TowerId) -> Result<u32, SaleError> {
        let first = self.events.len();
        self.apply(Command::SellTower { tower });
        self.events[first..]
            .iter()
            .find_map(|event| match event {
                Event::TowerSold { refund, .. } => Some(Ok(*refund)),
                Event::TowerSaleRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(SaleError::MissingTower))
    }

    /// Starts the next wave's preparation countdown.
    pub fn start_next_wave(&mut self) -> Result<WaveId, WaveStartError> {
        if self.is_over() {
            return Err(WaveStartError::GameEnded);
        }
        self.waves.start_next_wave()?;
        self.waves
            .current_wave()
            .ok_or(WaveStartError::NoWavesRemaining)
    }

    /// Skips the preparation countdown, starting the next wave if none is pending.
    pub fn force_start_wave(&mut self) -> Result<WaveId, WaveStartError> {
        if self.is_over() {
            return Err(WaveStartError::GameEnded);
        }
        self.waves.force_start()?;
        self.waves
            .current_wave()
            .ok_or(WaveStartError::NoWavesRemaining)
    }

    /// Suspends frame updates.
    pub fn pause(&mut self) {
        self.apply(Command::SetPlayMode {
            mode: PlayMode::Paused,
        });
    }

    /// Resumes frame updates.
    pub fn resume(&mut self) {
        self.apply(Command::SetPlayMode {
            mode: PlayMode::Running,
        });
    }

    /// Player money, life and score.
    #[must_use]
    pub fn resources(&self) -> Resources {
        query::resources(&self.world)
    }

    /// Whether the run is in progress, lost or won.
    #[must_use]
    pub fn outcome(&self) -> GameOutcome {
        query::outcome(&self.world)
    }

    /// Reports whether the run has ended in defeat or victory.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.outcome() != GameOutcome::InProgress
    }

    /// Current play mode.
    #[must_use]
    pub fn play_mode(&self) -> PlayMode {
        query::play_mode(&self.world)
    }

    /// Wave index, phase, spawn progress and preparation time remaining.
    #[must_use]
    pub fn wave_progress(&self) -> WaveProgress {
        self.waves.progress()
    }

    /// Live enemies ordered by identifier.
    #[must_use]
    pub fn enemies(&self) -> EnemyView {
        query::enemy_view(&self.world)
    }

    /// Placed towers ordered by identifier.
    #[must_use]
    pub fn towers(&self) -> TowerView {
        query::tower_view(&self.world)
    }

    /// Projectiles in flight ordered by identifier.
    #[must_use]
    pub fn projectiles(&self) -> ProjectileView {
        query::projectile_view(&self.world)
    }

    /// Tower occupying `cell`, if any.
    #[must_use]
    pub fn tower_at(&self, cell: CellCoord) -> Option<TowerId> {
        query::tower_at(&self.world, cell)
    }

    /// Static path and build grid.
    #[must_use]
    pub fn map(&self) -> &Map {
        query::map(&self.world)
    }

    /// Read access to the underlying world for callers that need raw queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Events emitted by the latest frame and any commands issued after it.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    fn apply(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.events);
    }

    fn flush_commands(&mut self) {
        for command in std::mem::take(&mut self.commands) {
            self.apply(command);
        }
    }

    fn resolve_wave_progress(&mut self) {
        if self.is_over() || query::enemy_count(&self.world) > 0 {
            return;
        }

        if let Some(cleared) = self.waves.complete_wave() {
            debug!(wave = cleared.wave.get(), bonus = cleared.bonus, "paying wave bonus");
            self.apply(Command::AwardWaveBonus {
                wave: cleared.wave,
                amount: cleared.bonus,
            });
        }

        if self.waves.is_finished() {
            self.apply(Command::DeclareVictory);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_siege_core::Vec2;

    #[test]
    fn paused_simulation_does_not_advance() {
        let mut simulation = Simulation::new(GameConfig::default()).expect("default config");
        let _ = simulation.force_start_wave().expect("wave starts");
        simulation.pause();

        for _ in 0..100 {
            simulation.update(0.1);
        }

        assert!(simulation.enemies().is_empty());
        assert_eq!(simulation.wave_progress().spawned, 0);

        simulation.resume();
        for _ in 0..20 {
            simulation.update(0.1);
        }
        assert_eq!(simulation.enemies().len(), 1);
    }

    #[test]
    fn negative_and_non_finite_frames_are_ignored() {
        let mut simulation = Simulation::new(GameConfig::default()).expect("default config");
        let _ = simulation.force_start_wave().expect("wave starts");

        simulation.update(-1.0);
        simulation.update(f32::NAN);
        simulation.update(f32::INFINITY);

        assert_eq!(simulation.wave_progress().spawned, 0);
    }

    #[test]
    fn rejected_commands_surface_typed_errors() {
        let mut simulation = Simulation::new(GameConfig::default()).expect("default config");

        assert_eq!(
            simulation.place_tower(TowerKind::Cannon, CellCoord::new(3, 3)),
            Err(PlacementError::NotBuildable)
        );
        assert_eq!(
            simulation.upgrade_tower(TowerId::new(9)),
            Err(UpgradeError::MissingTower)
        );
        assert_eq!(
            simulation.sell_tower(TowerId::new(9)),
            Err(SaleError::MissingTower)
        );
        assert_eq!(simulation.resources().money, 500);
    }

    #[test]
    fn second_wave_cannot_start_while_first_is_running() {
        let mut simulation = Simulation::new(GameConfig::default()).expect("default config");

        assert_eq!(simulation.start_next_wave(), Ok(WaveId::new(1)));
        assert!(matches!(
            simulation.start_next_wave(),
            Err(WaveStartError::WaveInProgress(_))
        ));
        assert!(simulation.wave_progress().preparation_remaining > Duration::ZERO);
    }

    #[test]
    fn invalid_map_is_reported() {
        let mut config = GameConfig::default();
        config.map.waypoints = vec![[0.0, 0.0]];

        let error = Simulation::new(config).expect_err("one waypoint is not a path");
        assert!(matches!(error, ConfigError::Map(_)));

        let map = Map::new(
            vec![Vec2::new(0.0, 100.0), Vec2::new(1000.0, 100.0)],
            32,
            8,
            32.0,
            20.0,
        )
        .expect("valid map");
        let config = GameConfig {
            starting_life: 0,
            ..GameConfig::default()
        };
        assert!(matches!(
            Simulation::with_map(config, map),
            Err(ConfigError::Invalid(_))
        ));
    }
}
