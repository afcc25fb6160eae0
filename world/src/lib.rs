#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Tower Siege.

mod combat;
mod enemies;
mod projectiles;
mod status;
mod towers;

use std::{collections::BTreeMap, time::Duration};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tower_siege_core::{
    geometry::scale_floor, CellCoord, Command, EnemyId, EnemyKind, Event, GameConfig, GameOutcome,
    Map, PlacementError, PlayMode, ProjectileId, Resources, SaleError, TowerId, TowerKind,
    UpgradeError, Vec2, WaveId, WELCOME_BANNER,
};
use tracing::{debug, info, warn};

use combat::{FrameLedger, Strike};
use enemies::{EnemyState, Fate};
use projectiles::ProjectileState;
use towers::TowerRegistry;

/// Shared contract of everything that lives in one of the world's pools.
pub(crate) trait Entity {
    /// Current position in world units.
    fn position(&self) -> Vec2;

    /// Reports whether the entity still takes part in the simulation.
    fn is_alive(&self) -> bool;

    /// Advances the entity's internal clocks.
    fn update(&mut self, dt: Duration);
}

/// Represents the authoritative Tower Siege world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: GameConfig,
    map: Map,
    play_mode: PlayMode,
    outcome: GameOutcome,
    resources: Resources,
    enemies: BTreeMap<EnemyId, EnemyState>,
    towers: TowerRegistry,
    projectiles: BTreeMap<ProjectileId, ProjectileState>,
    next_enemy_id: EnemyId,
    next_projectile_id: ProjectileId,
    rng: ChaCha8Rng,
    ledger: FrameLedger,
    tick_index: u64,
}

impl World {
    /// Creates a new world from validated stat tables and a map layout.
    #[must_use]
    pub fn new(config: GameConfig, map: Map) -> Self {
        let resources = Resources {
            money: config.starting_money,
            life: config.starting_life,
            score: 0,
        };
        Self {
            banner: WELCOME_BANNER,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            map,
            play_mode: PlayMode::Running,
            outcome: GameOutcome::InProgress,
            resources,
            enemies: BTreeMap::new(),
            towers: TowerRegistry::new(),
            projectiles: BTreeMap::new(),
            next_enemy_id: EnemyId::new(1),
            next_projectile_id: ProjectileId::new(1),
            ledger: FrameLedger::default(),
            tick_index: 0,
        }
    }

    fn frames_advance(&self) -> bool {
        self.play_mode == PlayMode::Running && self.outcome == GameOutcome::InProgress
    }

    fn allocate_enemy_id(&mut self) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
        id
    }

    fn allocate_projectile_id(&mut self) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id = ProjectileId::new(id.get().saturating_add(1));
        id
    }

    fn publish_resources(&self, out_events: &mut Vec<Event>) {
        out_events.push(Event::ResourcesChanged {
            resources: self.resources,
        });
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, wave: WaveId, out_events: &mut Vec<Event>) {
        let Some(&start) = self.map.path().first() else {
            return;
        };
        let id = self.allocate_enemy_id();
        let state = EnemyState::spawn(
            id,
            kind,
            wave,
            start,
            self.config.enemies.get(kind),
            &self.config.waves,
        );
        debug!(enemy = id.get(), ?kind, wave = wave.get(), health = state.max_health, "enemy spawned");
        let _ = self.enemies.insert(id, state);
        out_events.push(Event::EnemySpawned {
            enemy: id,
            kind,
            wave,
        });
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        let path = self.map.path();
        for enemy in self.enemies.values_mut() {
            if !enemy.is_alive() {
                continue;
            }
            if enemy.advance(path, dt) {
                debug!(enemy = enemy.id.get(), kind = ?enemy.kind, "enemy reached the end of the path");
                self.ledger.escaped.push((enemy.id, enemy.life_damage));
                out_events.push(Event::EnemyEscaped {
                    enemy: enemy.id,
                    life_damage: enemy.life_damage,
                });
                continue;
            }
            enemy.update(dt);
        }

        for tower in self.towers.iter_mut() {
            tower.update(dt);
        }
    }

    fn fire_projectile(&mut self, tower: TowerId, target: EnemyId, out_events: &mut Vec<Event>) {
        let Some(target_position) = self
            .enemies
            .get(&target)
            .filter(|enemy| enemy.is_alive())
            .map(|enemy| enemy.position())
        else {
            debug!(tower = tower.get(), enemy = target.get(), "ignoring shot at missing target");
            return;
        };
        let ready = self
            .towers
            .get(tower)
            .map(|state| state.can_attack())
            .unwrap_or(false);
        if !ready {
            return;
        }

        let id = self.allocate_projectile_id();
        let Some(state) = self.towers.get_mut(tower) else {
            return;
        };
        state.fire();
        let projectile = ProjectileState::launch(id, state, target, target_position);
        out_events.push(Event::ProjectileFired {
            projectile: id,
            tower,
            target,
            kind: projectile.kind,
        });
        let _ = self.projectiles.insert(id, projectile);
    }

    fn advance_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Self {
            config,
            map,
            enemies,
            projectiles,
            rng,
            ledger,
            ..
        } = self;
        let mut strike = Strike::new(enemies, rng, ledger, out_events);
        for projectile in projectiles.values_mut() {
            projectile.advance(dt, map, &config.projectiles, &mut strike);
        }
    }

    fn settle_frame(&mut self, out_events: &mut Vec<Event>) {
        let earned: u32 = self.ledger.killed.iter().map(|(_, reward)| *reward).sum();
        let lost: u32 = self.ledger.escaped.iter().map(|(_, damage)| *damage).sum();
        let changed = !self.ledger.killed.is_empty() || !self.ledger.escaped.is_empty();
        self.ledger.clear();

        if changed {
            self.resources.money = self.resources.money.saturating_add(earned);
            self.resources.score = self.resources.score.saturating_add(u64::from(earned));
            self.resources.life = self
                .resources
                .life
                .saturating_sub(i32::try_from(lost).unwrap_or(i32::MAX));
            self.publish_resources(out_events);
        }

        self.enemies.retain(|_, enemy| enemy.fate() == Fate::Walking);
        self.projectiles.retain(|_, projectile| projectile.is_alive());

        if self.resources.life <= 0 {
            self.outcome = GameOutcome::Defeat;
            info!(tick = self.tick_index, score = self.resources.score, "life exhausted, game over");
            out_events.push(Event::GameOver);
        }
    }

    fn place_tower(
        &mut self,
        kind: TowerKind,
        cell: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<(), PlacementError> {
        if self.outcome != GameOutcome::InProgress {
            return Err(PlacementError::GameEnded);
        }
        if !self.map.in_bounds(cell) {
            return Err(PlacementError::OutOfBounds);
        }
        if !self.map.is_buildable(cell) {
            return Err(PlacementError::NotBuildable);
        }
        if self.towers.occupant(cell).is_some() {
            return Err(PlacementError::Occupied);
        }
        let stats = self.config.towers.get(kind);
        if self.resources.money < stats.cost {
            return Err(PlacementError::InsufficientFunds {
                cost: stats.cost,
                available: self.resources.money,
            });
        }

        let cost = stats.cost;
        self.resources.money -= cost;
        let position = self.map.cell_center(cell);
        let tower = self.towers.insert(kind, cell, position, stats);
        debug!(tower = tower.get(), ?kind, column = cell.column(), row = cell.row(), cost, "tower placed");
        out_events.push(Event::TowerPlaced {
            tower,
            kind,
            cell,
            cost,
        });
        self.publish_resources(out_events);
        Ok(())
    }

    fn upgrade_tower(&mut self, tower: TowerId, out_events: &mut Vec<Event>) -> Result<(), UpgradeError> {
        if self.outcome != GameOutcome::InProgress {
            return Err(UpgradeError::GameEnded);
        }
        let available = self.resources.money;
        let state = self.towers.get_mut(tower).ok_or(UpgradeError::MissingTower)?;
        let cost = state.next_upgrade_cost().ok_or(UpgradeError::MaxLevel)?;
        if available < cost {
            return Err(UpgradeError::InsufficientFunds { cost, available });
        }

        state.upgrade();
        let level = state.level;
        self.resources.money -= cost;
        debug!(tower = tower.get(), level, cost, "tower upgraded");
        out_events.push(Event::TowerUpgraded { tower, level, cost });
        self.publish_resources(out_events);
        Ok(())
    }

    fn sell_tower(&mut self, tower: TowerId, out_events: &mut Vec<Event>) -> Result<(), SaleError> {
        if self.outcome != GameOutcome::InProgress {
            return Err(SaleError::GameEnded);
        }
        let state = self.towers.remove(tower).ok_or(SaleError::MissingTower)?;
        let refund = scale_floor(state.invested, self.config.sell_refund_ratio);
        self.resources.money = self.resources.money.saturating_add(refund);
        debug!(tower = tower.get(), refund, "tower sold");
        out_events.push(Event::TowerSold {
            tower,
            cell: state.cell,
            refund,
        });
        self.publish_resources(out_events);
        Ok(())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Frame commands are ignored while the world is paused or the run has ended.
/// Player commands that cannot be honoured leave the world untouched and emit a
/// rejection event instead.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SetPlayMode { mode } => {
            if world.play_mode != mode {
                world.play_mode = mode;
                info!(?mode, "play mode changed");
                out_events.push(Event::PlayModeChanged { mode });
            }
        }
        Command::Tick { dt } => {
            if world.frames_advance() {
                world.tick(dt, out_events);
            }
        }
        Command::SpawnEnemy { kind, wave } => {
            if world.frames_advance() {
                world.spawn_enemy(kind, wave, out_events);
            }
        }
        Command::FireProjectile { tower, target } => {
            if world.frames_advance() {
                world.fire_projectile(tower, target, out_events);
            }
        }
        Command::EndBurst { tower } => {
            if world.frames_advance() {
                if let Some(state) = world.towers.get_mut(tower) {
                    state.end_burst();
                }
            }
        }
        Command::AdvanceProjectiles { dt } => {
            if world.frames_advance() {
                world.advance_projectiles(dt, out_events);
            }
        }
        Command::SettleFrame => {
            if world.frames_advance() {
                world.settle_frame(out_events);
            }
        }
        Command::PlaceTower { kind, cell } => {
            if let Err(reason) = world.place_tower(kind, cell, out_events) {
                warn!(?kind, column = cell.column(), row = cell.row(), %reason, "tower placement rejected");
                out_events.push(Event::TowerPlacementRejected { kind, cell, reason });
            }
        }
        Command::UpgradeTower { tower } => {
            if let Err(reason) = world.upgrade_tower(tower, out_events) {
                warn!(tower = tower.get(), %reason, "tower upgrade rejected");
                out_events.push(Event::TowerUpgradeRejected { tower, reason });
            }
        }
        Command::SellTower { tower } => {
            if let Err(reason) = world.sell_tower(tower, out_events) {
                warn!(tower = tower.get(), %reason, "tower sale rejected");
                out_events.push(Event::TowerSaleRejected { tower, reason });
            }
        }
        Command::AwardWaveBonus { wave, amount } => {
            if world.outcome == GameOutcome::InProgress {
                world.resources.money = world.resources.money.saturating_add(amount);
                info!(wave = wave.get(), amount, "wave cleared");
                out_events.push(Event::WaveBonusAwarded { wave, amount });
                world.publish_resources(out_events);
            }
        }
        Command::DeclareVictory => {
            let field_clear = world.enemies.values().all(|enemy| !enemy.is_alive());
            if world.outcome == GameOutcome::InProgress && field_clear {
                world.outcome = GameOutcome::Victory;
                info!(score = world.resources.score, life = world.resources.life, "all waves cleared");
                out_events.push(Event::Victory);
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use tower_siege_core::{
        EnemyId, EnemySnapshot, EnemyView, GameConfig, GameOutcome, Map, PlayMode,
        ProjectileView, Resources, TowerCooldownView, TowerId, TowerSnapshot, TowerView,
    };

    use super::{CellCoord, Entity, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Reports the play mode currently active within the world.
    #[must_use]
    pub fn play_mode(world: &World) -> PlayMode {
        world.play_mode
    }

    /// Reports whether the run is still in progress, lost or won.
    #[must_use]
    pub fn outcome(world: &World) -> GameOutcome {
        world.outcome
    }

    /// Player money, life and score.
    #[must_use]
    pub fn resources(world: &World) -> Resources {
        world.resources
    }

    /// Stat tables the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Static path and build grid.
    #[must_use]
    pub fn map(world: &World) -> &Map {
        &world.map
    }

    /// Number of frames advanced so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures a read-only view of the live enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .values()
                .filter(|enemy| enemy.is_alive())
                .map(|enemy| enemy.snapshot())
                .collect(),
        )
    }

    /// Snapshot of a single live enemy.
    #[must_use]
    pub fn enemy(world: &World, enemy: EnemyId) -> Option<EnemySnapshot> {
        world
            .enemies
            .get(&enemy)
            .filter(|state| state.is_alive())
            .map(|state| state.snapshot())
    }

    /// Number of live enemies on the field.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world
            .enemies
            .values()
            .filter(|enemy| enemy.is_alive())
            .count()
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Snapshot of a single tower.
    #[must_use]
    pub fn tower(world: &World, tower: TowerId) -> Option<TowerSnapshot> {
        world.towers.get(tower).map(|state| state.snapshot())
    }

    /// Tower occupying the provided cell, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: CellCoord) -> Option<TowerId> {
        world.towers.occupant(cell)
    }

    /// Captures the attack readiness of every tower.
    #[must_use]
    pub fn tower_cooldowns(world: &World) -> TowerCooldownView {
        TowerCooldownView::from_snapshots(world.towers.iter().map(|tower| tower.cooldown()).collect())
    }

    /// Captures a read-only view of the projectiles in flight.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        ProjectileView::from_snapshots(
            world
                .projectiles
                .values()
                .filter(|projectile| projectile.is_alive())
                .map(|projectile| projectile.snapshot())
                .collect(),
        )
    }
}
