#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tower Siege simulation.
//!
//! This crate defines the message surface that connects the simulation
//! driver, the authoritative world, and pure systems. Drivers and systems
//! submit [`Command`] values describing desired mutations, the world executes
//! those commands via its `apply` entry point, and then broadcasts [`Event`]
//! values describing what actually happened. Systems consume immutable
//! snapshots and respond exclusively with new command batches.

pub mod config;
pub mod geometry;
mod map;

use std::time::Duration;

pub use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use config::{GameConfig, InvalidConfig};
pub use map::{Map, MapError};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Tower Siege.";

/// Describes whether the simulation clock is currently advancing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayMode {
    /// Frames advance enemies, towers and projectiles.
    Running,
    /// Frames are ignored; commands that do not depend on time still apply.
    Paused,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests that the world transition to the provided play mode.
    SetPlayMode {
        /// Mode the world should activate.
        mode: PlayMode,
    },
    /// Advances enemy movement, status effects and tower clocks.
    Tick {
        /// Duration of simulated time that elapsed since the previous frame.
        dt: Duration,
    },
    /// Requests that a new enemy enter the path at its first waypoint.
    SpawnEnemy {
        /// Variant of enemy to create.
        kind: EnemyKind,
        /// Wave whose difficulty scaling applies to the enemy.
        wave: WaveId,
    },
    /// Requests that a tower release a projectile at the provided enemy.
    FireProjectile {
        /// Tower performing the attack.
        tower: TowerId,
        /// Enemy selected as the projectile's target.
        target: EnemyId,
    },
    /// Abandons the remaining shots of a tower's burst.
    EndBurst {
        /// Tower whose burst should end.
        tower: TowerId,
    },
    /// Advances projectile flight and resolves impacts.
    AdvanceProjectiles {
        /// Duration of simulated time that elapsed since the previous frame.
        dt: Duration,
    },
    /// Pays out rewards, charges escapes, removes spent entities and checks for defeat.
    SettleFrame,
    /// Requests construction of a tower on the provided grid cell.
    PlaceTower {
        /// Variant of tower to construct.
        kind: TowerKind,
        /// Cell that will hold the tower.
        cell: CellCoord,
    },
    /// Requests that an existing tower advance to its next level.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Requests that an existing tower be removed in exchange for a refund.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
    /// Credits the bonus earned by clearing a wave.
    AwardWaveBonus {
        /// Wave that was cleared.
        wave: WaveId,
        /// Money credited to the player.
        amount: u32,
    },
    /// Ends the run in victory once every wave has been cleared.
    DeclareVictory,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the frame.
        dt: Duration,
    },
    /// Announces that the simulation entered a new play mode.
    PlayModeChanged {
        /// Mode that became active after processing commands.
        mode: PlayMode,
    },
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Variant of the enemy.
        kind: EnemyKind,
        /// Wave the enemy belongs to.
        wave: WaveId,
    },
    /// Reports damage dealt to an enemy after mitigation.
    EnemyDamaged {
        /// Enemy that lost health.
        enemy: EnemyId,
        /// Health removed from the enemy.
        amount: u32,
    },
    /// Reports that an enemy evaded an incoming hit.
    EnemyDodged {
        /// Enemy that dodged.
        enemy: EnemyId,
    },
    /// Reports that a slow effect now governs an enemy's speed.
    EnemySlowed {
        /// Enemy affected by the slow.
        enemy: EnemyId,
        /// Speed multiplier in effect after merging with existing slows.
        multiplier: f32,
    },
    /// Reports that an enemy's health reached zero.
    EnemyKilled {
        /// Enemy that died.
        enemy: EnemyId,
        /// Money granted once the frame settles.
        reward: u32,
    },
    /// Reports that an enemy reached the end of the path.
    EnemyEscaped {
        /// Enemy that escaped.
        enemy: EnemyId,
        /// Life deducted once the frame settles.
        life_damage: u32,
    },
    /// Reports an area pulse released by a dying enemy.
    TankDetonated {
        /// Enemy that detonated.
        enemy: EnemyId,
        /// Centre of the pulse.
        position: Vec2,
        /// Radius of the pulse.
        radius: f32,
    },
    /// Confirms that a tower released a projectile.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Tower that fired.
        tower: TowerId,
        /// Enemy the projectile is homing on.
        target: EnemyId,
        /// Variant of projectile released.
        kind: ProjectileKind,
    },
    /// Reports that a projectile struck an enemy.
    ProjectileHit {
        /// Projectile that struck.
        projectile: ProjectileId,
        /// Enemy that was struck.
        enemy: EnemyId,
        /// Point of impact.
        position: Vec2,
    },
    /// Reports that a projectile reached an enemy but failed its accuracy roll.
    ///
    /// The projectile keeps flying and never strikes that enemy again.
    ProjectileMissed {
        /// Projectile that missed.
        projectile: ProjectileId,
        /// Enemy that was missed.
        enemy: EnemyId,
    },
    /// Reports that a projectile vanished without striking anything.
    ProjectileExpired {
        /// Projectile that expired.
        projectile: ProjectileId,
        /// Reason the projectile was discarded.
        reason: ExpiryReason,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Variant of tower placed.
        kind: TowerKind,
        /// Cell occupied by the tower.
        cell: CellCoord,
        /// Money spent on construction.
        cost: u32,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Variant of tower requested for placement.
        kind: TowerKind,
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower advanced a level.
    TowerUpgraded {
        /// Tower that was upgraded.
        tower: TowerId,
        /// Level reached by the tower.
        level: u8,
        /// Money spent on the upgrade.
        cost: u32,
    },
    /// Reports that an upgrade request was rejected.
    TowerUpgradeRejected {
        /// Tower targeted by the request.
        tower: TowerId,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Tower that was removed.
        tower: TowerId,
        /// Cell released by the sale.
        cell: CellCoord,
        /// Money refunded to the player.
        refund: u32,
    },
    /// Reports that a sale request was rejected.
    TowerSaleRejected {
        /// Tower targeted by the request.
        tower: TowerId,
        /// Specific reason the sale failed.
        reason: SaleError,
    },
    /// Publishes the player's resources after they changed.
    ResourcesChanged {
        /// Resources after the change.
        resources: Resources,
    },
    /// Confirms that a wave clear bonus was credited.
    WaveBonusAwarded {
        /// Wave that was cleared.
        wave: WaveId,
        /// Money credited.
        amount: u32,
    },
    /// Announces that the player ran out of life.
    GameOver,
    /// Announces that every wave was cleared.
    Victory,
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the projectile identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// One-based wave number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveId(u32);

impl WaveId {
    /// Creates a new wave identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the one-based wave number.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single build grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Enemy variants that can walk the path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Balanced health and speed.
    Basic,
    /// Fragile but quick; may dodge hits and sprint when struck.
    Fast,
    /// Slow and armoured; regenerates and detonates on death.
    Tank,
}

/// Tower variants that can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Slow, heavy shots with splash damage.
    Cannon,
    /// Rapid bursts of piercing bullets.
    Machine,
    /// Magic shots that slow their target.
    Freeze,
}

impl TowerKind {
    /// Every constructible tower variant.
    pub const ALL: [TowerKind; 3] = [TowerKind::Cannon, TowerKind::Machine, TowerKind::Freeze];

    /// Projectile released by the tower.
    #[must_use]
    pub const fn projectile(self) -> ProjectileKind {
        match self {
            Self::Cannon => ProjectileKind::CannonBall,
            Self::Machine => ProjectileKind::Bullet,
            Self::Freeze => ProjectileKind::IceBall,
        }
    }

    /// Lower-case name used by configuration files and the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cannon => "cannon",
            Self::Machine => "machine",
            Self::Freeze => "freeze",
        }
    }
}

impl std::str::FromStr for TowerKind {
    type Err = UnknownTowerKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TowerKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownTowerKind(value.to_owned()))
    }
}

/// Error returned when parsing an unrecognised tower name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown tower kind `{0}` (expected cannon, machine or freeze)")]
pub struct UnknownTowerKind(pub String);

/// Projectile variants released by towers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Homing shell that splashes on impact.
    CannonBall,
    /// Fast round that pierces several enemies.
    Bullet,
    /// Homing shard that slows its target.
    IceBall,
}

/// Mitigation channel used when an enemy takes damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    /// Reduced by armor.
    Physical,
    /// Reduced by magic resistance.
    Magic,
}

/// Reasons a projectile may vanish without an impact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpiryReason {
    /// The projectile exceeded its maximum lifetime.
    Lifetime,
    /// The projectile left the playable bounds.
    OutOfBounds,
}

/// Player-owned resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// Currency available for construction and upgrades.
    pub money: u32,
    /// Remaining life; the run is lost once it reaches zero.
    pub life: i32,
    /// Accumulated score; never decreases.
    pub score: u64,
}

/// Terminal state of the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    /// The run is still being played.
    InProgress,
    /// Life dropped to zero.
    Defeat,
    /// Every wave was cleared.
    Victory,
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum PlacementError {
    /// The run has already ended.
    #[error("the run has ended")]
    GameEnded,
    /// The requested cell lies outside the map grid.
    #[error("cell lies outside the map")]
    OutOfBounds,
    /// The requested cell is part of the path or otherwise unbuildable.
    #[error("cell is not buildable")]
    NotBuildable,
    /// The requested cell already holds a tower.
    #[error("cell already holds a tower")]
    Occupied,
    /// The player cannot afford the tower.
    #[error("insufficient money: need {cost}, have {available}")]
    InsufficientFunds {
        /// Price of the tower.
        cost: u32,
        /// Money held by the player.
        available: u32,
    },
}

/// Reasons a tower upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum UpgradeError {
    /// The run has already ended.
    #[error("the run has ended")]
    GameEnded,
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    MissingTower,
    /// The tower already reached its maximum level.
    #[error("tower is already at its maximum level")]
    MaxLevel,
    /// The player cannot afford the upgrade.
    #[error("insufficient money: need {cost}, have {available}")]
    InsufficientFunds {
        /// Price of the upgrade.
        cost: u32,
        /// Money held by the player.
        available: u32,
    },
}

/// Reasons a tower sale request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum SaleError {
    /// The run has already ended.
    #[error("the run has ended")]
    GameEnded,
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    MissingTower,
}

/// Reasons a request to begin a wave may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum WaveStartError {
    /// The run has already ended.
    #[error("the run has ended")]
    GameEnded,
    /// The current wave has not been completed yet.
    #[error("wave in progress ({0:?})")]
    WaveInProgress(WaveState),
    /// Every wave has already been started.
    #[error("no waves remaining")]
    NoWavesRemaining,
}

/// Phase of the wave state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveState {
    /// No wave has been started, or the next one awaits a manual start.
    Waiting,
    /// Counting down the current wave's preparation time.
    Preparing,
    /// Emitting enemies according to the wave's directives.
    Spawning,
    /// Every enemy has been emitted; waiting for the field to clear.
    Active,
    /// The wave was cleared and its bonus paid.
    Completed,
}

/// Instruction to emit a batch of enemies during a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnDirective {
    /// Variant of enemy to emit.
    pub kind: EnemyKind,
    /// Number of enemies emitted by the directive.
    pub count: u32,
    /// Time between consecutive emissions.
    pub spawn_interval: Duration,
    /// Time after the wave starts before the directive activates.
    pub delay: Duration,
}

/// Fully generated description of a single wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WavePlan {
    /// Wave described by the plan.
    pub wave: WaveId,
    /// Spawn directives in emission priority order.
    pub directives: Vec<SpawnDirective>,
    /// Countdown before the wave starts spawning.
    pub preparation_time: Duration,
    /// Multiplier applied to the wave clear bonus.
    pub reward_multiplier: f32,
}

impl WavePlan {
    /// Total number of enemies the wave emits.
    #[must_use]
    pub fn total_enemies(&self) -> u32 {
        self.directives.iter().map(|directive| directive.count).sum()
    }

    /// Number of enemies of the provided variant the wave emits.
    #[must_use]
    pub fn count_of(&self, kind: EnemyKind) -> u32 {
        self.directives
            .iter()
            .filter(|directive| directive.kind == kind)
            .map(|directive| directive.count)
            .sum()
    }
}

/// Read-only summary of wave progression.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveProgress {
    /// Current wave number; zero before the first wave starts.
    pub wave: u32,
    /// Number of waves in the run.
    pub total_waves: u32,
    /// Phase of the state machine.
    pub state: WaveState,
    /// Enemies emitted so far by the current wave.
    pub spawned: u32,
    /// Enemies the current wave emits in total.
    pub total_enemies: u32,
    /// Preparation time left; zero outside the preparing phase.
    pub preparation_remaining: Duration,
}

impl WaveProgress {
    /// Fraction of the current wave that has been emitted, in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.total_enemies == 0 {
            return if self.wave == 0 { 0.0 } else { 1.0 };
        }
        (self.spawned as f32 / self.total_enemies as f32).min(1.0)
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Variant of the enemy.
    pub kind: EnemyKind,
    /// Position in world units.
    pub position: Vec2,
    /// Remaining health.
    pub health: u32,
    /// Health at spawn time.
    pub max_health: u32,
    /// Index of the waypoint the enemy is walking towards.
    pub path_index: usize,
    /// Speed multiplier imposed by slows; `1.0` when unaffected.
    pub slow_multiplier: f32,
    /// Time left on the active slow.
    pub slow_remaining: Duration,
}

impl EnemySnapshot {
    /// Remaining health as a fraction of maximum health.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            return 0.0;
        }
        self.health as f32 / self.max_health as f32
    }
}

/// Read-only snapshot describing all live enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Variant of tower that was constructed.
    pub kind: TowerKind,
    /// Cell occupied by the tower.
    pub cell: CellCoord,
    /// Centre of the tower in world units.
    pub position: Vec2,
    /// Current level, starting at one.
    pub level: u8,
    /// Damage dealt by each projectile.
    pub damage: u32,
    /// Targeting radius in world units.
    pub range: f32,
    /// Time between attacks.
    pub attack_interval: Duration,
    /// Price of the next upgrade, or `None` at maximum level.
    pub upgrade_cost: Option<u32>,
    /// Money spent on construction and upgrades.
    pub invested: u32,
}

/// Read-only snapshot describing all towers placed on the map.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Number of towers captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Attack readiness of a single tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerCooldownSnapshot {
    /// Identifier of the tower described by the snapshot.
    pub tower: TowerId,
    /// Variant of the tower.
    pub kind: TowerKind,
    /// Indicates whether the tower may fire this frame.
    pub ready: bool,
    /// Indicates whether the next shot belongs to an unfinished burst.
    pub burst_pending: bool,
}

/// Read-only view of tower cooldowns, sorted by tower identifier.
#[derive(Clone, Debug, Default)]
pub struct TowerCooldownView {
    snapshots: Vec<TowerCooldownSnapshot>,
}

impl TowerCooldownView {
    /// Creates a new cooldown view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerCooldownSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.tower);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerCooldownSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerCooldownSnapshot> {
        self.snapshots
    }
}

/// Target assignment computed for a tower during the current frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTarget {
    /// Tower that acquired the target.
    pub tower: TowerId,
    /// Enemy selected by the tower.
    pub enemy: EnemyId,
    /// Centre of the tower in world units.
    pub tower_position: Vec2,
    /// Position of the enemy when the target was selected.
    pub enemy_position: Vec2,
}

/// Immutable representation of a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile.
    pub id: ProjectileId,
    /// Variant of the projectile.
    pub kind: ProjectileKind,
    /// Tower that released the projectile.
    pub tower: TowerId,
    /// Position in world units.
    pub position: Vec2,
    /// Enemy the projectile homes on; `None` once it flies ballistically.
    pub target: Option<EnemyId>,
}

/// Read-only snapshot describing all projectiles in flight.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured projectile snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Number of projectiles captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
