//! Immutable per-variant stat tables loaded once at startup.
//!
//! Every table implements [`Default`] with the stock balance, and every
//! container is `#[serde(default)]` so configuration files only need to
//! mention the sections they override. Individual stat blocks are replaced
//! wholesale when present.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{DamageType, EnemyKind, TowerKind, WaveId};

/// Longest campaign a configuration may request; every plan is generated up front.
pub const MAX_WAVES: u32 = 1_000;

/// Complete balance and layout description of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for the random source driving dodge and critical rolls.
    pub seed: u64,
    /// Money available before the first tower is placed.
    pub starting_money: u32,
    /// Life available at the start of the run.
    pub starting_life: i32,
    /// Fraction of the invested money refunded when a tower is sold.
    pub sell_refund_ratio: f32,
    /// Enemy stat table.
    pub enemies: EnemyTable,
    /// Tower stat table.
    pub towers: TowerTable,
    /// Projectile flight limits.
    pub projectiles: ProjectileSettings,
    /// Wave pacing and difficulty scaling.
    pub waves: WaveSettings,
    /// Map grid and path layout.
    pub map: MapSettings,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0x7057_5e1e,
            starting_money: 500,
            starting_life: 20,
            sell_refund_ratio: 0.75,
            enemies: EnemyTable::default(),
            towers: TowerTable::default(),
            projectiles: ProjectileSettings::default(),
            waves: WaveSettings::default(),
            map: MapSettings::default(),
        }
    }
}

impl GameConfig {
    /// Checks that every value lies in a range the simulation can honour.
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.starting_life <= 0 {
            return Err(InvalidConfig::NonPositive("starting_life"));
        }
        unit_interval("sell_refund_ratio", self.sell_refund_ratio)?;
        for kind in [EnemyKind::Basic, EnemyKind::Fast, EnemyKind::Tank] {
            self.enemies.get(kind).validate()?;
        }
        for kind in TowerKind::ALL {
            self.towers.get(kind).validate()?;
        }
        positive("projectiles.hit_radius", self.projectiles.hit_radius)?;
        positive(
            "projectiles.max_lifetime_secs",
            self.projectiles.max_lifetime_secs,
        )?;
        self.waves.validate()
    }
}

/// Reasons a configuration is refused.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum InvalidConfig {
    /// A value that must be strictly positive was zero or negative.
    #[error("`{0}` must be positive")]
    NonPositive(&'static str),
    /// A value that must not be negative was below zero.
    #[error("`{0}` must not be negative")]
    Negative(&'static str),
    /// A growth factor would make upgrades or waves weaker instead of stronger.
    #[error("`{0}` must be at least 1")]
    BelowOne(&'static str),
    /// A ratio fell outside `[0, 1]`.
    #[error("`{field}` must lie within [0, 1], found {value}")]
    OutOfUnitRange {
        /// Name of the offending setting.
        field: &'static str,
        /// Value that was provided.
        value: f32,
    },
    /// A count exceeds what the simulation is willing to allocate.
    #[error("`{field}` must not exceed {max}")]
    TooLarge {
        /// Name of the offending setting.
        field: &'static str,
        /// Largest accepted value.
        max: u32,
    },
}

fn positive(field: &'static str, value: f32) -> Result<(), InvalidConfig> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InvalidConfig::NonPositive(field))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), InvalidConfig> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(InvalidConfig::Negative(field))
    }
}

fn at_least_one(field: &'static str, value: f32) -> Result<(), InvalidConfig> {
    if value.is_finite() && value >= 1.0 {
        Ok(())
    } else {
        Err(InvalidConfig::BelowOne(field))
    }
}

/// Strictly positive fraction: `(0, 1]`.
fn fraction(field: &'static str, value: f32) -> Result<(), InvalidConfig> {
    positive(field, value)?;
    unit_interval(field, value)
}

fn unit_interval(field: &'static str, value: f32) -> Result<(), InvalidConfig> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(InvalidConfig::OutOfUnitRange { field, value })
    }
}

fn certain_hit() -> f32 {
    1.0
}

fn secs(value: f32) -> Duration {
    crate::geometry::seconds(value)
}

/// Stats for each enemy variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTable {
    /// Basic enemy stats.
    pub basic: EnemyStats,
    /// Fast enemy stats.
    pub fast: EnemyStats,
    /// Tank enemy stats.
    pub tank: EnemyStats,
}

impl EnemyTable {
    /// Stats for the provided variant.
    #[must_use]
    pub fn get(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Basic => &self.basic,
            EnemyKind::Fast => &self.fast,
            EnemyKind::Tank => &self.tank,
        }
    }
}

impl Default for EnemyTable {
    fn default() -> Self {
        Self {
            basic: EnemyStats {
                max_health: 100,
                speed: 50.0,
                reward: 10,
                life_damage: 1,
                armor: 0.0,
                magic_resist: 0.0,
                dodge_chance: 0.0,
                slow_resistance: 0.0,
                damage_threshold: None,
                regeneration: None,
                sprint: None,
                death_pulse: None,
            },
            fast: EnemyStats {
                max_health: 60,
                speed: 100.0,
                reward: 15,
                life_damage: 1,
                armor: 0.0,
                magic_resist: 10.0,
                dodge_chance: 0.15,
                slow_resistance: 0.3,
                damage_threshold: None,
                regeneration: None,
                sprint: Some(Sprint {
                    multiplier: 2.0,
                    duration_secs: 1.0,
                    cooldown_secs: 3.0,
                }),
                death_pulse: None,
            },
            tank: EnemyStats {
                max_health: 300,
                speed: 25.0,
                reward: 30,
                life_damage: 1,
                armor: 50.0,
                magic_resist: 30.0,
                dodge_chance: 0.0,
                slow_resistance: 0.5,
                damage_threshold: Some(20),
                regeneration: Some(Regeneration {
                    fraction_per_second: 0.02,
                    delay_secs: 3.0,
                }),
                sprint: None,
                death_pulse: Some(DeathPulse {
                    damage: 50,
                    radius: 60.0,
                }),
            },
        }
    }
}

/// Base stats of a single enemy variant before wave scaling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Health at spawn time.
    pub max_health: u32,
    /// Walking speed in world units per second.
    pub speed: f32,
    /// Money granted when the enemy is killed.
    pub reward: u32,
    /// Life lost when the enemy reaches the end of the path.
    pub life_damage: u32,
    /// Resistance against physical damage.
    pub armor: f32,
    /// Resistance against magic damage.
    pub magic_resist: f32,
    /// Probability in `[0, 1]` of evading a hit outright.
    pub dodge_chance: f32,
    /// Fraction in `[0, 1]` of every slow that is shrugged off.
    pub slow_resistance: f32,
    /// Raw hits below this value are halved before mitigation.
    #[serde(default)]
    pub damage_threshold: Option<u32>,
    /// Passive healing after a quiet period.
    #[serde(default)]
    pub regeneration: Option<Regeneration>,
    /// Temporary speed boost triggered by taking damage.
    #[serde(default)]
    pub sprint: Option<Sprint>,
    /// Area damage released on death.
    #[serde(default)]
    pub death_pulse: Option<DeathPulse>,
}

impl EnemyStats {
    fn validate(&self) -> Result<(), InvalidConfig> {
        if self.max_health == 0 {
            return Err(InvalidConfig::NonPositive("enemies.max_health"));
        }
        positive("enemies.speed", self.speed)?;
        unit_interval("enemies.dodge_chance", self.dodge_chance)?;
        unit_interval("enemies.slow_resistance", self.slow_resistance)?;
        non_negative("enemies.armor", self.armor)?;
        non_negative("enemies.magic_resist", self.magic_resist)?;
        if let Some(regeneration) = &self.regeneration {
            non_negative(
                "enemies.regeneration.fraction_per_second",
                regeneration.fraction_per_second,
            )?;
            non_negative("enemies.regeneration.delay_secs", regeneration.delay_secs)?;
        }
        if let Some(sprint) = &self.sprint {
            positive("enemies.sprint.multiplier", sprint.multiplier)?;
            non_negative("enemies.sprint.duration_secs", sprint.duration_secs)?;
            non_negative("enemies.sprint.cooldown_secs", sprint.cooldown_secs)?;
        }
        if let Some(pulse) = &self.death_pulse {
            positive("enemies.death_pulse.radius", pulse.radius)?;
        }
        Ok(())
    }
}

/// Passive regeneration rule.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Regeneration {
    /// Fraction of maximum health restored per second.
    pub fraction_per_second: f32,
    /// Quiet period after the last hit before healing resumes.
    pub delay_secs: f32,
}

impl Regeneration {
    /// Quiet period as a duration.
    #[must_use]
    pub fn delay(&self) -> Duration {
        secs(self.delay_secs)
    }
}

/// Speed boost triggered by taking damage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    /// Speed multiplier while sprinting.
    pub multiplier: f32,
    /// Length of a sprint.
    pub duration_secs: f32,
    /// Time between the start of one sprint and the next.
    pub cooldown_secs: f32,
}

impl Sprint {
    /// Length of a sprint as a duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        secs(self.duration_secs)
    }

    /// Cooldown as a duration.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        secs(self.cooldown_secs)
    }
}

/// Area damage released when the enemy dies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeathPulse {
    /// Magic damage dealt before wave scaling.
    pub damage: u32,
    /// Radius of the pulse in world units.
    pub radius: f32,
}

/// Stats for each tower variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerTable {
    /// Cannon tower stats.
    pub cannon: TowerStats,
    /// Machine tower stats.
    pub machine: TowerStats,
    /// Freeze tower stats.
    pub freeze: TowerStats,
}

impl TowerTable {
    /// Stats for the provided variant.
    #[must_use]
    pub fn get(&self, kind: TowerKind) -> &TowerStats {
        match kind {
            TowerKind::Cannon => &self.cannon,
            TowerKind::Machine => &self.machine,
            TowerKind::Freeze => &self.freeze,
        }
    }
}

impl Default for TowerTable {
    fn default() -> Self {
        Self {
            cannon: TowerStats {
                cost: 100,
                damage: 100,
                range: 120.0,
                attack_interval_secs: 2.0,
                damage_type: DamageType::Physical,
                projectile_speed: 150.0,
                accuracy: 1.0,
                max_level: 3,
                upgrade_cost_factor: 1.5,
                upgrade_cost_growth: 1.5,
                damage_growth: 1.25,
                range_growth: 1.1,
                interval_factor: 0.9,
                splash: Some(SplashStats {
                    radius: 60.0,
                    ratio: 0.6,
                    radius_growth: 1.1,
                }),
                burst: None,
                pierce: None,
                critical: None,
                frost: None,
            },
            machine: TowerStats {
                cost: 75,
                damage: 25,
                range: 100.0,
                attack_interval_secs: 1.0 / 3.0,
                damage_type: DamageType::Physical,
                projectile_speed: 400.0,
                accuracy: 0.95,
                max_level: 3,
                upgrade_cost_factor: 1.5,
                upgrade_cost_growth: 1.5,
                damage_growth: 1.3,
                range_growth: 1.1,
                interval_factor: 0.9,
                splash: None,
                burst: Some(BurstStats {
                    shots: 3,
                    delay_secs: 0.1,
                    shots_per_level: 1,
                }),
                pierce: Some(PierceStats {
                    max_hits: 2,
                    damage_decay: 0.8,
                    speed_decay: 0.9,
                }),
                critical: Some(CriticalStats {
                    chance: 0.1,
                    multiplier: 1.5,
                }),
                frost: None,
            },
            freeze: TowerStats {
                cost: 150,
                damage: 30,
                range: 90.0,
                attack_interval_secs: 2.0 / 3.0,
                damage_type: DamageType::Magic,
                projectile_speed: 250.0,
                accuracy: 1.0,
                max_level: 3,
                upgrade_cost_factor: 1.5,
                upgrade_cost_growth: 1.5,
                damage_growth: 1.2,
                range_growth: 1.15,
                interval_factor: 0.85,
                splash: None,
                burst: None,
                pierce: None,
                critical: None,
                frost: Some(FrostStats {
                    slow_factor: 0.5,
                    slow_duration_secs: 2.0,
                    splash_radius: 50.0,
                    factor_step: 0.05,
                    factor_floor: 0.1,
                    duration_step_secs: 0.5,
                    splash_growth: 1.1,
                }),
            },
        }
    }
}

/// Level-one stats and upgrade rules of a tower variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    /// Construction price.
    pub cost: u32,
    /// Damage dealt by each projectile.
    pub damage: u32,
    /// Targeting radius in world units.
    pub range: f32,
    /// Seconds between attacks.
    pub attack_interval_secs: f32,
    /// Mitigation channel of the tower's projectiles.
    pub damage_type: DamageType,
    /// Flight speed of the tower's projectiles.
    pub projectile_speed: f32,
    /// Probability in `[0, 1]` that a projectile connects with an enemy it reaches.
    #[serde(default = "certain_hit")]
    pub accuracy: f32,
    /// Highest level reachable through upgrades.
    pub max_level: u8,
    /// First upgrade price as a multiple of the construction price.
    pub upgrade_cost_factor: f32,
    /// Growth of the upgrade price per level.
    pub upgrade_cost_growth: f32,
    /// Damage multiplier per upgrade.
    pub damage_growth: f32,
    /// Range multiplier per upgrade.
    pub range_growth: f32,
    /// Attack interval multiplier per upgrade.
    pub interval_factor: f32,
    /// Splash payload carried by the tower's projectiles.
    #[serde(default)]
    pub splash: Option<SplashStats>,
    /// Burst sub-cycle.
    #[serde(default)]
    pub burst: Option<BurstStats>,
    /// Pierce payload carried by the tower's projectiles.
    #[serde(default)]
    pub pierce: Option<PierceStats>,
    /// Critical hit roll applied to each hit.
    #[serde(default)]
    pub critical: Option<CriticalStats>,
    /// Slow payload carried by the tower's projectiles.
    #[serde(default)]
    pub frost: Option<FrostStats>,
}

impl TowerStats {
    /// Attack interval as a duration.
    #[must_use]
    pub fn attack_interval(&self) -> Duration {
        secs(self.attack_interval_secs)
    }

    /// Price of the first upgrade.
    #[must_use]
    pub fn first_upgrade_cost(&self) -> u32 {
        (self.cost as f32 * self.upgrade_cost_factor).floor() as u32
    }

    fn validate(&self) -> Result<(), InvalidConfig> {
        positive("towers.range", self.range)?;
        positive("towers.attack_interval_secs", self.attack_interval_secs)?;
        positive("towers.projectile_speed", self.projectile_speed)?;
        unit_interval("towers.accuracy", self.accuracy)?;
        if self.max_level == 0 {
            return Err(InvalidConfig::NonPositive("towers.max_level"));
        }
        positive("towers.upgrade_cost_factor", self.upgrade_cost_factor)?;
        at_least_one("towers.upgrade_cost_growth", self.upgrade_cost_growth)?;
        at_least_one("towers.damage_growth", self.damage_growth)?;
        at_least_one("towers.range_growth", self.range_growth)?;
        fraction("towers.interval_factor", self.interval_factor)?;
        if let Some(splash) = &self.splash {
            positive("towers.splash.radius", splash.radius)?;
            unit_interval("towers.splash.ratio", splash.ratio)?;
            at_least_one("towers.splash.radius_growth", splash.radius_growth)?;
        }
        if let Some(burst) = &self.burst {
            if burst.shots == 0 {
                return Err(InvalidConfig::NonPositive("towers.burst.shots"));
            }
            non_negative("towers.burst.delay_secs", burst.delay_secs)?;
        }
        if let Some(pierce) = &self.pierce {
            if pierce.max_hits == 0 {
                return Err(InvalidConfig::NonPositive("towers.pierce.max_hits"));
            }
            fraction("towers.pierce.damage_decay", pierce.damage_decay)?;
            fraction("towers.pierce.speed_decay", pierce.speed_decay)?;
        }
        if let Some(critical) = &self.critical {
            unit_interval("towers.critical.chance", critical.chance)?;
            at_least_one("towers.critical.multiplier", critical.multiplier)?;
        }
        if let Some(frost) = &self.frost {
            fraction("towers.frost.slow_factor", frost.slow_factor)?;
            positive("towers.frost.slow_duration_secs", frost.slow_duration_secs)?;
            non_negative("towers.frost.splash_radius", frost.splash_radius)?;
            non_negative("towers.frost.factor_step", frost.factor_step)?;
            fraction("towers.frost.factor_floor", frost.factor_floor)?;
            non_negative("towers.frost.duration_step_secs", frost.duration_step_secs)?;
            at_least_one("towers.frost.splash_growth", frost.splash_growth)?;
        }
        Ok(())
    }
}

/// Area damage applied around the impact point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplashStats {
    /// Radius around the impact point.
    pub radius: f32,
    /// Fraction of the hit damage dealt to bystanders.
    pub ratio: f32,
    /// Radius multiplier per upgrade.
    pub radius_growth: f32,
}

/// Burst sub-cycle of rapid-fire towers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BurstStats {
    /// Shots fired per burst at level one.
    pub shots: u8,
    /// Seconds between shots inside a burst.
    pub delay_secs: f32,
    /// Extra shots gained per upgrade.
    pub shots_per_level: u8,
}

impl BurstStats {
    /// Delay between burst shots as a duration.
    #[must_use]
    pub fn delay(&self) -> Duration {
        secs(self.delay_secs)
    }
}

/// Pierce payload of bullets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PierceStats {
    /// Distinct enemies a projectile may strike before it is spent.
    pub max_hits: u8,
    /// Damage multiplier applied after each pierce.
    pub damage_decay: f32,
    /// Speed multiplier applied after each pierce.
    pub speed_decay: f32,
}

/// Critical hit roll.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriticalStats {
    /// Probability in `[0, 1]` that a hit is critical.
    pub chance: f32,
    /// Damage multiplier of a critical hit.
    pub multiplier: f32,
}

/// Slow payload of frost projectiles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrostStats {
    /// Speed multiplier imposed on the primary target.
    pub slow_factor: f32,
    /// Seconds the slow lasts on the primary target.
    pub slow_duration_secs: f32,
    /// Radius of the weaker slow applied around the impact point.
    pub splash_radius: f32,
    /// Reduction of the slow factor per upgrade.
    pub factor_step: f32,
    /// Strongest slow factor reachable through upgrades.
    pub factor_floor: f32,
    /// Extra seconds of slow per upgrade.
    pub duration_step_secs: f32,
    /// Splash radius multiplier per upgrade.
    pub splash_growth: f32,
}

/// Projectile flight limits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileSettings {
    /// Distance below which a projectile strikes an enemy.
    pub hit_radius: f32,
    /// Seconds a projectile may fly before it is discarded.
    pub max_lifetime_secs: f32,
}

impl ProjectileSettings {
    /// Maximum lifetime as a duration.
    #[must_use]
    pub fn max_lifetime(&self) -> Duration {
        secs(self.max_lifetime_secs)
    }
}

impl Default for ProjectileSettings {
    fn default() -> Self {
        Self {
            hit_radius: 10.0,
            max_lifetime_secs: 3.0,
        }
    }
}

/// Wave pacing and difficulty scaling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSettings {
    /// Number of waves in the run.
    pub total_waves: u32,
    /// Base money paid when a wave is cleared, before its reward multiplier.
    pub clear_bonus: u32,
    /// Starts the next wave's preparation as soon as a wave is cleared.
    pub auto_advance: bool,
    /// Health growth per wave.
    pub health_growth: f32,
    /// Speed growth per wave.
    pub speed_growth: f32,
    /// Upper bound of the speed multiplier.
    pub speed_cap: f32,
    /// Reward growth per wave.
    pub reward_growth: f32,
}

impl Default for WaveSettings {
    fn default() -> Self {
        Self {
            total_waves: 30,
            clear_bonus: 50,
            auto_advance: false,
            health_growth: 0.15,
            speed_growth: 0.05,
            speed_cap: 2.0,
            reward_growth: 0.10,
        }
    }
}

impl WaveSettings {
    fn validate(&self) -> Result<(), InvalidConfig> {
        if self.total_waves == 0 {
            return Err(InvalidConfig::NonPositive("waves.total_waves"));
        }
        if self.total_waves > MAX_WAVES {
            return Err(InvalidConfig::TooLarge {
                field: "waves.total_waves",
                max: MAX_WAVES,
            });
        }
        non_negative("waves.health_growth", self.health_growth)?;
        non_negative("waves.speed_growth", self.speed_growth)?;
        non_negative("waves.reward_growth", self.reward_growth)?;
        positive("waves.speed_cap", self.speed_cap)
    }

    fn steps(wave: WaveId) -> f32 {
        wave.get().saturating_sub(1) as f32
    }

    /// Health multiplier applied to enemies spawned by the wave.
    #[must_use]
    pub fn health_multiplier(&self, wave: WaveId) -> f32 {
        1.0 + self.health_growth * Self::steps(wave)
    }

    /// Speed multiplier applied to enemies spawned by the wave.
    #[must_use]
    pub fn speed_multiplier(&self, wave: WaveId) -> f32 {
        (1.0 + self.speed_growth * Self::steps(wave)).min(self.speed_cap)
    }

    /// Reward multiplier applied to enemies spawned by the wave.
    #[must_use]
    pub fn reward_multiplier(&self, wave: WaveId) -> f32 {
        1.0 + self.reward_growth * Self::steps(wave)
    }
}

/// Map grid and path layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// Number of grid columns.
    pub columns: u32,
    /// Number of grid rows.
    pub rows: u32,
    /// Side length of a grid cell in world units.
    pub tile_size: f32,
    /// Cells whose centre lies closer than this to the path are unbuildable.
    pub path_half_width: f32,
    /// Ordered path waypoints in world units.
    pub waypoints: Vec<[f32; 2]>,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            columns: 32,
            rows: 24,
            tile_size: 32.0,
            path_half_width: 20.0,
            waypoints: vec![
                [50.0, 100.0],
                [200.0, 100.0],
                [200.0, 300.0],
                [400.0, 300.0],
                [400.0, 150.0],
                [600.0, 150.0],
                [600.0, 400.0],
                [800.0, 400.0],
                [800.0, 200.0],
                [950.0, 200.0],
                [950.0, 600.0],
            ],
        }
    }
}
