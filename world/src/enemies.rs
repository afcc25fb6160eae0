//! Enemy state, path following and damage rules.

use std::time::Duration;

use rand::Rng;
use tower_siege_core::{
    config::{DeathPulse, EnemyStats, WaveSettings},
    geometry::{move_towards, scale_floor},
    DamageType, EnemyId, EnemyKind, EnemySnapshot, Vec2, WaveId,
};

use crate::status::{resisted, SlowEffect};
use crate::Entity;

/// Distance at which a waypoint counts as reached.
pub(crate) const WAYPOINT_EPSILON: f32 = 5.0;

const RESISTANCE_SCALE: f32 = 100.0;

/// Terminal state reached by an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Fate {
    Walking,
    Killed,
    Escaped,
}

/// Result of a single incoming hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Hit {
    /// The enemy was already dead or gone, or the hit carried no damage.
    Ignored,
    /// The enemy evaded the hit.
    Dodged,
    /// Health was removed.
    Damaged { amount: u32, killed: bool },
}

#[derive(Clone, Debug)]
pub(crate) struct EnemyState {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) wave: WaveId,
    pub(crate) position: Vec2,
    pub(crate) health: u32,
    pub(crate) max_health: u32,
    pub(crate) speed: f32,
    pub(crate) reward: u32,
    pub(crate) life_damage: u32,
    pub(crate) path_index: usize,
    pub(crate) slow: SlowEffect,
    pub(crate) death_pulse: Option<DeathPulse>,
    profile: EnemyStats,
    fate: Fate,
    since_damage: Duration,
    regen_carry: f32,
    sprint_remaining: Duration,
    sprint_cooldown: Duration,
}

impl EnemyState {
    /// Creates an enemy at `start` with stats scaled for its wave.
    pub(crate) fn spawn(
        id: EnemyId,
        kind: EnemyKind,
        wave: WaveId,
        start: Vec2,
        stats: &EnemyStats,
        scaling: &WaveSettings,
    ) -> Self {
        let health_multiplier = scaling.health_multiplier(wave);
        let max_health = scale_floor(stats.max_health, health_multiplier).max(1);
        let reward = scale_floor(stats.reward, scaling.reward_multiplier(wave));
        let death_pulse = stats.death_pulse.map(|pulse| DeathPulse {
            damage: scale_floor(pulse.damage, health_multiplier),
            radius: pulse.radius,
        });
        Self {
            id,
            kind,
            wave,
            position: start,
            health: max_health,
            max_health,
            speed: stats.speed * scaling.speed_multiplier(wave),
            reward,
            life_damage: stats.life_damage,
            path_index: 1,
            slow: SlowEffect::none(),
            death_pulse,
            profile: stats.clone(),
            fate: Fate::Walking,
            since_damage: Duration::ZERO,
            regen_carry: 0.0,
            sprint_remaining: Duration::ZERO,
            sprint_cooldown: Duration::ZERO,
        }
    }

    pub(crate) const fn fate(&self) -> Fate {
        self.fate
    }

    /// Speed after slows and sprints.
    pub(crate) fn current_speed(&self) -> f32 {
        let sprint = match self.profile.sprint {
            Some(sprint) if !self.sprint_remaining.is_zero() => sprint.multiplier,
            _ => 1.0,
        };
        self.speed * self.slow.multiplier() * sprint
    }

    /// Walks along the path; returns `true` when the final waypoint was reached.
    pub(crate) fn advance(&mut self, path: &[Vec2], dt: Duration) -> bool {
        if !self.is_alive() {
            return false;
        }

        let mut budget = self.current_speed() * dt.as_secs_f32();
        while let Some(&waypoint) = path.get(self.path_index) {
            let (next, arrived) = move_towards(self.position, waypoint, budget);
            budget -= self.position.distance(next);
            self.position = next;
            if arrived || next.distance(waypoint) <= WAYPOINT_EPSILON {
                self.path_index += 1;
            }
            if !arrived || budget <= 0.0 {
                break;
            }
        }

        if self.path_index >= path.len() {
            self.fate = Fate::Escaped;
            return true;
        }
        false
    }

    /// Applies one incoming hit following the variant's mitigation rules.
    pub(crate) fn take_damage<R: Rng + ?Sized>(
        &mut self,
        amount: u32,
        damage_type: DamageType,
        rng: &mut R,
    ) -> Hit {
        if !self.is_alive() || amount == 0 {
            return Hit::Ignored;
        }

        if self.profile.dodge_chance > 0.0 && rng.gen::<f32>() < self.profile.dodge_chance {
            return Hit::Dodged;
        }

        let mut raw = amount as f32;
        if let Some(threshold) = self.profile.damage_threshold {
            if amount < threshold {
                raw *= 0.5;
            }
        }

        let resistance = match damage_type {
            DamageType::Physical => self.profile.armor,
            DamageType::Magic => self.profile.magic_resist,
        };
        let mitigated = raw * (1.0 - resistance / (resistance + RESISTANCE_SCALE));
        let dealt = (mitigated.floor() as u32).max(1).min(self.health);

        self.health -= dealt;
        self.since_damage = Duration::ZERO;
        self.regen_carry = 0.0;
        if let Some(sprint) = self.profile.sprint {
            if self.sprint_cooldown.is_zero() {
                self.sprint_remaining = sprint.duration();
                self.sprint_cooldown = sprint.cooldown();
            }
        }

        let killed = self.health == 0;
        if killed {
            self.fate = Fate::Killed;
        }
        Hit::Damaged {
            amount: dealt,
            killed,
        }
    }

    /// Merges a slow after resistance; returns the resulting multiplier.
    pub(crate) fn apply_slow(&mut self, factor: f32, duration: Duration) -> Option<f32> {
        if !self.is_alive() {
            return None;
        }
        let (factor, duration) = resisted(factor, duration, self.profile.slow_resistance);
        self.slow.apply(factor, duration);
        Some(self.slow.multiplier())
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            health: self.health,
            max_health: self.max_health,
            path_index: self.path_index,
            slow_multiplier: self.slow.multiplier(),
            slow_remaining: self.slow.remaining(),
        }
    }

    fn regenerate(&mut self, dt: Duration) {
        let Some(regeneration) = self.profile.regeneration else {
            return;
        };
        let delay = regeneration.delay();
        self.since_damage = self.since_damage.saturating_add(dt);
        if self.since_damage < delay || self.health >= self.max_health {
            self.regen_carry = 0.0;
            return;
        }

        // Only the part of the frame past the quiet period heals.
        let healing = dt.min(self.since_damage - delay);
        self.regen_carry +=
            self.max_health as f32 * regeneration.fraction_per_second * healing.as_secs_f32();
        let healed = self.regen_carry.floor();
        if healed >= 1.0 {
            self.regen_carry -= healed;
            self.health = self
                .health
                .saturating_add(healed as u32)
                .min(self.max_health);
        }
    }
}

impl Entity for EnemyState {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_alive(&self) -> bool {
        self.fate == Fate::Walking && self.health > 0
    }

    fn update(&mut self, dt: Duration) {
        if !self.is_alive() {
            return;
        }
        self.slow.decay(dt);
        self.sprint_remaining = self.sprint_remaining.saturating_sub(dt);
        self.sprint_cooldown = self.sprint_cooldown.saturating_sub(dt);
        self.regenerate(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tower_siege_core::config::EnemyTable;

    #[test]
    fn walks_towards_next_waypoint_at_base_speed() {
        let path = straight_path();
        let mut enemy = spawn(EnemyKind::Basic, 1);

        assert!(!enemy.advance(&path, Duration::from_secs(1)));

        assert_eq!(enemy.position, Vec2::new(50.0, 0.0));
        assert_eq!(enemy.path_index, 1);
    }

    #[test]
    fn leftover_distance_carries_past_waypoints() {
        let path = vec![Vec2::ZERO, Vec2::new(30.0, 0.0), Vec2::new(30.0, 100.0)];
        let mut enemy = spawn(EnemyKind::Basic, 1);

        assert!(!enemy.advance(&path, Duration::from_secs(1)));

        assert_eq!(enemy.path_index, 2);
        assert!((enemy.position - Vec2::new(30.0, 20.0)).length() < 1e-4);
    }

    #[test]
    fn reaching_final_waypoint_escapes_without_killing() {
        let path = vec![Vec2::ZERO, Vec2::new(40.0, 0.0)];
        let mut enemy = spawn(EnemyKind::Basic, 1);

        assert!(enemy.advance(&path, Duration::from_secs(1)));

        assert_eq!(enemy.fate(), Fate::Escaped);
        assert!(!enemy.is_alive());
        assert_eq!(enemy.health, enemy.max_health);
        assert!(!enemy.advance(&path, Duration::from_secs(1)));
    }

    #[test]
    fn slow_reduces_walking_speed() {
        let path = straight_path();
        let mut enemy = spawn(EnemyKind::Basic, 1);
        assert_eq!(enemy.apply_slow(0.5, Duration::from_secs(2)), Some(0.5));

        let _ = enemy.advance(&path, Duration::from_secs(1));

        assert!((enemy.position.x - 25.0).abs() < 1e-4);
    }

    #[test]
    fn armor_mitigates_physical_damage() {
        let mut enemy = spawn(EnemyKind::Tank, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let hit = enemy.take_damage(100, DamageType::Physical, &mut rng);

        assert_eq!(
            hit,
            Hit::Damaged {
                amount: 66,
                killed: false
            }
        );
        assert_eq!(enemy.health, 234);
    }

    #[test]
    fn tank_halves_hits_below_threshold() {
        let mut enemy = spawn(EnemyKind::Tank, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let hit = enemy.take_damage(10, DamageType::Physical, &mut rng);

        assert_eq!(
            hit,
            Hit::Damaged {
                amount: 3,
                killed: false
            }
        );
    }

    #[test]
    fn every_hit_deals_at_least_one_damage() {
        let mut enemy = spawn(EnemyKind::Tank, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let hit = enemy.take_damage(1, DamageType::Physical, &mut rng);

        assert_eq!(
            hit,
            Hit::Damaged {
                amount: 1,
                killed: false
            }
        );
    }

    #[test]
    fn lethal_hit_kills_exactly_once() {
        let mut enemy = spawn(EnemyKind::Basic, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let first = enemy.take_damage(250, DamageType::Physical, &mut rng);
        let second = enemy.take_damage(250, DamageType::Physical, &mut rng);

        assert_eq!(
            first,
            Hit::Damaged {
                amount: 100,
                killed: true
            }
        );
        assert_eq!(second, Hit::Ignored);
        assert_eq!(enemy.fate(), Fate::Killed);
    }

    #[test]
    fn certain_dodge_avoids_all_damage() {
        let mut stats = EnemyTable::default().fast;
        stats.dodge_chance = 1.0;
        let mut enemy = EnemyState::spawn(
            EnemyId::new(1),
            EnemyKind::Fast,
            WaveId::new(1),
            Vec2::ZERO,
            &stats,
            &WaveSettings::default(),
        );
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        assert_eq!(
            enemy.take_damage(50, DamageType::Physical, &mut rng),
            Hit::Dodged
        );
        assert_eq!(enemy.health, enemy.max_health);
    }

    #[test]
    fn fast_enemy_sprints_after_taking_damage() {
        let mut stats = EnemyTable::default().fast;
        stats.dodge_chance = 0.0;
        let mut enemy = EnemyState::spawn(
            EnemyId::new(1),
            EnemyKind::Fast,
            WaveId::new(1),
            Vec2::ZERO,
            &stats,
            &WaveSettings::default(),
        );
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let _ = enemy.take_damage(5, DamageType::Physical, &mut rng);
        assert_eq!(enemy.current_speed(), 200.0);

        enemy.update(Duration::from_secs(1));
        assert_eq!(enemy.current_speed(), 100.0);
    }

    #[test]
    fn tank_regenerates_after_quiet_period() {
        let mut enemy = spawn(EnemyKind::Tank, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let _ = enemy.take_damage(100, DamageType::Physical, &mut rng);
        let wounded = enemy.health;

        enemy.update(Duration::from_secs(2));
        assert_eq!(enemy.health, wounded);

        enemy.update(Duration::from_secs(2));
        assert_eq!(enemy.health, wounded + 6, "only the second after the delay heals");

        enemy.update(Duration::from_secs(1));
        assert_eq!(enemy.health, wounded + 12);
    }

    #[test]
    fn wave_scaling_applies_at_spawn() {
        let enemy = spawn(EnemyKind::Basic, 5);

        assert_eq!(enemy.max_health, 160);
        assert_eq!(enemy.reward, 14);
        assert!((enemy.speed - 60.0).abs() < 1e-4);
    }

    #[test]
    fn slow_resistance_weakens_incoming_slows() {
        let mut enemy = spawn(EnemyKind::Tank, 1);

        let multiplier = enemy.apply_slow(0.5, Duration::from_secs(2));

        assert_eq!(multiplier, Some(0.75));
        assert_eq!(enemy.slow.remaining(), Duration::from_secs(1));
    }

    proptest! {
        #[test]
        fn health_stays_within_bounds(
            kind in prop_oneof![Just(EnemyKind::Basic), Just(EnemyKind::Fast), Just(EnemyKind::Tank)],
            hits in prop::collection::vec((0u32..400, any::<bool>(), 0u64..2_000), 0..40),
            seed in any::<u64>(),
        ) {
            let mut enemy = spawn(kind, 3);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut deaths = 0;
            for (amount, magic, quiet_millis) in hits {
                let damage_type = if magic { DamageType::Magic } else { DamageType::Physical };
                if let Hit::Damaged { killed: true, .. } = enemy.take_damage(amount, damage_type, &mut rng) {
                    deaths += 1;
                }
                enemy.update(Duration::from_millis(quiet_millis));
                prop_assert!(enemy.health <= enemy.max_health);
                prop_assert_eq!(enemy.is_alive(), enemy.health > 0);
            }
            prop_assert!(deaths <= 1);
        }
    }

    fn straight_path() -> Vec<Vec2> {
        vec![Vec2::ZERO, Vec2::new(1000.0, 0.0)]
    }

    fn spawn(kind: EnemyKind, wave: u32) -> EnemyState {
        let table = EnemyTable::default();
        EnemyState::spawn(
            EnemyId::new(1),
            kind,
            WaveId::new(wave),
            Vec2::ZERO,
            table.get(kind),
            &WaveSettings::default(),
        )
    }
}
