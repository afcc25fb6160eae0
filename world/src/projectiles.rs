//! Projectile flight and impact resolution.

use std::time::Duration;

use tower_siege_core::{
    config::ProjectileSettings,
    geometry::{move_towards, normalize, scale_duration, scale_floor},
    EnemyId, Event, ExpiryReason, Map, ProjectileId, ProjectileKind, ProjectileSnapshot, TowerId,
    Vec2,
};
use tracing::debug;

use crate::combat::Strike;
use crate::enemies::Hit;
use crate::towers::{Payload, TowerState};
use crate::Entity;

#[derive(Clone, Debug)]
pub(crate) struct ProjectileState {
    pub(crate) id: ProjectileId,
    pub(crate) kind: ProjectileKind,
    pub(crate) tower: TowerId,
    pub(crate) position: Vec2,
    heading: Vec2,
    speed: f32,
    damage: u32,
    target: Option<EnemyId>,
    payload: Payload,
    lifetime: Duration,
    struck: Vec<EnemyId>,
    hits: u8,
    spent: bool,
}

impl ProjectileState {
    /// Releases a projectile from `tower` aimed at `target_position`.
    pub(crate) fn launch(
        id: ProjectileId,
        tower: &TowerState,
        target: EnemyId,
        target_position: Vec2,
    ) -> Self {
        Self {
            id,
            kind: tower.kind.projectile(),
            tower: tower.id,
            position: tower.position,
            heading: normalize(target_position - tower.position),
            speed: tower.payload.speed,
            damage: tower.damage,
            target: Some(target),
            payload: tower.payload,
            lifetime: Duration::ZERO,
            struck: Vec::new(),
            hits: 0,
            spent: false,
        }
    }

    pub(crate) fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            kind: self.kind,
            tower: self.tower,
            position: self.position,
            target: self.target,
        }
    }

    /// Moves the projectile for one frame and resolves any impact.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        map: &Map,
        settings: &ProjectileSettings,
        strike: &mut Strike<'_>,
    ) {
        if self.spent {
            return;
        }

        self.update(dt);
        if self.lifetime >= settings.max_lifetime() {
            self.expire(ExpiryReason::Lifetime, strike);
            return;
        }

        let step = self.speed * dt.as_secs_f32();
        let homing_on = self
            .target
            .and_then(|target| strike.live_enemy(target).map(|state| (target, state.position)));

        match homing_on {
            Some((target, target_position)) => {
                let offset = target_position - self.position;
                if offset.length_squared() > 0.0 {
                    self.heading = normalize(offset);
                }
                let (next, _) = move_towards(self.position, target_position, step);
                self.position = next;
                if next.distance(target_position) < settings.hit_radius {
                    self.impact(target, strike);
                }
            }
            None => {
                if let Some(lost) = self.target.take() {
                    debug!(projectile = self.id.get(), enemy = lost.get(), "target lost, continuing ballistically");
                }
                self.fly_ballistic(step, settings.hit_radius, strike);
            }
        }

        if !self.spent && !map.contains(self.position) {
            self.expire(ExpiryReason::OutOfBounds, strike);
        }
    }

    fn fly_ballistic(&mut self, step: f32, hit_radius: f32, strike: &mut Strike<'_>) {
        if step <= 0.0 || self.heading == Vec2::ZERO {
            return;
        }
        let substeps = (step / hit_radius).ceil().max(1.0) as u32;
        let increment = self.heading * (step / substeps as f32);
        for _ in 0..substeps {
            self.position += increment;
            if let Some(enemy) = strike.first_contact(self.position, hit_radius, &self.struck) {
                self.impact(enemy, strike);
                if self.spent {
                    return;
                }
            }
        }
    }

    fn impact(&mut self, enemy: EnemyId, strike: &mut Strike<'_>) {
        self.struck.push(enemy);
        if self.payload.accuracy < 1.0 && !strike.roll(self.payload.accuracy) {
            debug!(projectile = self.id.get(), enemy = enemy.get(), "projectile missed");
            strike.events().push(Event::ProjectileMissed {
                projectile: self.id,
                enemy,
            });
            self.target = None;
            return;
        }

        let mut damage = self.damage;
        if let Some(critical) = self.payload.critical {
            if strike.roll(critical.chance) {
                damage = scale_floor(damage, critical.multiplier);
            }
        }

        strike.events().push(Event::ProjectileHit {
            projectile: self.id,
            enemy,
            position: self.position,
        });
        let outcome = strike.hit(enemy, damage, self.payload.damage_type);

        if let Some(splash) = self.payload.splash {
            strike.splash(
                self.position,
                splash.radius,
                scale_floor(damage, splash.ratio),
                self.payload.damage_type,
                enemy,
            );
        }

        if let Some(frost) = self.payload.frost {
            if outcome != Hit::Dodged {
                strike.slow(enemy, frost.factor, frost.duration);
            }
            strike.slow_area(
                self.position,
                frost.splash_radius,
                1.0 - (1.0 - frost.factor) * 0.5,
                scale_duration(frost.duration, 0.5),
                enemy,
            );
        }

        self.hits = self.hits.saturating_add(1);
        match self.payload.pierce {
            Some(pierce) if self.hits < pierce.max_hits => {
                self.damage = scale_floor(self.damage, pierce.damage_decay).max(1);
                self.speed *= pierce.speed_decay;
                self.target = None;
            }
            _ => self.spent = true,
        }
    }

    fn expire(&mut self, reason: ExpiryReason, strike: &mut Strike<'_>) {
        self.spent = true;
        strike.events().push(Event::ProjectileExpired {
            projectile: self.id,
            reason,
        });
    }
}

impl Entity for ProjectileState {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_alive(&self) -> bool {
        !self.spent
    }

    fn update(&mut self, dt: Duration) {
        self.lifetime = self.lifetime.saturating_add(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::FrameLedger;
    use crate::enemies::EnemyState;
    use crate::towers::TowerRegistry;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::BTreeMap;
    use tower_siege_core::{
        config::{EnemyTable, TowerTable, WaveSettings},
        CellCoord, EnemyKind, TowerKind, WaveId,
    };

    #[test]
    fn homing_projectile_strikes_its_target() {
        let map = open_map();
        let mut enemies = pool(&[Vec2::new(150.0, 100.0)]);
        let mut projectile = launch(TowerKind::Cannon, Vec2::new(100.0, 100.0), 1, Vec2::new(150.0, 100.0));
        let events = fly(&mut projectile, &mut enemies, &map, Duration::from_millis(500));

        assert!(!projectile.is_alive());
        assert!(events.contains(&Event::EnemyKilled {
            enemy: EnemyId::new(1),
            reward: 10,
        }));
    }

    #[test]
    fn projectile_falls_back_to_ballistic_flight_when_target_vanishes() {
        let map = open_map();
        let mut enemies = pool(&[Vec2::new(300.0, 100.0)]);
        let mut projectile = launch(TowerKind::Cannon, Vec2::new(100.0, 100.0), 1, Vec2::new(300.0, 100.0));
        let _ = enemies.remove(&EnemyId::new(1));

        let events = fly(&mut projectile, &mut enemies, &map, Duration::from_millis(100));

        assert!(projectile.is_alive());
        assert!(projectile.target.is_none());
        assert!((projectile.position - Vec2::new(115.0, 100.0)).length() < 1e-3);
        assert!(events.is_empty());
    }

    #[test]
    fn ballistic_projectile_expires_after_lifetime() {
        let map = open_map();
        let mut enemies = BTreeMap::new();
        let mut projectile = launch(TowerKind::Cannon, Vec2::new(100.0, 100.0), 7, Vec2::new(100.0, 300.0));

        let mut events = Vec::new();
        for _ in 0..40 {
            events.extend(fly(&mut projectile, &mut enemies, &map, Duration::from_millis(100)));
        }

        assert_eq!(
            events,
            vec![Event::ProjectileExpired {
                projectile: ProjectileId::new(1),
                reason: ExpiryReason::Lifetime,
            }]
        );
    }

    #[test]
    fn projectile_leaving_the_map_expires() {
        let map = open_map();
        let mut enemies = BTreeMap::new();
        let mut projectile = launch(TowerKind::Machine, Vec2::new(10.0, 100.0), 7, Vec2::new(0.0, 100.0));

        let events = fly(&mut projectile, &mut enemies, &map, Duration::from_millis(100));

        assert_eq!(
            events,
            vec![Event::ProjectileExpired {
                projectile: ProjectileId::new(1),
                reason: ExpiryReason::OutOfBounds,
            }]
        );
    }

    #[test]
    fn bullet_pierces_into_a_second_enemy() {
        let map = open_map();
        let mut enemies = pool(&[Vec2::new(120.0, 100.0), Vec2::new(140.0, 100.0), Vec2::new(160.0, 100.0)]);
        let mut projectile = launch(TowerKind::Machine, Vec2::new(100.0, 100.0), 1, Vec2::new(120.0, 100.0));

        let mut events = Vec::new();
        for _ in 0..5 {
            events.extend(fly(&mut projectile, &mut enemies, &map, Duration::from_millis(50)));
        }

        let hits: Vec<EnemyId> = events
            .iter()
            .filter_map(|event| match event {
                Event::ProjectileHit { enemy, .. } => Some(*enemy),
                _ => None,
            })
            .collect();
        assert_eq!(hits, vec![EnemyId::new(1), EnemyId::new(2)]);
        assert!(!projectile.is_alive());
        assert_eq!(enemies[&EnemyId::new(3)].health, 100);
    }

    #[test]
    fn missed_bullet_keeps_flying_past_its_target() {
        let map = open_map();
        let mut enemies = pool(&[Vec2::new(150.0, 100.0)]);
        let mut projectile =
            launch_with_accuracy(TowerKind::Machine, 0.0, Vec2::new(100.0, 100.0), 1, Vec2::new(150.0, 100.0));

        let events = fly(&mut projectile, &mut enemies, &map, Duration::from_millis(200));
        assert_eq!(
            events,
            vec![Event::ProjectileMissed {
                projectile: ProjectileId::new(1),
                enemy: EnemyId::new(1),
            }]
        );
        assert!(projectile.is_alive());
        assert!(projectile.target.is_none());

        let after = fly(&mut projectile, &mut enemies, &map, Duration::from_millis(100));
        assert!(after.is_empty(), "a missed enemy is never struck again");
        assert!((projectile.position - Vec2::new(190.0, 100.0)).length() < 1e-3);
        assert_eq!(enemies[&EnemyId::new(1)].health, 100);
    }

    #[test]
    fn bullet_accuracy_rolls_on_the_seeded_source() {
        let map = open_map();
        let volley = |seed: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..200)
                .map(|_| {
                    let mut enemies = pool(&[Vec2::new(150.0, 100.0)]);
                    let mut projectile = launch_with_accuracy(
                        TowerKind::Machine,
                        0.95,
                        Vec2::new(100.0, 100.0),
                        1,
                        Vec2::new(150.0, 100.0),
                    );
                    let events =
                        fly_with(&mut projectile, &mut enemies, &map, Duration::from_millis(200), &mut rng);
                    events
                        .iter()
                        .any(|event| matches!(event, Event::ProjectileHit { .. }))
                })
                .collect::<Vec<bool>>()
        };

        let first = volley(5);
        assert_eq!(first, volley(5), "same seed must replay the same rolls");
        let hits = first.iter().filter(|hit| **hit).count();
        assert!(hits > 150, "most shots connect, got {hits}");
        assert!(hits < 200, "some shots miss");
    }

    #[test]
    fn ice_ball_slows_target_and_neighbours() {
        let map = open_map();
        let mut enemies = pool(&[Vec2::new(150.0, 100.0), Vec2::new(150.0, 130.0)]);
        let mut projectile = launch(TowerKind::Freeze, Vec2::new(100.0, 100.0), 1, Vec2::new(150.0, 100.0));

        let _ = fly(&mut projectile, &mut enemies, &map, Duration::from_millis(500));

        let primary = &enemies[&EnemyId::new(1)];
        assert_eq!(primary.slow.multiplier(), 0.5);
        assert_eq!(primary.slow.remaining(), Duration::from_secs(2));
        let neighbour = &enemies[&EnemyId::new(2)];
        assert_eq!(neighbour.slow.multiplier(), 0.75);
        assert_eq!(neighbour.slow.remaining(), Duration::from_secs(1));
    }

    fn fly(
        projectile: &mut ProjectileState,
        enemies: &mut BTreeMap<EnemyId, EnemyState>,
        map: &Map,
        dt: Duration,
    ) -> Vec<Event> {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        fly_with(projectile, enemies, map, dt, &mut rng)
    }

    fn fly_with(
        projectile: &mut ProjectileState,
        enemies: &mut BTreeMap<EnemyId, EnemyState>,
        map: &Map,
        dt: Duration,
        rng: &mut ChaCha8Rng,
    ) -> Vec<Event> {
        let mut ledger = FrameLedger::default();
        let mut events = Vec::new();
        let mut strike = Strike::new(enemies, rng, &mut ledger, &mut events);
        projectile.advance(dt, map, &ProjectileSettings::default(), &mut strike);
        events
    }

    fn launch(kind: TowerKind, from: Vec2, target: u32, toward: Vec2) -> ProjectileState {
        launch_with_accuracy(kind, 1.0, from, target, toward)
    }

    fn launch_with_accuracy(
        kind: TowerKind,
        accuracy: f32,
        from: Vec2,
        target: u32,
        toward: Vec2,
    ) -> ProjectileState {
        let mut registry = TowerRegistry::new();
        let mut stats = TowerTable::default().get(kind).clone();
        stats.critical = None;
        stats.accuracy = accuracy;
        let id = registry.insert(kind, CellCoord::new(0, 0), from, &stats);
        let tower = registry.get(id).expect("tower was inserted");
        ProjectileState::launch(ProjectileId::new(1), tower, EnemyId::new(target), toward)
    }

    fn pool(positions: &[Vec2]) -> BTreeMap<EnemyId, EnemyState> {
        let table = EnemyTable::default();
        positions
            .iter()
            .enumerate()
            .map(|(index, position)| {
                let id = EnemyId::new(index as u32 + 1);
                let state = EnemyState::spawn(
                    id,
                    EnemyKind::Basic,
                    WaveId::new(1),
                    *position,
                    &table.basic,
                    &WaveSettings::default(),
                );
                (id, state)
            })
            .collect()
    }

    fn open_map() -> Map {
        Map::new(
            vec![Vec2::new(0.0, 600.0), Vec2::new(1000.0, 600.0)],
            32,
            24,
            32.0,
            20.0,
        )
        .expect("valid map")
    }
}
