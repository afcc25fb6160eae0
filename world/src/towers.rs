//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use tower_siege_core::{
    config::{CriticalStats, PierceStats, TowerStats},
    geometry::{scale_duration, scale_floor, seconds},
    CellCoord, DamageType, TowerCooldownSnapshot, TowerId, TowerKind, TowerSnapshot, Vec2,
};

use crate::Entity;

/// Area damage carried by a projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Splash {
    pub(crate) radius: f32,
    pub(crate) ratio: f32,
}

/// Slow carried by a projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Frost {
    pub(crate) factor: f32,
    pub(crate) duration: Duration,
    pub(crate) splash_radius: f32,
}

/// Everything a tower hands to the projectiles it releases.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Payload {
    pub(crate) damage_type: DamageType,
    pub(crate) speed: f32,
    pub(crate) accuracy: f32,
    pub(crate) splash: Option<Splash>,
    pub(crate) pierce: Option<PierceStats>,
    pub(crate) critical: Option<CriticalStats>,
    pub(crate) frost: Option<Frost>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Burst {
    shots: u8,
    delay: Duration,
}

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    pub(crate) id: TowerId,
    pub(crate) kind: TowerKind,
    pub(crate) cell: CellCoord,
    pub(crate) position: Vec2,
    pub(crate) level: u8,
    pub(crate) damage: u32,
    pub(crate) range: f32,
    pub(crate) attack_interval: Duration,
    pub(crate) invested: u32,
    pub(crate) payload: Payload,
    upgrade_cost: u32,
    since_attack: Duration,
    burst: Option<Burst>,
    burst_remaining: u8,
    since_burst_shot: Duration,
    stats: TowerStats,
}

impl TowerState {
    fn build(id: TowerId, kind: TowerKind, cell: CellCoord, position: Vec2, stats: &TowerStats) -> Self {
        let attack_interval = stats.attack_interval();
        Self {
            id,
            kind,
            cell,
            position,
            level: 1,
            damage: stats.damage,
            range: stats.range,
            attack_interval,
            invested: stats.cost,
            payload: Payload {
                damage_type: stats.damage_type,
                speed: stats.projectile_speed,
                accuracy: stats.accuracy,
                splash: stats.splash.map(|splash| Splash {
                    radius: splash.radius,
                    ratio: splash.ratio,
                }),
                pierce: stats.pierce,
                critical: stats.critical,
                frost: stats.frost.map(|frost| Frost {
                    factor: frost.slow_factor,
                    duration: seconds(frost.slow_duration_secs),
                    splash_radius: frost.splash_radius,
                }),
            },
            upgrade_cost: stats.first_upgrade_cost(),
            since_attack: attack_interval,
            burst: stats.burst.map(|burst| Burst {
                shots: burst.shots,
                delay: burst.delay(),
            }),
            burst_remaining: 0,
            since_burst_shot: Duration::ZERO,
            stats: stats.clone(),
        }
    }

    /// Reports whether the next shot may be released this frame.
    pub(crate) fn can_attack(&self) -> bool {
        match self.burst {
            Some(burst) if self.burst_remaining > 0 => self.since_burst_shot >= burst.delay,
            _ => self.since_attack >= self.attack_interval,
        }
    }

    pub(crate) const fn burst_pending(&self) -> bool {
        self.burst_remaining > 0
    }

    /// Records a released shot, starting a new burst when none is running.
    pub(crate) fn fire(&mut self) {
        if self.burst_remaining > 0 {
            self.burst_remaining -= 1;
        } else {
            self.since_attack = Duration::ZERO;
            self.burst_remaining = self
                .burst
                .map(|burst| burst.shots.saturating_sub(1))
                .unwrap_or(0);
        }
        self.since_burst_shot = Duration::ZERO;
    }

    pub(crate) fn end_burst(&mut self) {
        self.burst_remaining = 0;
    }

    /// Price of the next upgrade, or `None` at maximum level.
    pub(crate) fn next_upgrade_cost(&self) -> Option<u32> {
        (self.level < self.stats.max_level).then_some(self.upgrade_cost)
    }

    /// Advances one level, scaling every stat; the caller settles the price.
    pub(crate) fn upgrade(&mut self) {
        let stats = &self.stats;
        self.invested = self.invested.saturating_add(self.upgrade_cost);
        self.level += 1;
        self.damage = scale_floor(self.damage, stats.damage_growth);
        self.range *= stats.range_growth;
        self.attack_interval = scale_duration(self.attack_interval, stats.interval_factor);
        self.upgrade_cost = scale_floor(self.upgrade_cost, stats.upgrade_cost_growth);

        if let (Some(splash), Some(growth)) = (self.payload.splash.as_mut(), stats.splash) {
            splash.radius *= growth.radius_growth;
        }
        if let (Some(frost), Some(growth)) = (self.payload.frost.as_mut(), stats.frost) {
            frost.factor = (frost.factor - growth.factor_step).max(growth.factor_floor);
            frost.duration = frost
                .duration
                .saturating_add(seconds(growth.duration_step_secs));
            frost.splash_radius *= growth.splash_growth;
        }
        if let (Some(burst), Some(growth)) = (self.burst.as_mut(), stats.burst) {
            burst.shots = burst.shots.saturating_add(growth.shots_per_level);
        }
    }

    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            cell: self.cell,
            position: self.position,
            level: self.level,
            damage: self.damage,
            range: self.range,
            attack_interval: self.attack_interval,
            upgrade_cost: self.next_upgrade_cost(),
            invested: self.invested,
        }
    }

    pub(crate) fn cooldown(&self) -> TowerCooldownSnapshot {
        TowerCooldownSnapshot {
            tower: self.id,
            kind: self.kind,
            ready: self.can_attack(),
            burst_pending: self.burst_pending(),
        }
    }
}

impl Entity for TowerState {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_alive(&self) -> bool {
        true
    }

    fn update(&mut self, dt: Duration) {
        self.since_attack = self.since_attack.saturating_add(dt);
        self.since_burst_shot = self.since_burst_shot.saturating_add(dt);
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    occupied: BTreeMap<CellCoord, TowerId>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            occupied: BTreeMap::new(),
            next_tower_id: TowerId::new(1),
        }
    }

    pub(crate) fn insert(
        &mut self,
        kind: TowerKind,
        cell: CellCoord,
        position: Vec2,
        stats: &TowerStats,
    ) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        let _ = self.occupied.insert(cell, id);
        let _ = self
            .entries
            .insert(id, TowerState::build(id, kind, cell, position, stats));
        id
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<TowerState> {
        let state = self.entries.remove(&id)?;
        let _ = self.occupied.remove(&state.cell);
        Some(state)
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn occupant(&self, cell: CellCoord) -> Option<TowerId> {
        self.occupied.get(&cell).copied()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }
}
