//! Damage application shared by projectile impacts and death pulses.

use std::{
    collections::{BTreeMap, VecDeque},
    time::Duration,
};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tower_siege_core::{DamageType, EnemyId, Event, Vec2};
use tracing::debug;

use crate::enemies::{EnemyState, Hit};
use crate::Entity;

/// Rewards and life losses accumulated until the frame settles.
#[derive(Debug, Default)]
pub(crate) struct FrameLedger {
    pub(crate) killed: Vec<(EnemyId, u32)>,
    pub(crate) escaped: Vec<(EnemyId, u32)>,
}

impl FrameLedger {
    pub(crate) fn clear(&mut self) {
        self.killed.clear();
        self.escaped.clear();
    }
}

/// Mutable view over the enemy pool used while resolving hits.
///
/// Kills are booked into the ledger immediately; death pulses they trigger are
/// resolved before the originating call returns.
pub(crate) struct Strike<'a> {
    enemies: &'a mut BTreeMap<EnemyId, EnemyState>,
    rng: &'a mut ChaCha8Rng,
    ledger: &'a mut FrameLedger,
    out: &'a mut Vec<Event>,
    pulses: VecDeque<EnemyId>,
}

impl<'a> Strike<'a> {
    pub(crate) fn new(
        enemies: &'a mut BTreeMap<EnemyId, EnemyState>,
        rng: &'a mut ChaCha8Rng,
        ledger: &'a mut FrameLedger,
        out: &'a mut Vec<Event>,
    ) -> Self {
        Self {
            enemies,
            rng,
            ledger,
            out,
            pulses: VecDeque::new(),
        }
    }

    pub(crate) fn events(&mut self) -> &mut Vec<Event> {
        self.out
    }

    /// Rolls a probability against the shared random source.
    pub(crate) fn roll(&mut self, chance: f32) -> bool {
        chance > 0.0 && self.rng.gen::<f32>() < chance
    }

    /// Live enemy with the provided identifier.
    pub(crate) fn live_enemy(&self, enemy: EnemyId) -> Option<&EnemyState> {
        self.enemies.get(&enemy).filter(|state| state.is_alive())
    }

    /// Lowest-identifier live enemy closer than `radius` to `point`, skipping `exclude`.
    pub(crate) fn first_contact(
        &self,
        point: Vec2,
        radius: f32,
        exclude: &[EnemyId],
    ) -> Option<EnemyId> {
        self.enemies
            .values()
            .filter(|state| state.is_alive() && !exclude.contains(&state.id))
            .find(|state| state.position.distance(point) < radius)
            .map(|state| state.id)
    }

    /// Applies a single hit and resolves any death pulses it triggers.
    pub(crate) fn hit(&mut self, enemy: EnemyId, amount: u32, damage_type: DamageType) -> Hit {
        let outcome = self.strike(enemy, amount, damage_type);
        self.release_pulses();
        outcome
    }

    /// Damages every live enemy within `radius` of `center` except `exclude`.
    pub(crate) fn splash(
        &mut self,
        center: Vec2,
        radius: f32,
        amount: u32,
        damage_type: DamageType,
        exclude: EnemyId,
    ) {
        for victim in self.within(center, radius, exclude) {
            let _ = self.strike(victim, amount, damage_type);
        }
        self.release_pulses();
    }

    /// Slows a live enemy and reports the resulting multiplier.
    pub(crate) fn slow(&mut self, enemy: EnemyId, factor: f32, duration: Duration) {
        let Some(state) = self.enemies.get_mut(&enemy) else {
            return;
        };
        if let Some(multiplier) = state.apply_slow(factor, duration) {
            self.out.push(Event::EnemySlowed { enemy, multiplier });
        }
    }

    /// Slows every live enemy within `radius` of `center` except `exclude`.
    pub(crate) fn slow_area(
        &mut self,
        center: Vec2,
        radius: f32,
        factor: f32,
        duration: Duration,
        exclude: EnemyId,
    ) {
        for victim in self.within(center, radius, exclude) {
            self.slow(victim, factor, duration);
        }
    }

    fn within(&self, center: Vec2, radius: f32, exclude: EnemyId) -> Vec<EnemyId> {
        self.enemies
            .values()
            .filter(|state| {
                state.id != exclude
                    && state.is_alive()
                    && state.position.distance(center) <= radius
            })
            .map(|state| state.id)
            .collect()
    }

    fn strike(&mut self, enemy: EnemyId, amount: u32, damage_type: DamageType) -> Hit {
        let Some(state) = self.enemies.get_mut(&enemy) else {
            return Hit::Ignored;
        };
        let outcome = state.take_damage(amount, damage_type, &mut *self.rng);
        match outcome {
            Hit::Ignored => {}
            Hit::Dodged => self.out.push(Event::EnemyDodged { enemy }),
            Hit::Damaged { amount, killed } => {
                self.out.push(Event::EnemyDamaged { enemy, amount });
                if killed {
                    let reward = state.reward;
                    debug!(enemy = enemy.get(), kind = ?state.kind, wave = state.wave.get(), reward, "enemy killed");
                    if state.death_pulse.is_some() {
                        self.pulses.push_back(enemy);
                    }
                    self.ledger.killed.push((enemy, reward));
                    self.out.push(Event::EnemyKilled { enemy, reward });
                }
            }
        }
        outcome
    }

    fn release_pulses(&mut self) {
        while let Some(source) = self.pulses.pop_front() {
            let Some((position, pulse)) = self
                .enemies
                .get(&source)
                .and_then(|state| state.death_pulse.map(|pulse| (state.position, pulse)))
            else {
                continue;
            };
            self.out.push(Event::TankDetonated {
                enemy: source,
                position,
                radius: pulse.radius,
            });
            for victim in self.within(position, pulse.radius, source) {
                let _ = self.strike(victim, pulse.damage, DamageType::Magic);
            }
        }
    }
}
