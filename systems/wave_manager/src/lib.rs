#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave state machine that paces enemy spawns across a run.
//!
//! The manager owns every pre-generated [`WavePlan`] and walks them through
//! `Waiting → Preparing → Spawning → Active → Completed`. It never touches the
//! world directly; spawns are emitted as [`Command::SpawnEnemy`] values.

use std::time::Duration;

use tower_siege_core::{
    geometry::scale_floor, Command, PlayMode, WaveId, WavePlan, WaveProgress, WaveStartError,
    WaveState,
};
use tower_siege_system_wave_generation::campaign;
use tracing::{debug, info};

/// Configuration parameters required to construct the wave manager.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    total_waves: u32,
    clear_bonus: u32,
    auto_advance: bool,
}

impl Config {
    /// Creates a new configuration for a run of `total_waves` waves.
    #[must_use]
    pub const fn new(total_waves: u32, clear_bonus: u32, auto_advance: bool) -> Self {
        Self {
            total_waves,
            clear_bonus,
            auto_advance,
        }
    }
}

/// Bonus owed for a cleared wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveCleared {
    /// Wave that was cleared.
    pub wave: WaveId,
    /// Money owed to the player.
    pub bonus: u32,
}

#[derive(Clone, Copy, Debug, Default)]
struct DirectiveCursor {
    accumulator: Duration,
    emitted: u32,
}

/// Wave state machine driven by frame time.
#[derive(Debug)]
pub struct WaveManager {
    plans: Vec<WavePlan>,
    clear_bonus: u32,
    auto_advance: bool,
    started: usize,
    state: WaveState,
    preparation_elapsed: Duration,
    wave_clock: Duration,
    cursors: Vec<DirectiveCursor>,
}

impl WaveManager {
    /// Creates a wave manager with the generated campaign for `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_plans(config, campaign(config.total_waves))
    }

    /// Creates a wave manager over explicit plans; the configured wave count is ignored.
    #[must_use]
    pub fn with_plans(config: Config, plans: Vec<WavePlan>) -> Self {
        Self {
            plans,
            clear_bonus: config.clear_bonus,
            auto_advance: config.auto_advance,
            started: 0,
            state: WaveState::Waiting,
            preparation_elapsed: Duration::ZERO,
            wave_clock: Duration::ZERO,
            cursors: Vec::new(),
        }
    }

    /// Advances the state machine by `dt` and emits due spawns.
    pub fn handle(&mut self, dt: Duration, play_mode: PlayMode, out: &mut Vec<Command>) {
        if play_mode != PlayMode::Running || dt.is_zero() {
            return;
        }

        let mut spawn_time = dt;
        if self.state == WaveState::Preparing {
            let Some(preparation) = self.current_plan().map(|plan| plan.preparation_time) else {
                return;
            };
            self.preparation_elapsed = self.preparation_elapsed.saturating_add(dt);
            if self.preparation_elapsed < preparation {
                return;
            }
            spawn_time = self.preparation_elapsed - preparation;
            self.begin_spawning();
        }

        if self.state == WaveState::Spawning {
            self.emit_spawns(spawn_time, out);
        }
    }

    /// Starts the next wave's preparation countdown.
    pub fn start_next_wave(&mut self) -> Result<(), WaveStartError> {
        if !matches!(self.state, WaveState::Waiting | WaveState::Completed) {
            return Err(WaveStartError::WaveInProgress(self.state));
        }
        if self.started >= self.plans.len() {
            return Err(WaveStartError::NoWavesRemaining);
        }

        self.started += 1;
        self.state = WaveState::Preparing;
        self.preparation_elapsed = Duration::ZERO;
        if let Some(plan) = self.current_plan() {
            info!(
                wave = plan.wave.get(),
                enemies = plan.total_enemies(),
                preparation_ms = plan.preparation_time.as_millis() as u64,
                "wave preparing"
            );
        }
        Ok(())
    }

    /// Skips the remaining preparation time, starting the next wave if needed.
    pub fn force_start(&mut self) -> Result<(), WaveStartError> {
        if self.state != WaveState::Preparing {
            self.start_next_wave()?;
        }
        self.begin_spawning();
        Ok(())
    }

    /// Marks the active wave as cleared and reports the bonus owed.
    ///
    /// Only accepted once every enemy of the wave has been emitted.
    pub fn complete_wave(&mut self) -> Option<WaveCleared> {
        if self.state != WaveState::Active {
            return None;
        }
        let plan = self.current_plan()?;
        let cleared = WaveCleared {
            wave: plan.wave,
            bonus: scale_floor(self.clear_bonus, plan.reward_multiplier),
        };
        self.state = WaveState::Completed;
        info!(wave = cleared.wave.get(), bonus = cleared.bonus, "wave completed");

        if self.auto_advance && self.started < self.plans.len() {
            let _ = self.start_next_wave();
        }
        Some(cleared)
    }

    /// Current phase of the state machine.
    #[must_use]
    pub fn state(&self) -> WaveState {
        self.state
    }

    /// Wave most recently started, if any.
    #[must_use]
    pub fn current_wave(&self) -> Option<WaveId> {
        self.current_plan().map(|plan| plan.wave)
    }

    /// Plan of the wave most recently started, if any.
    #[must_use]
    pub fn current_plan(&self) -> Option<&WavePlan> {
        self.started
            .checked_sub(1)
            .and_then(|index| self.plans.get(index))
    }

    /// Pre-generated plans for every wave of the run.
    #[must_use]
    pub fn plans(&self) -> &[WavePlan] {
        &self.plans
    }

    /// Number of waves in the run.
    #[must_use]
    pub fn total_waves(&self) -> u32 {
        u32::try_from(self.plans.len()).unwrap_or(u32::MAX)
    }

    /// Enemies the current wave still has to emit.
    #[must_use]
    pub fn remaining_to_spawn(&self) -> u32 {
        let total = self.current_plan().map_or(0, WavePlan::total_enemies);
        total.saturating_sub(self.spawned())
    }

    /// Reports whether every wave has been started and cleared.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.started >= self.plans.len()
            && (self.plans.is_empty() || self.state == WaveState::Completed)
    }

    /// Read-only summary of wave progression.
    #[must_use]
    pub fn progress(&self) -> WaveProgress {
        let preparation_remaining = match (self.state, self.current_plan()) {
            (WaveState::Preparing, Some(plan)) => plan
                .preparation_time
                .saturating_sub(self.preparation_elapsed),
            _ => Duration::ZERO,
        };
        WaveProgress {
            wave: self.current_wave().map_or(0, |wave| wave.get()),
            total_waves: self.total_waves(),
            state: self.state,
            spawned: self.spawned(),
            total_enemies: self.current_plan().map_or(0, WavePlan::total_enemies),
            preparation_remaining,
        }
    }

    fn spawned(&self) -> u32 {
        self.cursors.iter().map(|cursor| cursor.emitted).sum()
    }

    fn begin_spawning(&mut self) {
        let directive_count = self.current_plan().map_or(0, |plan| plan.directives.len());
        self.cursors.clear();
        self.cursors
            .resize(directive_count, DirectiveCursor::default());
        self.wave_clock = Duration::ZERO;
        self.preparation_elapsed = Duration::ZERO;
        self.state = WaveState::Spawning;
        if let Some(wave) = self.current_wave() {
            info!(wave = wave.get(), "wave spawning");
        }
        self.finish_spawning_if_exhausted();
    }

    fn emit_spawns(&mut self, dt: Duration, out: &mut Vec<Command>) {
        let Some(index) = self.started.checked_sub(1) else {
            return;
        };
        let Some(plan) = self.plans.get(index) else {
            return;
        };

        let before = self.wave_clock;
        self.wave_clock = self.wave_clock.saturating_add(dt);

        for (directive, cursor) in plan.directives.iter().zip(self.cursors.iter_mut()) {
            if cursor.emitted >= directive.count || self.wave_clock < directive.delay {
                continue;
            }

            let active_for = self.wave_clock - before.max(directive.delay);
            cursor.accumulator = cursor.accumulator.saturating_add(active_for);
            let attempts = resolve_spawn_attempts(
                &mut cursor.accumulator,
                directive.spawn_interval,
                directive.count - cursor.emitted,
            );

            for _ in 0..attempts {
                out.push(Command::SpawnEnemy {
                    kind: directive.kind,
                    wave: plan.wave,
                });
            }
            cursor.emitted += attempts;
            if attempts > 0 {
                debug!(
                    wave = plan.wave.get(),
                    kind = ?directive.kind,
                    emitted = cursor.emitted,
                    count = directive.count,
                    "spawn directive advanced"
                );
            }
        }

        self.finish_spawning_if_exhausted();
    }

    fn finish_spawning_if_exhausted(&mut self) {
        let Some(plan) = self.current_plan() else {
            return;
        };
        let exhausted = plan
            .directives
            .iter()
            .zip(&self.cursors)
            .all(|(directive, cursor)| cursor.emitted >= directive.count);
        if self.state == WaveState::Spawning && exhausted {
            let wave = plan.wave;
            self.state = WaveState::Active;
            info!(wave = wave.get(), "wave fully spawned");
        }
    }
}

/// Drains whole intervals from `accumulator`, emitting at most `remaining`.
fn resolve_spawn_attempts(accumulator: &mut Duration, interval: Duration, remaining: u32) -> u32 {
    if interval.is_zero() {
        *accumulator = Duration::ZERO;
        return remaining;
    }

    let mut attempts = 0;
    while attempts < remaining && *accumulator >= interval {
        *accumulator -= interval;
        attempts += 1;
    }
    attempts
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_siege_core::{EnemyKind, SpawnDirective};

    #[test]
    fn resolves_spawn_attempts_without_interval() {
        let mut accumulator = Duration::from_secs(10);
        assert_eq!(resolve_spawn_attempts(&mut accumulator, Duration::ZERO, 3), 3);
        assert_eq!(accumulator, Duration::ZERO);
    }

    #[test]
    fn spawn_attempts_are_capped_by_remaining_count() {
        let mut accumulator = Duration::from_secs(10);
        assert_eq!(
            resolve_spawn_attempts(&mut accumulator, Duration::from_secs(1), 4),
            4
        );
        assert_eq!(accumulator, Duration::from_secs(6));
    }

    #[test]
    fn starts_waiting_and_refuses_double_start() {
        let mut manager = manager(vec![single_plan(1, 2)]);
        assert_eq!(manager.state(), WaveState::Waiting);
        assert_eq!(manager.current_wave(), None);

        manager.start_next_wave().expect("first wave starts");
        assert_eq!(manager.state(), WaveState::Preparing);
        assert_eq!(
            manager.start_next_wave(),
            Err(WaveStartError::WaveInProgress(WaveState::Preparing))
        );
    }

    #[test]
    fn preparation_overflow_feeds_the_spawn_clock() {
        let mut manager = manager(vec![single_plan(1, 3)]);
        manager.start_next_wave().expect("wave starts");
        let mut out = Vec::new();

        manager.handle(Duration::from_millis(900), PlayMode::Running, &mut out);
        assert!(out.is_empty());
        assert_eq!(
            manager.progress().preparation_remaining,
            Duration::from_millis(100)
        );

        manager.handle(Duration::from_millis(1_600), PlayMode::Running, &mut out);
        assert_eq!(manager.state(), WaveState::Spawning);
        assert_eq!(out.len(), 1, "1.5 s into the wave only the first 1 s interval elapsed");
    }

    #[test]
    fn paused_play_freezes_the_clock() {
        let mut manager = manager(vec![single_plan(1, 3)]);
        manager.start_next_wave().expect("wave starts");
        let mut out = Vec::new();

        manager.handle(Duration::from_secs(5), PlayMode::Paused, &mut out);

        assert_eq!(manager.state(), WaveState::Preparing);
        assert_eq!(manager.progress().preparation_remaining, Duration::from_secs(1));
    }

    #[test]
    fn completion_requires_active_state_and_pays_scaled_bonus() {
        let mut plan = single_plan(1, 1);
        plan.reward_multiplier = 1.5;
        let mut manager = manager(vec![plan]);
        assert_eq!(manager.complete_wave(), None);

        manager.force_start().expect("wave force started");
        let mut out = Vec::new();
        manager.handle(Duration::from_secs(1), PlayMode::Running, &mut out);
        assert_eq!(manager.state(), WaveState::Active);

        assert_eq!(
            manager.complete_wave(),
            Some(WaveCleared {
                wave: WaveId::new(1),
                bonus: 75,
            })
        );
        assert!(manager.is_finished());
        assert_eq!(
            manager.start_next_wave(),
            Err(WaveStartError::NoWavesRemaining)
        );
    }

    #[test]
    fn auto_advance_prepares_the_following_wave() {
        let mut manager = WaveManager::with_plans(
            Config::new(2, 50, true),
            vec![single_plan(1, 1), single_plan(2, 1)],
        );
        manager.force_start().expect("wave force started");
        let mut out = Vec::new();
        manager.handle(Duration::from_secs(1), PlayMode::Running, &mut out);

        let cleared = manager.complete_wave().expect("wave was active");
        assert_eq!(cleared.wave, WaveId::new(1));
        assert_eq!(manager.state(), WaveState::Preparing);
        assert_eq!(manager.current_wave(), Some(WaveId::new(2)));
    }

    #[test]
    fn generated_campaign_matches_configured_length() {
        let manager = WaveManager::new(Config::new(30, 50, false));

        assert_eq!(manager.total_waves(), 30);
        assert_eq!(manager.plans()[0].total_enemies(), 7);
        assert_eq!(manager.progress().fraction(), 0.0);
    }

    fn manager(plans: Vec<WavePlan>) -> WaveManager {
        WaveManager::with_plans(Config::new(0, 50, false), plans)
    }

    fn single_plan(wave: u32, count: u32) -> WavePlan {
        WavePlan {
            wave: WaveId::new(wave),
            directives: vec![SpawnDirective {
                kind: EnemyKind::Basic,
                count,
                spawn_interval: Duration::from_secs(1),
                delay: Duration::ZERO,
            }],
            preparation_time: Duration::from_secs(1),
            reward_multiplier: 1.0,
        }
    }
}
