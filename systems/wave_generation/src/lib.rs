#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave generation keyed by wave index alone.
//!
//! Every wave of a run is generated up front from [`campaign`]; the same index
//! always yields the same directives, so tests can assert exact enemy counts.

use std::time::Duration;

use tower_siege_core::{EnemyKind, SpawnDirective, WaveId, WavePlan};

const BASIC_BASE_COUNT: u32 = 5;
const BASIC_COUNT_PER_WAVE: u32 = 2;
const BASIC_COUNT_CAP: u32 = 25;
const FAST_FIRST_WAVE: u32 = 4;
const TANK_FIRST_WAVE: u32 = 6;
const MIXED_BATCH_PERIOD: u32 = 5;
const BOSS_BATCH_PERIOD: u32 = 10;

/// Generates the full directive list for a single wave.
///
/// Wave indices start at one; index zero is treated as the first wave.
#[must_use]
pub fn wave_plan(wave: WaveId) -> WavePlan {
    let w = wave.get().max(1);
    let mut directives = Vec::new();

    let basic = (BASIC_BASE_COUNT + BASIC_COUNT_PER_WAVE * w).min(BASIC_COUNT_CAP);
    push(
        &mut directives,
        EnemyKind::Basic,
        basic,
        shrinking(2_000, 50, w, 800),
        0,
    );

    let fast = if w >= FAST_FIRST_WAVE { 2 * (w - 3) } else { 0 };
    push(
        &mut directives,
        EnemyKind::Fast,
        fast,
        shrinking(1_500, 30, w, 600),
        3_000,
    );

    let tank = if w >= TANK_FIRST_WAVE { (w - 5) / 2 } else { 0 };
    push(
        &mut directives,
        EnemyKind::Tank,
        tank,
        shrinking(3_000, 80, w, 1_200),
        8_000,
    );

    if w % BOSS_BATCH_PERIOD == 0 {
        push(
            &mut directives,
            EnemyKind::Tank,
            2 * (w / BOSS_BATCH_PERIOD),
            2_000,
            10_000,
        );
    }

    if w % MIXED_BATCH_PERIOD == 0 {
        push(&mut directives, EnemyKind::Basic, basic / 2, 500, 15_000);
        if w >= FAST_FIRST_WAVE {
            push(
                &mut directives,
                EnemyKind::Fast,
                (fast / 2).max(1),
                800,
                15_500,
            );
        }
    }

    WavePlan {
        wave: WaveId::new(w),
        directives,
        preparation_time: Duration::from_millis(u64::from(shrinking(15_000, 200, w, 5_000))),
        reward_multiplier: 1.0 + 0.1 * (w - 1) as f32,
    }
}

/// Generates plans for waves `1..=total_waves` in order.
#[must_use]
pub fn campaign(total_waves: u32) -> Vec<WavePlan> {
    (1..=total_waves).map(|wave| wave_plan(WaveId::new(wave))).collect()
}

fn push(
    directives: &mut Vec<SpawnDirective>,
    kind: EnemyKind,
    count: u32,
    interval_ms: u32,
    delay_ms: u32,
) {
    if count == 0 {
        return;
    }
    directives.push(SpawnDirective {
        kind,
        count,
        spawn_interval: Duration::from_millis(u64::from(interval_ms)),
        delay: Duration::from_millis(u64::from(delay_ms)),
    });
}

/// `max(floor, base - step * wave)` in whole milliseconds.
fn shrinking(base: u32, step: u32, wave: u32, floor: u32) -> u32 {
    base.saturating_sub(step.saturating_mul(wave)).max(floor)
}
