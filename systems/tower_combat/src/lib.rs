#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits projectile firing commands from targeting data.

use tower_siege_core::{
    Command, PlayMode, TowerCooldownSnapshot, TowerCooldownView, TowerId, TowerTarget,
};

/// Tower combat system that queues firing commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireProjectile` entries for towers ready to fire.
    ///
    /// A ready tower whose burst is still pending but which lost its target
    /// receives `Command::EndBurst` so the main cooldown takes over.
    pub fn handle(
        &mut self,
        play_mode: PlayMode,
        tower_cooldowns: TowerCooldownView,
        tower_targets: &[TowerTarget],
        out: &mut Vec<Command>,
    ) {
        if play_mode != PlayMode::Running {
            return;
        }

        let cooldowns = tower_cooldowns.into_vec();
        if cooldowns.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in tower_targets {
            if let Some(snapshot) = find_cooldown(&cooldowns, target.tower) {
                if snapshot.ready {
                    self.scratch.push(Command::FireProjectile {
                        tower: target.tower,
                        target: target.enemy,
                    });
                }
            }
        }

        for snapshot in &cooldowns {
            if !snapshot.ready || !snapshot.burst_pending {
                continue;
            }
            let targeted = tower_targets
                .iter()
                .any(|target| target.tower == snapshot.tower);
            if !targeted {
                self.scratch.push(Command::EndBurst {
                    tower: snapshot.tower,
                });
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

fn find_cooldown(
    cooldowns: &[TowerCooldownSnapshot],
    tower: TowerId,
) -> Option<&TowerCooldownSnapshot> {
    cooldowns
        .binary_search_by_key(&tower, |snapshot| snapshot.tower)
        .ok()
        .map(|index| &cooldowns[index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_siege_core::{EnemyId, TowerKind, Vec2};

    #[test]
    fn paused_mode_is_silent() {
        let mut system = TowerCombat::new();
        let cooldowns = TowerCooldownView::from_snapshots(vec![snapshot(1, true, false)]);
        let targets = vec![target(1, 7)];
        let mut out = Vec::new();

        system.handle(PlayMode::Paused, cooldowns, &targets, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn firing_respects_cooldown_readiness() {
        let mut system = TowerCombat::new();
        let cooldowns = TowerCooldownView::from_snapshots(vec![
            snapshot(5, true, false),
            snapshot(2, true, false),
        ]);
        let targets = vec![target(2, 4), target(5, 1)];
        let mut out = Vec::new();

        system.handle(PlayMode::Running, cooldowns, &targets, &mut out);

        assert_eq!(
            out,
            vec![
                Command::FireProjectile {
                    tower: TowerId::new(2),
                    target: EnemyId::new(4),
                },
                Command::FireProjectile {
                    tower: TowerId::new(5),
                    target: EnemyId::new(1),
                },
            ],
        );
    }

    #[test]
    fn non_ready_or_missing_towers_are_skipped() {
        let mut system = TowerCombat::new();
        let cooldowns = TowerCooldownView::from_snapshots(vec![
            snapshot(3, false, false),
            snapshot(8, true, false),
        ]);
        let targets = vec![target(3, 9), target(8, 2), target(42, 3)];
        let mut out = Vec::new();

        system.handle(PlayMode::Running, cooldowns, &targets, &mut out);

        assert_eq!(
            out,
            vec![Command::FireProjectile {
                tower: TowerId::new(8),
                target: EnemyId::new(2),
            }],
        );
    }

    #[test]
    fn burst_without_target_is_ended() {
        let mut system = TowerCombat::new();
        let cooldowns = TowerCooldownView::from_snapshots(vec![
            snapshot(1, true, true),
            snapshot(2, true, true),
            snapshot(3, false, true),
        ]);
        let targets = vec![target(2, 6)];
        let mut out = Vec::new();

        system.handle(PlayMode::Running, cooldowns, &targets, &mut out);

        assert_eq!(
            out,
            vec![
                Command::FireProjectile {
                    tower: TowerId::new(2),
                    target: EnemyId::new(6),
                },
                Command::EndBurst {
                    tower: TowerId::new(1),
                },
            ],
        );
    }

    fn snapshot(tower: u32, ready: bool, burst_pending: bool) -> TowerCooldownSnapshot {
        TowerCooldownSnapshot {
            tower: TowerId::new(tower),
            kind: TowerKind::Machine,
            ready,
            burst_pending,
        }
    }

    fn target(tower: u32, enemy: u32) -> TowerTarget {
        TowerTarget {
            tower: TowerId::new(tower),
            enemy: EnemyId::new(enemy),
            tower_position: Vec2::ZERO,
            enemy_position: Vec2::ZERO,
        }
    }
}
