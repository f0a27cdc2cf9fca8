//! Wave and level descriptors
//!
//! Descriptors are static data produced once when a wave or level starts and
//! consumed to populate the entity store. Generation is deterministic in
//! (run seed, index) so a run can be replayed or resumed from a save.

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::EnemyKind;
use crate::tuning::{TacticsTuning, WaveTuning};

/// `count` enemies of one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnGroup {
    pub kind: EnemyKind,
    pub count: u32,
}

/// What a real-time wave contains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveDescriptor {
    /// 0-based wave index
    pub index: u32,
    pub groups: Vec<SpawnGroup>,
    /// Multiplier applied to every enemy's max health
    pub health_scale: f32,
    /// Whether a boss is part of this wave
    pub boss: bool,
    /// Last wave of the run
    pub final_wave: bool,
}

impl WaveDescriptor {
    pub fn total_enemies(&self) -> u32 {
        self.groups.iter().map(|g| g.count).sum()
    }
}

/// Per-(seed, index) RNG seed
fn mix_seed(seed: u64, index: u32) -> u64 {
    (index as u64)
        .wrapping_mul(2654435761)
        .wrapping_add(seed)
        .rotate_left(17)
}

/// Enemy kinds unlocked by a given wave
fn roster(index: u32) -> &'static [EnemyKind] {
    use EnemyKind::*;
    match index {
        0 => &[Grunt],
        1 => &[Grunt, Runner],
        2 => &[Grunt, Runner, Spitter],
        3 => &[Grunt, Runner, Spitter, Bomber],
        _ => &[Grunt, Runner, Spitter, Bomber, Splitter],
    }
}

/// Build the descriptor for wave `index`
pub fn generate_wave(index: u32, seed: u64, tuning: &WaveTuning) -> WaveDescriptor {
    let mut rng = Pcg32::seed_from_u64(mix_seed(seed, index));
    let pool = roster(index);

    let total = tuning.base_enemies + tuning.enemies_per_wave * index;
    let mut counts = vec![0u32; pool.len()];
    for _ in 0..total {
        counts[rng.random_range(0..pool.len())] += 1;
    }

    let mut groups: Vec<SpawnGroup> = pool
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(&kind, count)| SpawnGroup { kind, count })
        .collect();

    let final_wave = index + 1 >= tuning.waves_to_win;
    let boss = final_wave || (index + 1) % tuning.boss_every.max(1) == 0;
    if boss {
        groups.push(SpawnGroup {
            kind: EnemyKind::Boss,
            count: 1,
        });
    }

    let descriptor = WaveDescriptor {
        index,
        groups,
        health_scale: 1.0 + tuning.health_scale_per_wave * index as f32,
        boss,
        final_wave,
    };
    log::info!(
        "Wave {}: {} enemies, boss={}, final={}",
        index,
        descriptor.total_enemies(),
        boss,
        final_wave
    );
    descriptor
}

/// Grid layout for the turn-based mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    pub width: i32,
    pub height: i32,
    pub walls: Vec<IVec2>,
    pub player_start: IVec2,
    pub exit: IVec2,
    pub enemies: Vec<IVec2>,
    pub enemy_health: f32,
}

impl LevelDescriptor {
    pub fn in_bounds(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    pub fn is_wall(&self, cell: IVec2) -> bool {
        self.walls.contains(&cell)
    }

    /// Inside the grid and not a wall
    pub fn is_floor(&self, cell: IVec2) -> bool {
        self.in_bounds(cell) && !self.is_wall(cell)
    }
}

/// Build a grid level.
///
/// The row through the start and exit never gets walls, so the exit is always
/// reachable.
pub fn generate_level(seed: u64, depth: u32, tuning: &TacticsTuning) -> LevelDescriptor {
    let mut rng = Pcg32::seed_from_u64(mix_seed(seed ^ 0x7AC7, depth));
    let (w, h) = (tuning.width.max(3), tuning.height.max(3));
    let mid = h / 2;
    let player_start = IVec2::new(0, mid);
    let exit = IVec2::new(w - 1, mid);

    let mut enemies = Vec::new();
    let wanted = tuning.enemy_count as usize;
    let mut attempts = 0;
    while enemies.len() < wanted && attempts < wanted * 32 {
        attempts += 1;
        let cell = IVec2::new(rng.random_range(w / 2..w), rng.random_range(0..h));
        if cell != exit && cell != player_start && !enemies.contains(&cell) {
            enemies.push(cell);
        }
    }

    let mut walls = Vec::new();
    for y in 0..h {
        if y == mid {
            continue;
        }
        for x in 0..w {
            let cell = IVec2::new(x, y);
            if enemies.contains(&cell) {
                continue;
            }
            if rng.random::<f32>() < tuning.wall_density {
                walls.push(cell);
            }
        }
    }

    LevelDescriptor {
        width: w,
        height: h,
        walls,
        player_start,
        exit,
        enemies,
        enemy_health: tuning.enemy_health,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wave_generation_is_deterministic() {
        let t = WaveTuning::default();
        assert_eq!(generate_wave(3, 42, &t), generate_wave(3, 42, &t));
        assert_eq!(generate_wave(3, 42, &t).total_enemies(), t.base_enemies + 3 * t.enemies_per_wave);
    }

    #[test]
    fn test_first_wave_is_grunts_only() {
        let w = generate_wave(0, 7, &WaveTuning::default());
        assert_eq!(w.groups, vec![SpawnGroup { kind: EnemyKind::Grunt, count: 6 }]);
        assert!(!w.boss);
    }

    #[test]
    fn test_boss_cadence_and_final_wave() {
        let t = WaveTuning {
            waves_to_win: 3,
            boss_every: 2,
            ..Default::default()
        };
        assert!(!generate_wave(0, 1, &t).boss);
        assert!(generate_wave(1, 1, &t).boss);
        let last = generate_wave(2, 1, &t);
        assert!(last.boss && last.final_wave);
    }

    #[test]
    fn test_zero_boss_cadence_means_every_wave() {
        let t = WaveTuning {
            waves_to_win: 5,
            boss_every: 0,
            ..Default::default()
        };
        assert!(generate_wave(0, 1, &t).boss);
        assert!(!generate_wave(0, 1, &t).final_wave);
    }

    #[test]
    fn test_level_keeps_reserved_cells_clear() {
        let t = TacticsTuning {
            wall_density: 0.9,
            ..Default::default()
        };
        let level = generate_level(5, 0, &t);
        assert!(level.is_floor(level.player_start));
        assert!(level.is_floor(level.exit));
        for e in &level.enemies {
            assert!(level.is_floor(*e));
        }
        for x in 0..level.width {
            assert!(level.is_floor(IVec2::new(x, level.player_start.y)));
        }
        assert_eq!(level, generate_level(5, 0, &t));
    }
}
