//! Life-area leveling.

use shared::{LevelProgress, LifeArea};

use super::game_config::LEVEL_THRESHOLD_FACTOR;

/// XP needed to advance *into* `level`; advancing from `n` costs `xp_threshold(n + 1)`
pub fn xp_threshold(level: u32) -> u64 {
    let level = level as u64;
    level * (level + 1) * LEVEL_THRESHOLD_FACTOR
}

/// Result of crediting XP to a level/current-XP pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub level: u32,
    pub current_xp: u64,
    pub levels_gained: u32,
}

/// Adds `award` and rolls over as many thresholds as it crosses.
///
/// The threshold is recomputed for every level so a single large award can
/// span several levels. There is no level cap.
pub fn apply_xp(level: u32, current_xp: u64, award: u64) -> LevelUp {
    let mut level = level.max(1);
    let mut current_xp = current_xp + award;
    let mut levels_gained = 0;

    loop {
        let required = xp_threshold(level + 1);
        if current_xp < required {
            break;
        }
        current_xp -= required;
        level += 1;
        levels_gained += 1;
    }

    LevelUp { level, current_xp, levels_gained }
}

/// Credits `award` to the area in place and returns the number of levels gained
pub fn credit_life_area(area: &mut LifeArea, award: u64) -> u32 {
    let outcome = apply_xp(area.level, area.current_xp, award);
    area.level = outcome.level;
    area.current_xp = outcome.current_xp;
    area.total_xp += award;
    outcome.levels_gained
}

pub fn level_progress(area: &LifeArea) -> LevelProgress {
    let current = area.current_xp;
    let required = xp_threshold(area.level + 1);
    let percentage = if required == 0 {
        0.0
    } else {
        (current as f64 / required as f64 * 100.0).min(100.0)
    };
    LevelProgress { current, required, percentage }
}
