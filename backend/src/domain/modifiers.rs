//! Completion-time reward modifiers: the rarity roll and the catch-up boost.
//!
//! Both are multiplicative and independent. The final XP and currency are
//! floored separately after all multipliers are applied.

use rand::Rng;
use shared::LifeArea;
use std::sync::{Arc, Mutex};

use super::game_config::{
    CATCH_UP_LEVEL_GAP, CATCH_UP_MULTIPLIER_PERCENT, RARE_QUEST_CHANCE,
    RARE_QUEST_MULTIPLIER_PERCENT,
};
use super::reward_formula::RewardAmounts;

/// Source of uniform draws in `[0, 1)` for the rarity roll
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

/// Thread-local RNG, the production source
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Replays a fixed sequence of draws, repeating the last one when exhausted
#[derive(Debug, Clone)]
pub struct FixedRoll {
    draws: Arc<Mutex<Vec<f64>>>,
}

impl FixedRoll {
    pub fn new(mut draws: Vec<f64>) -> Self {
        draws.reverse();
        Self { draws: Arc::new(Mutex::new(draws)) }
    }

    /// Every roll is rare
    pub fn always_rare() -> Self {
        Self::new(vec![0.0])
    }

    /// No roll is ever rare
    pub fn never_rare() -> Self {
        Self::new(vec![0.99])
    }
}

impl RandomSource for FixedRoll {
    fn next_f64(&self) -> f64 {
        let mut draws = match self.draws.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if draws.len() > 1 {
            draws.pop().unwrap_or(1.0)
        } else {
            draws.last().copied().unwrap_or(1.0)
        }
    }
}

pub fn roll_rarity(random: &dyn RandomSource) -> bool {
    random.next_f64() < RARE_QUEST_CHANCE
}

/// True when `area_level` trails the highest level across all areas by the catch-up gap
pub fn catch_up_applies(area_level: u32, all_areas: &[LifeArea]) -> bool {
    let max_level = all_areas.iter().map(|a| a.level).max().unwrap_or(area_level);
    max_level.saturating_sub(area_level) >= CATCH_UP_LEVEL_GAP
}

/// The modifiers rolled for a single completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RolledModifiers {
    pub is_rare: bool,
    pub catch_up: bool,
}

impl RolledModifiers {
    fn rare_percent(&self) -> u64 {
        if self.is_rare { RARE_QUEST_MULTIPLIER_PERCENT } else { 100 }
    }

    fn catch_up_percent(&self) -> u64 {
        if self.catch_up { CATCH_UP_MULTIPLIER_PERCENT } else { 100 }
    }

    pub fn multiplier(&self) -> f64 {
        (self.rare_percent() * self.catch_up_percent()) as f64 / 10_000.0
    }

    /// Multiplies in integer percent so the floor is exact
    pub fn apply(&self, base: RewardAmounts) -> RewardAmounts {
        let scale = self.rare_percent() * self.catch_up_percent();
        RewardAmounts {
            xp: base.xp * scale / 10_000,
            currency: base.currency * scale / 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn area(id: &str, level: u32) -> LifeArea {
        let now = Utc::now();
        LifeArea {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            icon: String::new(),
            color: String::new(),
            level,
            current_xp: 0,
            total_xp: 0,
            is_custom: false,
            is_active: true,
            created_at: now,
            updated_at: now,
            sync_id: None,
            last_sync_at: None,
        }
    }

    #[test]
    fn test_fixed_roll_replays_then_repeats_last() {
        let roll = FixedRoll::new(vec![0.5, 0.01, 0.9]);
        assert_eq!(roll.next_f64(), 0.5);
        assert_eq!(roll.next_f64(), 0.01);
        assert_eq!(roll.next_f64(), 0.9);
        assert_eq!(roll.next_f64(), 0.9);
    }

    #[test]
    fn test_rarity_threshold() {
        assert!(roll_rarity(&FixedRoll::new(vec![0.0299])));
        assert!(!roll_rarity(&FixedRoll::new(vec![0.03])));
        assert!(roll_rarity(&FixedRoll::always_rare()));
        assert!(!roll_rarity(&FixedRoll::never_rare()));
    }

    #[test]
    fn test_rarity_rate_is_about_three_percent() {
        let random = ThreadRandom;
        let trials = 100_000;
        let hits = (0..trials).filter(|_| roll_rarity(&random)).count();
        let rate = hits as f64 / trials as f64;
        // Standard deviation is ~0.00054; allow well over 5 sigma
        assert!((rate - 0.03).abs() < 0.004, "observed rate {}", rate);
    }

    #[test]
    fn test_catch_up_gap() {
        let areas = vec![area("a", 5), area("b", 2), area("c", 3)];
        assert!(catch_up_applies(2, &areas));
        assert!(!catch_up_applies(3, &areas));
        assert!(!catch_up_applies(5, &areas));
    }

    #[test]
    fn test_catch_up_uses_current_max() {
        let areas = vec![area("a", 1), area("b", 1)];
        assert!(!catch_up_applies(1, &areas));
    }

    #[test]
    fn test_multipliers_stack() {
        let base = RewardAmounts { xp: 105, currency: 27 };

        let plain = RolledModifiers { is_rare: false, catch_up: false };
        assert_eq!(plain.apply(base), base);

        let rare = RolledModifiers { is_rare: true, catch_up: false };
        assert_eq!(rare.apply(base), RewardAmounts { xp: 210, currency: 54 });

        let catch_up = RolledModifiers { is_rare: false, catch_up: true };
        // 105 * 1.2 = 126, 27 * 1.2 = 32.4
        assert_eq!(catch_up.apply(base), RewardAmounts { xp: 126, currency: 32 });

        let both = RolledModifiers { is_rare: true, catch_up: true };
        assert!((both.multiplier() - 2.4).abs() < 1e-9);
        // 105 * 2.4 = 252, 27 * 2.4 = 64.8
        assert_eq!(both.apply(base), RewardAmounts { xp: 252, currency: 64 });
    }
}
