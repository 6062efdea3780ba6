//! XP and currency formulas.
//!
//! Rewards are computed once when a quest or subtask is created and stored on
//! the record. Completion multiplies the stored amounts; it never re-runs these
//! formulas.

use shared::{Difficulty, Priority};

use super::game_config::{
    base_xp, priority_multiplier_percent, SUBTASK_REWARD_PERCENT, XP_TO_CURRENCY_DIVISOR,
};

/// A frozen XP/currency pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardAmounts {
    pub xp: u64,
    pub currency: u64,
}

/// floor(base XP * priority multiplier)
pub fn xp_reward(difficulty: Difficulty, priority: Priority) -> u64 {
    base_xp(difficulty) * priority_multiplier_percent(priority) / 100
}

/// ceil(xp / 4)
pub fn currency_from_xp(xp: u64) -> u64 {
    (xp + XP_TO_CURRENCY_DIVISOR - 1) / XP_TO_CURRENCY_DIVISOR
}

pub fn quest_reward(difficulty: Difficulty, priority: Priority) -> RewardAmounts {
    let xp = xp_reward(difficulty, priority);
    RewardAmounts { xp, currency: currency_from_xp(xp) }
}

/// Subtasks are scaled to 30% of the equivalent quest before flooring
pub fn subtask_reward(difficulty: Difficulty, priority: Priority) -> RewardAmounts {
    let xp = base_xp(difficulty) * priority_multiplier_percent(priority) * SUBTASK_REWARD_PERCENT
        / (100 * 100);
    RewardAmounts { xp, currency: currency_from_xp(xp) }
}
