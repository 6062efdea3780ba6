//! Game rule constants.
//!
//! Every tunable number the progression engine uses lives here so that the
//! formulas in `reward_formula`, `leveling` and `modifiers` read as plain
//! arithmetic.

use shared::{Difficulty, Priority};

/// Base XP paid by a quest of the given difficulty at normal priority
pub fn base_xp(difficulty: Difficulty) -> u64 {
    match difficulty {
        Difficulty::Trivial => 5,
        Difficulty::Easy => 15,
        Difficulty::Medium => 35,
        Difficulty::Hard => 70,
        Difficulty::Impossible => 150,
    }
}

pub fn priority_multiplier(priority: Priority) -> f64 {
    priority_multiplier_percent(priority) as f64 / 100.0
}

/// Priority multiplier as an integer percentage, used for exact flooring
pub fn priority_multiplier_percent(priority: Priority) -> u64 {
    match priority {
        Priority::Normal => 100,
        Priority::High => 150,
    }
}

/// Currency = ceil(xp / divisor)
pub const XP_TO_CURRENCY_DIVISOR: u64 = 4;

/// Subtasks are worth 30% of the equivalent quest
pub const SUBTASK_REWARD_PERCENT: u64 = 30;

/// Level threshold factor: threshold(level) = level * (level + 1) * factor
pub const LEVEL_THRESHOLD_FACTOR: u64 = 15;

pub const RARE_QUEST_CHANCE: f64 = 0.03;
/// x2.0
pub const RARE_QUEST_MULTIPLIER_PERCENT: u64 = 200;

/// A life area this many levels below the highest one gets the catch-up boost
pub const CATCH_UP_LEVEL_GAP: u32 = 3;
/// x1.2
pub const CATCH_UP_MULTIPLIER_PERCENT: u64 = 120;

pub const DEFAULT_USER_NAME: &str = "Chosen Undead";

pub const DEFAULT_LIFE_AREA_ICON: &str = "⭐";
pub const DEFAULT_LIFE_AREA_COLOR: &str = "#6366f1";

pub const MAX_TITLE_LENGTH: usize = 256;

pub const DEFAULT_TAGS: [&str; 10] = [
    "work", "personal", "health", "learning", "creative", "urgent", "important", "routine",
    "project", "social",
];

/// Suggested shop prices based on average earnings
pub struct SuggestedRewardPrices;

impl SuggestedRewardPrices {
    pub const SMALL: u64 = 50;
    pub const MEDIUM: u64 = 150;
    pub const LARGE: u64 = 500;
    pub const MAJOR: u64 = 1500;
}

pub const DEFAULT_REWARD_CATEGORY: &str = "custom";

/// A life area seeded on first run
pub struct DefaultLifeArea {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

pub const DEFAULT_LIFE_AREAS: [DefaultLifeArea; 8] = [
    DefaultLifeArea {
        id: "vitality",
        name: "Vitality",
        description: "Physical health, fitness, exercise, nutrition, sleep, and overall wellbeing. Build a stronger, healthier body.",
        icon: "❤️",
        color: "#ef4444",
    },
    DefaultLifeArea {
        id: "attunement",
        name: "Attunement",
        description: "Mindfulness, meditation, focus, mental clarity, and spiritual practices. Cultivate inner peace and awareness.",
        icon: "🧘",
        color: "#8b5cf6",
    },
    DefaultLifeArea {
        id: "endurance",
        name: "Endurance",
        description: "Consistency, perseverance, discipline, and building lasting habits. Develop the stamina to achieve long-term goals.",
        icon: "⚡",
        color: "#f59e0b",
    },
    DefaultLifeArea {
        id: "strength",
        name: "Strength",
        description: "Physical training, sports, challenging workouts, and pushing physical limits. Build power and resilience.",
        icon: "💪",
        color: "#dc2626",
    },
    DefaultLifeArea {
        id: "dexterity",
        name: "Dexterity",
        description: "Skills, hobbies, crafts, creative pursuits, and fine motor abilities. Develop precision and artistry.",
        icon: "🎯",
        color: "#059669",
    },
    DefaultLifeArea {
        id: "resistance",
        name: "Resistance",
        description: "Stress management, emotional regulation, mental health, and building psychological resilience.",
        icon: "🛡️",
        color: "#6366f1",
    },
    DefaultLifeArea {
        id: "intelligence",
        name: "Intelligence",
        description: "Learning, reading, studying, research, problem-solving, and expanding knowledge and cognitive abilities.",
        icon: "📚",
        color: "#0891b2",
    },
    DefaultLifeArea {
        id: "faith",
        name: "Faith",
        description: "Relationships, community, personal beliefs, social connections, and building meaningful bonds with others.",
        icon: "🤝",
        color: "#be185d",
    },
];

/// A shop reward seeded on first run
pub struct DefaultReward {
    pub name: &'static str,
    pub description: &'static str,
    pub cost: u64,
    pub category: &'static str,
}

pub const DEFAULT_REWARDS: [DefaultReward; 3] = [
    DefaultReward {
        name: "Coffee Break",
        description: "Enjoy a premium coffee",
        cost: SuggestedRewardPrices::SMALL,
        category: "food",
    },
    DefaultReward {
        name: "Movie Night",
        description: "Watch a movie of your choice",
        cost: SuggestedRewardPrices::MEDIUM,
        category: "entertainment",
    },
    DefaultReward {
        name: "Dinner Out",
        description: "Treat yourself to a nice dinner",
        cost: SuggestedRewardPrices::LARGE,
        category: "food",
    },
];
