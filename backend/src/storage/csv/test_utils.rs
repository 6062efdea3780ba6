//! Test utilities for the CSV storage and the services built on it
//!
//! The temporary data directory is removed when the environment is dropped,
//! even if the test panics.

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use shared::{Difficulty, LifeArea, Priority, Quest, Reward, Subtask, User};
use std::collections::BTreeSet;
use tempfile::TempDir;

use super::connection::CsvConnection;

/// Test environment that owns a temporary data directory and a connection to it
pub struct TestEnvironment {
    pub connection: CsvConnection,
    /// Base directory path for manual inspection if needed
    pub base_path: std::path::PathBuf,
    _temp_dir: TempDir, // Keep alive to prevent cleanup
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let connection = CsvConnection::new(temp_dir.path())?;
        Ok(Self {
            connection,
            base_path: temp_dir.path().to_path_buf(),
            _temp_dir: temp_dir,
        })
    }
}

/// 2025-03-12 08:00 UTC, a Wednesday
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 12, 8, 0, 0).unwrap()
}

pub fn sample_user() -> User {
    let now = fixed_now();
    User {
        id: "user-1".to_string(),
        name: "Chosen Undead".to_string(),
        total_xp: 0,
        total_currency: 0,
        week_starts_on_sunday: true,
        created_at: now,
        last_active_at: now,
        sync_id: None,
    }
}

pub fn sample_life_area(id: &str, name: &str) -> LifeArea {
    let now = fixed_now();
    LifeArea {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{} things", name),
        icon: "⭐".to_string(),
        color: "#6366f1".to_string(),
        level: 1,
        current_xp: 0,
        total_xp: 0,
        is_custom: true,
        is_active: true,
        created_at: now,
        updated_at: now,
        sync_id: None,
        last_sync_at: None,
    }
}

pub fn sample_quest(id: &str, life_area_id: &str) -> Quest {
    let now = fixed_now();
    Quest {
        id: id.to_string(),
        title: format!("Quest {}", id),
        description: Some("Do the thing, then the other thing".to_string()),
        difficulty: Difficulty::Medium,
        priority: Priority::Normal,
        life_area_id: life_area_id.to_string(),
        tags: BTreeSet::from(["health".to_string(), "morning".to_string()]),
        is_completed: false,
        completed_at: None,
        completed_subtasks: 0,
        total_subtasks: 0,
        xp_reward: 35,
        currency_reward: 9,
        was_rare_quest: false,
        created_at: now,
        updated_at: now,
        due_date: None,
        recurrence: None,
        sync_id: Some(format!("sync-{}", id)),
        last_sync_at: None,
    }
}

pub fn sample_subtask(id: &str, quest_id: &str) -> Subtask {
    let now = fixed_now();
    Subtask {
        id: id.to_string(),
        quest_id: quest_id.to_string(),
        title: format!("Step {}", id),
        description: None,
        difficulty: Difficulty::Easy,
        priority: Priority::Normal,
        is_completed: false,
        completed_at: None,
        xp_reward: 4,
        currency_reward: 1,
        created_at: now,
        updated_at: now,
        sync_id: None,
    }
}

pub fn sample_reward(id: &str, name: &str, cost: u64) -> Reward {
    let now = fixed_now();
    Reward {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        cost,
        category: "custom".to_string(),
        is_custom: true,
        is_purchased: false,
        purchased_at: None,
        created_at: now,
        updated_at: now,
        sync_id: None,
    }
}
