//! # CSV Quest Repository
//!
//! Quests are stored one per row in `quests.csv`. Tags are joined with `;`
//! and the embedded recurrence is flattened into `recurrence_*` columns that
//! stay empty for one-off quests.
//!
//! ```csv
//! id,title,description,difficulty,priority,life_area_id,tags,is_completed,...,recurrence_type,recurrence_target_count,...
//! 4b1f...,Morning run,,hard,high,vitality,health;morning,false,...,daily,1,...
//! ```

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{Difficulty, Priority, Quest, Recurrence, RecurrenceType};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use super::connection::{CsvConnection, QUESTS_FILE};
use crate::storage::traits::{ChangeSet, Connection, QuestStorage};

const TAG_SEPARATOR: &str = ";";

/// CSV record structure for quests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct QuestRecord {
    pub(super) id: String,
    title: String,
    description: Option<String>,
    difficulty: String,
    priority: String,
    life_area_id: String,
    tags: String,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    completed_subtasks: u32,
    total_subtasks: u32,
    xp_reward: u64,
    currency_reward: u64,
    was_rare_quest: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    due_date: Option<DateTime<Utc>>,
    recurrence_type: Option<String>,
    recurrence_target_count: Option<u32>,
    recurrence_completed_count: Option<u32>,
    recurrence_last_reset: Option<DateTime<Utc>>,
    recurrence_next_reset: Option<DateTime<Utc>>,
    recurrence_is_active: Option<bool>,
    recurrence_streak: Option<u32>,
    recurrence_last_payout_xp: Option<u64>,
    recurrence_last_payout_currency: Option<u64>,
    sync_id: Option<String>,
    last_sync_at: Option<DateTime<Utc>>,
}

impl From<Quest> for QuestRecord {
    fn from(quest: Quest) -> Self {
        let tags = quest.tags.into_iter().collect::<Vec<_>>().join(TAG_SEPARATOR);
        let recurrence = quest.recurrence;
        QuestRecord {
            id: quest.id,
            title: quest.title,
            description: quest.description,
            difficulty: quest.difficulty.to_string(),
            priority: quest.priority.to_string(),
            life_area_id: quest.life_area_id,
            tags,
            is_completed: quest.is_completed,
            completed_at: quest.completed_at,
            completed_subtasks: quest.completed_subtasks,
            total_subtasks: quest.total_subtasks,
            xp_reward: quest.xp_reward,
            currency_reward: quest.currency_reward,
            was_rare_quest: quest.was_rare_quest,
            created_at: quest.created_at,
            updated_at: quest.updated_at,
            due_date: quest.due_date,
            recurrence_type: recurrence.as_ref().map(|r| r.recurrence_type.to_string()),
            recurrence_target_count: recurrence.as_ref().map(|r| r.target_count),
            recurrence_completed_count: recurrence.as_ref().map(|r| r.completed_count),
            recurrence_last_reset: recurrence.as_ref().map(|r| r.last_reset),
            recurrence_next_reset: recurrence.as_ref().map(|r| r.next_reset),
            recurrence_is_active: recurrence.as_ref().map(|r| r.is_active),
            recurrence_streak: recurrence.as_ref().map(|r| r.streak),
            recurrence_last_payout_xp: recurrence.as_ref().map(|r| r.last_payout_xp),
            recurrence_last_payout_currency: recurrence.as_ref().map(|r| r.last_payout_currency),
            sync_id: quest.sync_id,
            last_sync_at: quest.last_sync_at,
        }
    }
}

impl TryFrom<QuestRecord> for Quest {
    type Error = anyhow::Error;

    fn try_from(record: QuestRecord) -> Result<Self> {
        let difficulty: Difficulty = record.difficulty.parse()?;
        let priority: Priority = record.priority.parse()?;
        let tags: BTreeSet<String> = record
            .tags
            .split(TAG_SEPARATOR)
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();

        let recurrence = match record.recurrence_type {
            None => None,
            Some(kind) => {
                let recurrence_type: RecurrenceType = kind.parse()?;
                let last_reset = record
                    .recurrence_last_reset
                    .context("recurring quest is missing last_reset")?;
                let next_reset = record
                    .recurrence_next_reset
                    .context("recurring quest is missing next_reset")?;
                Some(Recurrence {
                    recurrence_type,
                    target_count: record.recurrence_target_count.unwrap_or(1).max(1),
                    completed_count: record.recurrence_completed_count.unwrap_or(0),
                    last_reset,
                    next_reset,
                    is_active: record.recurrence_is_active.unwrap_or(true),
                    streak: record.recurrence_streak.unwrap_or(0),
                    last_payout_xp: record.recurrence_last_payout_xp.unwrap_or(0),
                    last_payout_currency: record.recurrence_last_payout_currency.unwrap_or(0),
                })
            }
        };

        Ok(Quest {
            id: record.id,
            title: record.title,
            description: record.description,
            difficulty,
            priority,
            life_area_id: record.life_area_id,
            tags,
            is_completed: record.is_completed,
            completed_at: record.completed_at,
            completed_subtasks: record.completed_subtasks,
            total_subtasks: record.total_subtasks,
            xp_reward: record.xp_reward,
            currency_reward: record.currency_reward,
            was_rare_quest: record.was_rare_quest,
            created_at: record.created_at,
            updated_at: record.updated_at,
            due_date: record.due_date,
            recurrence,
            sync_id: record.sync_id,
            last_sync_at: record.last_sync_at,
        })
    }
}

#[derive(Clone)]
pub struct QuestRepository {
    connection: CsvConnection,
}

impl QuestRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    /// Read every quest, newest first. Rows that fail to parse are skipped.
    fn read_quests(&self) -> Result<Vec<Quest>> {
        let records: Vec<QuestRecord> = self.connection.read_table(QUESTS_FILE)?;
        let mut quests = Vec::with_capacity(records.len());
        for record in records {
            let id = record.id.clone();
            match Quest::try_from(record) {
                Ok(quest) => quests.push(quest),
                Err(e) => warn!("Failed to parse quest record {}: {}. Skipping.", id, e),
            }
        }
        quests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(quests)
    }
}

#[async_trait]
impl QuestStorage for QuestRepository {
    async fn store_quest(&self, quest: &Quest) -> Result<()> {
        debug!("Storing quest {}", quest.id);
        self.connection
            .commit(ChangeSet::new().with_quest(quest.clone()))
            .await
    }

    async fn bulk_store_quests(&self, quests: &[Quest]) -> Result<()> {
        debug!("Storing {} quests", quests.len());
        let mut changes = ChangeSet::new();
        changes.quests.extend(quests.iter().cloned());
        self.connection.commit(changes).await
    }

    async fn get_quest(&self, quest_id: &str) -> Result<Option<Quest>> {
        Ok(self.read_quests()?.into_iter().find(|q| q.id == quest_id))
    }

    async fn list_quests(&self) -> Result<Vec<Quest>> {
        self.read_quests()
    }

    async fn list_quests_for_life_area(&self, life_area_id: &str) -> Result<Vec<Quest>> {
        Ok(self
            .read_quests()?
            .into_iter()
            .filter(|q| q.life_area_id == life_area_id)
            .collect())
    }

    async fn list_quests_with_tag(&self, tag: &str) -> Result<Vec<Quest>> {
        Ok(self
            .read_quests()?
            .into_iter()
            .filter(|q| q.tags.contains(tag))
            .collect())
    }

    async fn list_active_recurring_quests(&self) -> Result<Vec<Quest>> {
        Ok(self
            .read_quests()?
            .into_iter()
            .filter(Quest::has_active_recurrence)
            .collect())
    }

    async fn update_quest(&self, quest: &Quest) -> Result<()> {
        if self.get_quest(&quest.id).await?.is_none() {
            return Err(anyhow!("Quest {} does not exist", quest.id));
        }
        self.store_quest(quest).await
    }

    async fn delete_quest(&self, quest_id: &str) -> Result<bool> {
        if self.get_quest(quest_id).await?.is_none() {
            return Ok(false);
        }
        self.connection
            .commit(ChangeSet::new().delete_quest(quest_id))
            .await?;
        Ok(true)
    }
}
