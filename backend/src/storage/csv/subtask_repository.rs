//! # CSV Subtask Repository
//!
//! All subtasks share `subtasks.csv`, linked to their quest by `quest_id`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{Difficulty, Priority, Subtask};
use tracing::{debug, warn};

use super::connection::{CsvConnection, SUBTASKS_FILE};
use crate::storage::traits::{ChangeSet, Connection, SubtaskStorage};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct SubtaskRecord {
    pub(super) id: String,
    quest_id: String,
    title: String,
    description: Option<String>,
    difficulty: String,
    priority: String,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    xp_reward: u64,
    currency_reward: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    sync_id: Option<String>,
}

impl From<Subtask> for SubtaskRecord {
    fn from(subtask: Subtask) -> Self {
        SubtaskRecord {
            id: subtask.id,
            quest_id: subtask.quest_id,
            title: subtask.title,
            description: subtask.description,
            difficulty: subtask.difficulty.to_string(),
            priority: subtask.priority.to_string(),
            is_completed: subtask.is_completed,
            completed_at: subtask.completed_at,
            xp_reward: subtask.xp_reward,
            currency_reward: subtask.currency_reward,
            created_at: subtask.created_at,
            updated_at: subtask.updated_at,
            sync_id: subtask.sync_id,
        }
    }
}

impl TryFrom<SubtaskRecord> for Subtask {
    type Error = anyhow::Error;

    fn try_from(record: SubtaskRecord) -> Result<Self> {
        Ok(Subtask {
            difficulty: record.difficulty.parse()?,
            priority: record.priority.parse()?,
            id: record.id,
            quest_id: record.quest_id,
            title: record.title,
            description: record.description,
            is_completed: record.is_completed,
            completed_at: record.completed_at,
            xp_reward: record.xp_reward,
            currency_reward: record.currency_reward,
            created_at: record.created_at,
            updated_at: record.updated_at,
            sync_id: record.sync_id,
        })
    }
}

#[derive(Clone)]
pub struct SubtaskRepository {
    connection: CsvConnection,
}

impl SubtaskRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_subtasks(&self) -> Result<Vec<Subtask>> {
        let records: Vec<SubtaskRecord> = self.connection.read_table(SUBTASKS_FILE)?;
        let mut subtasks = Vec::with_capacity(records.len());
        for record in records {
            let id = record.id.clone();
            match Subtask::try_from(record) {
                Ok(subtask) => subtasks.push(subtask),
                Err(e) => warn!("Failed to parse subtask record {}: {}. Skipping.", id, e),
            }
        }
        Ok(subtasks)
    }
}

#[async_trait]
impl SubtaskStorage for SubtaskRepository {
    async fn store_subtask(&self, subtask: &Subtask) -> Result<()> {
        debug!("Storing subtask {} for quest {}", subtask.id, subtask.quest_id);
        self.connection
            .commit(ChangeSet::new().with_subtask(subtask.clone()))
            .await
    }

    async fn bulk_store_subtasks(&self, subtasks: &[Subtask]) -> Result<()> {
        debug!("Storing {} subtasks", subtasks.len());
        let mut changes = ChangeSet::new();
        changes.subtasks.extend(subtasks.iter().cloned());
        self.connection.commit(changes).await
    }

    async fn get_subtask(&self, subtask_id: &str) -> Result<Option<Subtask>> {
        Ok(self.read_subtasks()?.into_iter().find(|s| s.id == subtask_id))
    }

    async fn list_subtasks_for_quest(&self, quest_id: &str) -> Result<Vec<Subtask>> {
        let mut subtasks: Vec<Subtask> = self
            .read_subtasks()?
            .into_iter()
            .filter(|s| s.quest_id == quest_id)
            .collect();
        subtasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(subtasks)
    }

    async fn update_subtask(&self, subtask: &Subtask) -> Result<()> {
        if self.get_subtask(&subtask.id).await?.is_none() {
            return Err(anyhow!("Subtask {} does not exist", subtask.id));
        }
        self.store_subtask(subtask).await
    }

    async fn delete_subtask(&self, subtask_id: &str) -> Result<bool> {
        if self.get_subtask(subtask_id).await?.is_none() {
            return Ok(false);
        }
        self.connection
            .commit(ChangeSet::new().delete_subtask(subtask_id))
            .await?;
        Ok(true)
    }
}
