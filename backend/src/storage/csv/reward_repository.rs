//! # CSV Reward Repository
//!
//! Shop rewards are stored in `rewards.csv`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::Reward;
use tracing::debug;

use super::connection::{CsvConnection, REWARDS_FILE};
use crate::storage::traits::{ChangeSet, Connection, RewardStorage};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct RewardRecord {
    pub(super) id: String,
    name: String,
    description: Option<String>,
    cost: u64,
    category: String,
    is_custom: bool,
    is_purchased: bool,
    purchased_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    sync_id: Option<String>,
}

impl From<Reward> for RewardRecord {
    fn from(reward: Reward) -> Self {
        RewardRecord {
            id: reward.id,
            name: reward.name,
            description: reward.description,
            cost: reward.cost,
            category: reward.category,
            is_custom: reward.is_custom,
            is_purchased: reward.is_purchased,
            purchased_at: reward.purchased_at,
            created_at: reward.created_at,
            updated_at: reward.updated_at,
            sync_id: reward.sync_id,
        }
    }
}

impl From<RewardRecord> for Reward {
    fn from(record: RewardRecord) -> Self {
        Reward {
            id: record.id,
            name: record.name,
            description: record.description,
            cost: record.cost,
            category: record.category,
            is_custom: record.is_custom,
            is_purchased: record.is_purchased,
            purchased_at: record.purchased_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
            sync_id: record.sync_id,
        }
    }
}

#[derive(Clone)]
pub struct RewardRepository {
    connection: CsvConnection,
}

impl RewardRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_rewards(&self) -> Result<Vec<Reward>> {
        let records: Vec<RewardRecord> = self.connection.read_table(REWARDS_FILE)?;
        Ok(records.into_iter().map(Reward::from).collect())
    }
}

#[async_trait]
impl RewardStorage for RewardRepository {
    async fn store_reward(&self, reward: &Reward) -> Result<()> {
        debug!("Storing reward {}", reward.id);
        self.connection
            .commit(ChangeSet::new().with_reward(reward.clone()))
            .await
    }

    async fn bulk_store_rewards(&self, rewards: &[Reward]) -> Result<()> {
        let mut changes = ChangeSet::new();
        changes.rewards.extend(rewards.iter().cloned());
        self.connection.commit(changes).await
    }

    async fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>> {
        Ok(self.read_rewards()?.into_iter().find(|r| r.id == reward_id))
    }

    async fn list_rewards(&self) -> Result<Vec<Reward>> {
        let mut rewards = self.read_rewards()?;
        rewards.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rewards)
    }

    async fn update_reward(&self, reward: &Reward) -> Result<()> {
        if self.get_reward(&reward.id).await?.is_none() {
            return Err(anyhow!("Reward {} does not exist", reward.id));
        }
        self.store_reward(reward).await
    }

    async fn delete_reward(&self, reward_id: &str) -> Result<bool> {
        if self.get_reward(reward_id).await?.is_none() {
            return Ok(false);
        }
        self.connection
            .commit(ChangeSet::new().delete_reward(reward_id))
            .await?;
        Ok(true)
    }
}
