//! # Storage Traits
//!
//! Record-store abstractions the domain layer works against. Each entity type
//! gets its own trait with add / get / update / delete / list plus the field
//! queries the domain needs. Multi-record writes go through
//! [`Connection::commit`] so that a completion never lands half-written.

use anyhow::Result;
use async_trait::async_trait;
use shared::{LifeArea, Quest, Reward, Subtask, User};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Storage for the singleton user record
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Get the installation's user, if one was created
    async fn get_user(&self) -> Result<Option<User>>;

    /// Create or replace the user record
    async fn store_user(&self, user: &User) -> Result<()>;
}

#[async_trait]
pub trait LifeAreaStorage: Send + Sync {
    async fn store_life_area(&self, life_area: &LifeArea) -> Result<()>;

    async fn bulk_store_life_areas(&self, life_areas: &[LifeArea]) -> Result<()>;

    async fn get_life_area(&self, life_area_id: &str) -> Result<Option<LifeArea>>;

    /// List all life areas ordered by name
    async fn list_life_areas(&self) -> Result<Vec<LifeArea>>;

    async fn update_life_area(&self, life_area: &LifeArea) -> Result<()>;

    /// Returns true if the life area existed
    async fn delete_life_area(&self, life_area_id: &str) -> Result<bool>;
}

#[async_trait]
pub trait QuestStorage: Send + Sync {
    async fn store_quest(&self, quest: &Quest) -> Result<()>;

    async fn bulk_store_quests(&self, quests: &[Quest]) -> Result<()>;

    async fn get_quest(&self, quest_id: &str) -> Result<Option<Quest>>;

    /// List all quests, newest first
    async fn list_quests(&self) -> Result<Vec<Quest>>;

    async fn list_quests_for_life_area(&self, life_area_id: &str) -> Result<Vec<Quest>>;

    async fn list_quests_with_tag(&self, tag: &str) -> Result<Vec<Quest>>;

    /// Quests carrying a recurrence that is still active
    async fn list_active_recurring_quests(&self) -> Result<Vec<Quest>>;

    async fn update_quest(&self, quest: &Quest) -> Result<()>;

    async fn delete_quest(&self, quest_id: &str) -> Result<bool>;
}

#[async_trait]
pub trait SubtaskStorage: Send + Sync {
    async fn store_subtask(&self, subtask: &Subtask) -> Result<()>;

    async fn bulk_store_subtasks(&self, subtasks: &[Subtask]) -> Result<()>;

    async fn get_subtask(&self, subtask_id: &str) -> Result<Option<Subtask>>;

    /// List a quest's subtasks in creation order
    async fn list_subtasks_for_quest(&self, quest_id: &str) -> Result<Vec<Subtask>>;

    async fn update_subtask(&self, subtask: &Subtask) -> Result<()>;

    async fn delete_subtask(&self, subtask_id: &str) -> Result<bool>;
}

#[async_trait]
pub trait RewardStorage: Send + Sync {
    async fn store_reward(&self, reward: &Reward) -> Result<()>;

    async fn bulk_store_rewards(&self, rewards: &[Reward]) -> Result<()>;

    async fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>>;

    /// List all rewards ordered by name
    async fn list_rewards(&self) -> Result<Vec<Reward>>;

    async fn update_reward(&self, reward: &Reward) -> Result<()>;

    async fn delete_reward(&self, reward_id: &str) -> Result<bool>;
}

/// A set of upserts and deletes applied all-or-nothing by [`Connection::commit`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub user: Option<User>,
    pub life_areas: Vec<LifeArea>,
    pub quests: Vec<Quest>,
    pub subtasks: Vec<Subtask>,
    pub rewards: Vec<Reward>,
    pub deleted_life_area_ids: Vec<String>,
    pub deleted_quest_ids: Vec<String>,
    pub deleted_subtask_ids: Vec<String>,
    pub deleted_reward_ids: Vec<String>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.user.is_none()
            && self.life_areas.is_empty()
            && self.quests.is_empty()
            && self.subtasks.is_empty()
            && self.rewards.is_empty()
            && self.deleted_life_area_ids.is_empty()
            && self.deleted_quest_ids.is_empty()
            && self.deleted_subtask_ids.is_empty()
            && self.deleted_reward_ids.is_empty()
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_life_area(mut self, life_area: LifeArea) -> Self {
        self.life_areas.push(life_area);
        self
    }

    pub fn with_quest(mut self, quest: Quest) -> Self {
        self.quests.push(quest);
        self
    }

    pub fn with_subtask(mut self, subtask: Subtask) -> Self {
        self.subtasks.push(subtask);
        self
    }

    pub fn with_reward(mut self, reward: Reward) -> Self {
        self.rewards.push(reward);
        self
    }

    pub fn delete_life_area(mut self, life_area_id: impl Into<String>) -> Self {
        self.deleted_life_area_ids.push(life_area_id.into());
        self
    }

    pub fn delete_quest(mut self, quest_id: impl Into<String>) -> Self {
        self.deleted_quest_ids.push(quest_id.into());
        self
    }

    pub fn delete_subtask(mut self, subtask_id: impl Into<String>) -> Self {
        self.deleted_subtask_ids.push(subtask_id.into());
        self
    }

    pub fn delete_reward(mut self, reward_id: impl Into<String>) -> Self {
        self.deleted_reward_ids.push(reward_id.into());
        self
    }

    /// Folds another change set into this one; later upserts of the same id win
    pub fn merge(&mut self, other: ChangeSet) {
        if other.user.is_some() {
            self.user = other.user;
        }
        self.life_areas.extend(other.life_areas);
        self.quests.extend(other.quests);
        self.subtasks.extend(other.subtasks);
        self.rewards.extend(other.rewards);
        self.deleted_life_area_ids.extend(other.deleted_life_area_ids);
        self.deleted_quest_ids.extend(other.deleted_quest_ids);
        self.deleted_subtask_ids.extend(other.deleted_subtask_ids);
        self.deleted_reward_ids.extend(other.deleted_reward_ids);
    }
}

/// Trait defining the interface for storage connections
///
/// A connection creates the per-entity repositories, applies change sets
/// atomically, and hands out the lock that serializes read-modify-commit
/// sequences in the domain layer.
#[async_trait]
pub trait Connection: Send + Sync + Clone + 'static {
    type UserRepository: UserStorage;
    type LifeAreaRepository: LifeAreaStorage;
    type QuestRepository: QuestStorage;
    type SubtaskRepository: SubtaskStorage;
    type RewardRepository: RewardStorage;

    fn create_user_repository(&self) -> Self::UserRepository;
    fn create_life_area_repository(&self) -> Self::LifeAreaRepository;
    fn create_quest_repository(&self) -> Self::QuestRepository;
    fn create_subtask_repository(&self) -> Self::SubtaskRepository;
    fn create_reward_repository(&self) -> Self::RewardRepository;

    /// Apply every change in the set, or none of them
    async fn commit(&self, changes: ChangeSet) -> Result<()>;

    /// Lock held by a domain operation across its reads and its commit
    fn operation_lock(&self) -> Arc<Mutex<()>>;
}
