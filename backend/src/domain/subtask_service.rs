//! Subtask service domain logic.
//!
//! Subtasks carry a frozen reward estimate (30% of the quest formula) but
//! completing one never pays it out. Finishing the last subtask of a quest
//! runs the parent's full completion transaction in the same commit.

use shared::{
    CreateSubtaskRequest, Subtask, SubtaskCompletionOutcome, UpdateSubtaskRequest,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::errors::{DomainError, DomainResult};
use super::quest_service::{CompletionPath, QuestService};
use super::reward_formula::subtask_reward;
use super::validation::{normalize_description, validate_title};
use crate::storage::{ChangeSet, Connection, QuestStorage, SubtaskStorage};

/// Service for subtask management
pub struct SubtaskService<C: Connection> {
    connection: C,
    subtask_repository: C::SubtaskRepository,
    quest_repository: C::QuestRepository,
    quest_service: Arc<QuestService<C>>,
}

impl<C: Connection> SubtaskService<C> {
    pub fn new(quest_service: Arc<QuestService<C>>) -> Self {
        let connection = quest_service.connection().clone();
        Self {
            subtask_repository: connection.create_subtask_repository(),
            quest_repository: connection.create_quest_repository(),
            connection,
            quest_service,
        }
    }

    async fn require_subtask(&self, subtask_id: &str) -> DomainResult<Subtask> {
        self.subtask_repository
            .get_subtask(subtask_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Subtask", subtask_id))
    }

    /// Create a subtask under an incomplete quest
    pub async fn create_subtask(&self, request: CreateSubtaskRequest) -> DomainResult<Subtask> {
        info!("Creating subtask {:?} for quest {}", request.title, request.quest_id);
        let title = validate_title("Subtask title", &request.title)?;

        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;

        let mut quest = self
            .quest_repository
            .get_quest(&request.quest_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Quest", &request.quest_id))?;
        if quest.is_completed {
            return Err(DomainError::InvariantViolation(
                "Cannot add subtasks to a completed quest".to_string(),
            ));
        }

        let (now, _) = self.quest_service.now_and_zone();
        let reward = subtask_reward(request.difficulty, request.priority);
        let subtask = Subtask {
            id: Uuid::new_v4().to_string(),
            quest_id: quest.id.clone(),
            title,
            description: normalize_description(request.description),
            difficulty: request.difficulty,
            priority: request.priority,
            is_completed: false,
            completed_at: None,
            xp_reward: reward.xp,
            currency_reward: reward.currency,
            created_at: now,
            updated_at: now,
            sync_id: Some(Uuid::new_v4().to_string()),
        };

        quest.total_subtasks += 1;
        quest.updated_at = now;
        self.connection
            .commit(ChangeSet::new().with_subtask(subtask.clone()).with_quest(quest))
            .await?;
        Ok(subtask)
    }

    pub async fn get_subtask(&self, subtask_id: &str) -> DomainResult<Subtask> {
        self.require_subtask(subtask_id).await
    }

    /// List a quest's subtasks in creation order
    pub async fn list_subtasks(&self, quest_id: &str) -> DomainResult<Vec<Subtask>> {
        Ok(self.subtask_repository.list_subtasks_for_quest(quest_id).await?)
    }

    /// Edit a subtask's title or description; rewards stay frozen
    pub async fn update_subtask(
        &self,
        subtask_id: &str,
        request: UpdateSubtaskRequest,
    ) -> DomainResult<Subtask> {
        info!("Updating subtask {}", subtask_id);

        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;

        let mut subtask = self.require_subtask(subtask_id).await?;
        if let Some(title) = request.title {
            subtask.title = validate_title("Subtask title", &title)?;
        }
        if request.description.is_some() {
            subtask.description = normalize_description(request.description);
        }
        subtask.updated_at = self.quest_service.now_and_zone().0;

        self.subtask_repository.update_subtask(&subtask).await?;
        Ok(subtask)
    }

    /// Delete a subtask and keep the parent's counters consistent
    pub async fn delete_subtask(&self, subtask_id: &str) -> DomainResult<()> {
        info!("Deleting subtask {}", subtask_id);

        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;

        let subtask = self.require_subtask(subtask_id).await?;
        let mut changes = ChangeSet::new().delete_subtask(subtask.id.clone());

        if let Some(mut quest) = self.quest_repository.get_quest(&subtask.quest_id).await? {
            quest.total_subtasks = quest.total_subtasks.saturating_sub(1);
            if subtask.is_completed {
                quest.completed_subtasks = quest.completed_subtasks.saturating_sub(1);
            }
            quest.completed_subtasks = quest.completed_subtasks.min(quest.total_subtasks);
            quest.updated_at = self.quest_service.now_and_zone().0;
            changes = changes.with_quest(quest);
        }

        self.connection.commit(changes).await?;
        Ok(())
    }

    /// Complete a subtask; the last one to finish completes the parent quest
    pub async fn complete_subtask(&self, subtask_id: &str) -> DomainResult<SubtaskCompletionOutcome> {
        info!("Completing subtask {}", subtask_id);

        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;

        let mut subtask = self.require_subtask(subtask_id).await?;
        let parent = self.quest_repository.get_quest(&subtask.quest_id).await?;

        if subtask.is_completed {
            return Ok(SubtaskCompletionOutcome {
                subtask_id: subtask.id,
                already_completed: true,
                completed_subtasks: parent.as_ref().map_or(0, |q| q.completed_subtasks),
                total_subtasks: parent.as_ref().map_or(0, |q| q.total_subtasks),
                quest_completion: None,
            });
        }

        let (now, _) = self.quest_service.now_and_zone();
        subtask.is_completed = true;
        subtask.completed_at = Some(now);
        subtask.updated_at = now;
        let mut changes = ChangeSet::new().with_subtask(subtask.clone());

        let mut outcome = SubtaskCompletionOutcome {
            subtask_id: subtask.id.clone(),
            already_completed: false,
            completed_subtasks: 0,
            total_subtasks: 0,
            quest_completion: None,
        };

        if let Some(mut quest) = parent {
            quest.completed_subtasks = (quest.completed_subtasks + 1).min(quest.total_subtasks);
            quest.updated_at = now;
            outcome.completed_subtasks = quest.completed_subtasks;
            outcome.total_subtasks = quest.total_subtasks;

            let all_done = quest.total_subtasks > 0 && quest.completed_subtasks >= quest.total_subtasks;
            changes = changes.with_quest(quest.clone());
            if all_done {
                info!("All subtasks of quest {} are done; completing it", quest.id);
                let plan = self
                    .quest_service
                    .plan_completion_locked(&quest, CompletionPath::Auto)
                    .await?;
                changes.merge(plan.changes);
                outcome.quest_completion = Some(plan.outcome);
            }
        }

        self.connection.commit(changes).await?;
        Ok(outcome)
    }
}
