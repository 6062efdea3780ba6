//! Quest service domain logic.
//!
//! This module owns the quest lifecycle: creation with frozen rewards,
//! edits, deletion, the completion transaction, and the recurring reset
//! pass.
//!
//! ## Business Rules
//!
//! - Rewards are computed once at creation and never recomputed on edit
//! - A quest's life area must exist and be active when assigned
//! - Completing a completed quest is a no-op, never a second payout
//! - A one-off quest with unfinished subtasks cannot be completed directly
//! - Due recurring resets run before any quest state is read or returned
//! - Completion writes quest, user and life area in one commit

use chrono::{DateTime, FixedOffset, Utc};
use shared::{
    CompletionOutcome, CompletionStatus, CreateQuestRequest, LifeArea, Quest, QuestFilter,
    QuestListRequest, QuestStats, RecurringQuestProgress, ResetReport, UpdateQuestRequest, User,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::clock::Clock;
use super::completion::{
    plan_completion, plan_recurring_completion, CompletionContext, CompletionPlan,
};
use super::errors::{DomainError, DomainResult};
use super::modifiers::RandomSource;
use super::recurrence::{self, new_recurrence, reset_if_due};
use super::reward_formula::quest_reward;
use super::validation::{normalize_description, validate_title};
use crate::storage::{
    ChangeSet, Connection, LifeAreaStorage, QuestStorage, SubtaskStorage, UserStorage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompletionPath {
    /// Recurring path for quests with an active recurrence, one-off otherwise
    Auto,
    Recurring,
}

/// Service for quest management and the completion transaction
pub struct QuestService<C: Connection> {
    connection: C,
    quest_repository: C::QuestRepository,
    subtask_repository: C::SubtaskRepository,
    life_area_repository: C::LifeAreaRepository,
    user_repository: C::UserRepository,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl<C: Connection> QuestService<C> {
    pub fn new(connection: C, clock: Arc<dyn Clock>, random: Arc<dyn RandomSource>) -> Self {
        Self {
            quest_repository: connection.create_quest_repository(),
            subtask_repository: connection.create_subtask_repository(),
            life_area_repository: connection.create_life_area_repository(),
            user_repository: connection.create_user_repository(),
            connection,
            clock,
            random,
        }
    }

    pub(crate) fn connection(&self) -> &C {
        &self.connection
    }

    pub(crate) fn now_and_zone(&self) -> (DateTime<Utc>, FixedOffset) {
        let now = self.clock.now();
        (now, self.clock.local_offset(now))
    }

    pub(crate) async fn require_user(&self) -> DomainResult<User> {
        self.user_repository
            .get_user()
            .await?
            .ok_or_else(|| DomainError::not_found("User", "current"))
    }

    async fn week_starts_on_sunday(&self) -> DomainResult<bool> {
        Ok(self
            .user_repository
            .get_user()
            .await?
            .map_or(true, |user| user.week_starts_on_sunday))
    }

    async fn require_quest(&self, quest_id: &str) -> DomainResult<Quest> {
        self.quest_repository
            .get_quest(quest_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Quest", quest_id))
    }

    async fn require_active_life_area(&self, life_area_id: &str) -> DomainResult<LifeArea> {
        let area = self
            .life_area_repository
            .get_life_area(life_area_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Life area", life_area_id))?;
        if !area.is_active {
            return Err(DomainError::Validation(format!(
                "Life area '{}' is inactive",
                area.name
            )));
        }
        Ok(area)
    }

    /// Create a new quest with rewards frozen from its difficulty and priority
    pub async fn create_quest(&self, request: CreateQuestRequest) -> DomainResult<Quest> {
        info!("Creating quest: {:?}", request.title);
        let title = validate_title("Quest title", &request.title)?;

        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;

        self.require_active_life_area(&request.life_area_id).await?;
        let (now, zone) = self.now_and_zone();
        let week_starts_on_sunday = self.week_starts_on_sunday().await?;

        let reward = quest_reward(request.difficulty, request.priority);
        let recurrence = request
            .recurrence
            .as_ref()
            .map(|r| new_recurrence(r, now, &zone, week_starts_on_sunday));

        let quest = Quest {
            id: Uuid::new_v4().to_string(),
            title,
            description: normalize_description(request.description),
            difficulty: request.difficulty,
            priority: request.priority,
            life_area_id: request.life_area_id,
            tags: normalize_tags(request.tags),
            is_completed: false,
            completed_at: None,
            completed_subtasks: 0,
            total_subtasks: 0,
            xp_reward: reward.xp,
            currency_reward: reward.currency,
            was_rare_quest: false,
            created_at: now,
            updated_at: now,
            due_date: request.due_date,
            recurrence,
            sync_id: Some(Uuid::new_v4().to_string()),
            last_sync_at: None,
        };

        self.quest_repository.store_quest(&quest).await?;
        info!(
            "Created quest {} ({} XP, {} currency)",
            quest.id, quest.xp_reward, quest.currency_reward
        );
        Ok(quest)
    }

    /// Get a quest, applying its recurring reset first if one is due
    pub async fn get_quest(&self, quest_id: &str) -> DomainResult<Quest> {
        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;

        let quest = self.require_quest(quest_id).await?;
        self.refresh_quest_locked(quest).await
    }

    /// Edit a quest's descriptive fields; the frozen rewards are left untouched
    pub async fn update_quest(
        &self,
        quest_id: &str,
        request: UpdateQuestRequest,
    ) -> DomainResult<Quest> {
        info!("Updating quest {}: {:?}", quest_id, request);

        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;

        let mut quest = self.require_quest(quest_id).await?;
        let (now, _) = self.now_and_zone();

        if let Some(title) = request.title {
            quest.title = validate_title("Quest title", &title)?;
        }
        if request.description.is_some() {
            quest.description = normalize_description(request.description);
        }
        if let Some(difficulty) = request.difficulty {
            quest.difficulty = difficulty;
        }
        if let Some(priority) = request.priority {
            quest.priority = priority;
        }
        if let Some(life_area_id) = request.life_area_id {
            if life_area_id != quest.life_area_id {
                self.require_active_life_area(&life_area_id).await?;
                quest.life_area_id = life_area_id;
            }
        }
        if let Some(tags) = request.tags {
            quest.tags = normalize_tags(tags);
        }
        if request.clear_due_date {
            quest.due_date = None;
        } else if request.due_date.is_some() {
            quest.due_date = request.due_date;
        }
        if let Some(active) = request.recurrence_active {
            match quest.recurrence.as_mut() {
                Some(recurrence) => recurrence.is_active = active,
                None => {
                    return Err(DomainError::Validation(format!(
                        "Quest {} is not recurring",
                        quest_id
                    )))
                }
            }
        }
        quest.updated_at = now;

        self.quest_repository.update_quest(&quest).await?;
        Ok(quest)
    }

    /// Delete a quest together with all of its subtasks
    pub async fn delete_quest(&self, quest_id: &str) -> DomainResult<()> {
        info!("Deleting quest {}", quest_id);

        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;

        let quest = self.require_quest(quest_id).await?;
        let subtasks = self.subtask_repository.list_subtasks_for_quest(&quest.id).await?;

        let mut changes = ChangeSet::new().delete_quest(quest.id.clone());
        for subtask in &subtasks {
            changes = changes.delete_subtask(subtask.id.clone());
        }
        self.connection.commit(changes).await?;

        info!("Deleted quest {} and {} subtask(s)", quest_id, subtasks.len());
        Ok(())
    }

    /// List quests newest first, after running the recurring reset pass
    pub async fn list_quests(&self, request: QuestListRequest) -> DomainResult<Vec<Quest>> {
        debug!("Listing quests: {:?}", request);

        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;

        let (now, _) = self.now_and_zone();
        self.reset_due_quests_locked().await?;

        let quests = match &request.life_area_id {
            Some(life_area_id) => {
                self.quest_repository.list_quests_for_life_area(life_area_id).await?
            }
            None => self.quest_repository.list_quests().await?,
        };

        Ok(quests
            .into_iter()
            .filter(|q| matches_filter(q, request.filter, now))
            .filter(|q| request.tag.as_ref().map_or(true, |tag| q.tags.contains(tag)))
            .collect())
    }

    /// Per-filter counts plus quests completed since local midnight
    pub async fn quest_stats(&self) -> DomainResult<QuestStats> {
        let quests = self.list_quests(QuestListRequest::default()).await?;
        let (now, zone) = self.now_and_zone();
        let today = now.with_timezone(&zone).date_naive();

        let count = |filter: QuestFilter| quests.iter().filter(|q| matches_filter(q, filter, now)).count();
        Ok(QuestStats {
            all: quests.len(),
            active: count(QuestFilter::Active),
            completed: count(QuestFilter::Completed),
            overdue: count(QuestFilter::Overdue),
            recurring: count(QuestFilter::Recurring),
            completed_today: quests
                .iter()
                .filter(|q| {
                    q.completed_at
                        .map_or(false, |at| at.with_timezone(&zone).date_naive() == today)
                })
                .count(),
        })
    }

    /// Incomplete quests whose due date has passed, after running the recurring reset pass
    pub async fn get_overdue_quests(&self) -> DomainResult<Vec<Quest>> {
        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;

        self.reset_due_quests_locked().await?;
        let (now, _) = self.now_and_zone();
        Ok(self
            .quest_repository
            .list_quests()
            .await?
            .into_iter()
            .filter(|q| q.is_overdue(now))
            .collect())
    }

    /// Complete a quest and pay out its reward
    ///
    /// Quests with an active recurrence count toward their period target
    /// instead of completing outright. A one-off quest with unfinished
    /// subtasks is refused; its last subtask completes it instead.
    pub async fn complete_quest(&self, quest_id: &str) -> DomainResult<CompletionOutcome> {
        self.complete(quest_id, CompletionPath::Auto).await
    }

    /// Count one completion of a recurring quest toward its period target
    pub async fn complete_recurring_quest(&self, quest_id: &str) -> DomainResult<CompletionOutcome> {
        self.complete(quest_id, CompletionPath::Recurring).await
    }

    async fn complete(&self, quest_id: &str, path: CompletionPath) -> DomainResult<CompletionOutcome> {
        info!("Completing quest {} ({:?})", quest_id, path);

        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;

        let quest = self.require_quest(quest_id).await?;
        if !quest.is_completed
            && !quest.has_active_recurrence()
            && quest.completed_subtasks < quest.total_subtasks
        {
            return Err(DomainError::InvariantViolation(format!(
                "Cannot complete quest: {} of {} subtasks are done. Complete the remaining subtasks first.",
                quest.completed_subtasks, quest.total_subtasks
            )));
        }

        let plan = self.plan_completion_locked(&quest, path).await?;
        self.connection.commit(plan.changes).await?;

        match (&plan.outcome.status, &plan.outcome.payout) {
            (CompletionStatus::AlreadyCompleted, _) => {
                info!("Quest {} was already completed; nothing paid", quest_id)
            }
            (_, Some(payout)) => info!(
                "Quest {} paid {} XP and {} currency (rare: {}, catch-up: {}, levels gained: {})",
                quest_id,
                payout.xp,
                payout.currency,
                payout.was_rare,
                payout.catch_up_applied,
                payout.levels_gained
            ),
            _ => {}
        }
        Ok(plan.outcome)
    }

    /// Plans a completion against the current user and life areas.
    /// The caller must hold the operation lock and commit the returned changes.
    pub(crate) async fn plan_completion_locked(
        &self,
        quest: &Quest,
        path: CompletionPath,
    ) -> DomainResult<CompletionPlan> {
        let user = self.require_user().await?;
        let life_areas = self.life_area_repository.list_life_areas().await?;
        let (now, zone) = self.now_and_zone();

        let ctx = CompletionContext {
            user: &user,
            life_areas: &life_areas,
            random: self.random.as_ref(),
            now,
            zone: &zone,
        };
        Ok(match path {
            CompletionPath::Auto => plan_completion(quest, &ctx),
            CompletionPath::Recurring => plan_recurring_completion(quest, &ctx),
        })
    }

    /// Run the reset transition on every active recurring quest that is due
    pub async fn check_and_reset_recurring_quests(&self) -> DomainResult<ResetReport> {
        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;
        self.reset_due_quests_locked().await
    }

    async fn reset_due_quests_locked(&self) -> DomainResult<ResetReport> {
        let (now, zone) = self.now_and_zone();
        let week_starts_on_sunday = self.week_starts_on_sunday().await?;
        let quests = self.quest_repository.list_active_recurring_quests().await?;
        let checked = quests.len();

        let mut changes = ChangeSet::new();
        for mut quest in quests {
            if reset_if_due(&mut quest, now, &zone, week_starts_on_sunday) {
                debug!("Reset recurring quest {}", quest.id);
                changes.quests.push(quest);
            }
        }

        let reset = changes.quests.len();
        if reset > 0 {
            self.connection.commit(changes).await?;
            info!("Reset {} of {} recurring quest(s)", reset, checked);
        }
        Ok(ResetReport { checked, reset })
    }

    async fn refresh_quest_locked(&self, mut quest: Quest) -> DomainResult<Quest> {
        let (now, zone) = self.now_and_zone();
        if quest.has_active_recurrence() {
            let week_starts_on_sunday = self.week_starts_on_sunday().await?;
            if reset_if_due(&mut quest, now, &zone, week_starts_on_sunday) {
                self.quest_repository.update_quest(&quest).await?;
            }
        }
        Ok(quest)
    }

    /// Period progress of a recurring quest, after any due reset
    pub async fn get_recurring_progress(&self, quest_id: &str) -> DomainResult<RecurringQuestProgress> {
        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;

        let quest = self.require_quest(quest_id).await?;
        let quest = self.refresh_quest_locked(quest).await?;
        let (now, _) = self.now_and_zone();
        Ok(recurrence::progress(&quest, now))
    }
}

fn matches_filter(quest: &Quest, filter: QuestFilter, now: DateTime<Utc>) -> bool {
    match filter {
        QuestFilter::All => true,
        QuestFilter::Active => !quest.is_completed,
        QuestFilter::Completed => quest.is_completed,
        QuestFilter::Overdue => quest.is_overdue(now),
        QuestFilter::Recurring => quest.recurrence.is_some(),
    }
}

fn normalize_tags(tags: Vec<String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::FixedClock;
    use crate::domain::modifiers::FixedRoll;
    use crate::storage::csv::test_utils::{
        fixed_now, sample_life_area, sample_subtask, sample_user, TestEnvironment,
    };
    use crate::storage::csv::CsvConnection;
    use chrono::{Duration, TimeZone};
    use shared::{Difficulty, Priority, RecurrenceRequest, RecurrenceType, RecurringQuestStatus};

    struct Harness {
        env: TestEnvironment,
        clock: FixedClock,
        service: QuestService<CsvConnection>,
    }

    async fn harness(random: FixedRoll) -> Harness {
        let env = TestEnvironment::new().unwrap();
        let mut strength = sample_life_area("strength", "Strength");
        strength.is_custom = false;
        let mut retired = sample_life_area("retired", "Retired");
        retired.is_active = false;
        env.connection
            .commit(
                ChangeSet::new()
                    .with_user(sample_user())
                    .with_life_area(sample_life_area("vitality", "Vitality"))
                    .with_life_area(strength)
                    .with_life_area(retired),
            )
            .await
            .unwrap();

        let clock = FixedClock::new(fixed_now());
        let service = QuestService::new(
            env.connection.clone(),
            Arc::new(clock.clone()),
            Arc::new(random),
        );
        Harness { env, clock, service }
    }

    fn request(title: &str, difficulty: Difficulty, priority: Priority) -> CreateQuestRequest {
        CreateQuestRequest {
            title: title.to_string(),
            description: None,
            difficulty,
            priority,
            life_area_id: "vitality".to_string(),
            tags: vec![" Health ".to_string(), "".to_string()],
            due_date: None,
            recurrence: None,
        }
    }

    fn recurring_request(kind: RecurrenceType, target: u32) -> CreateQuestRequest {
        CreateQuestRequest {
            recurrence: Some(RecurrenceRequest { recurrence_type: kind, target_count: target }),
            ..request("Stretch", Difficulty::Easy, Priority::Normal)
        }
    }

    async fn user(h: &Harness) -> User {
        h.env.connection.create_user_repository().get_user().await.unwrap().unwrap()
    }

    async fn area(h: &Harness, id: &str) -> LifeArea {
        h.env
            .connection
            .create_life_area_repository()
            .get_life_area(id)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_quest_freezes_rewards() {
        let h = harness(FixedRoll::never_rare()).await;
        let quest = h
            .service
            .create_quest(request("Deadlift day", Difficulty::Hard, Priority::High))
            .await
            .unwrap();

        assert_eq!((quest.xp_reward, quest.currency_reward), (105, 27));
        assert!(quest.sync_id.is_some());
        assert_eq!(quest.tags, BTreeSet::from(["health".to_string()]));
        assert_eq!(quest.created_at, fixed_now());
        assert_eq!(h.service.get_quest(&quest.id).await.unwrap(), quest);
    }

    #[tokio::test]
    async fn test_create_quest_validates_life_area_and_title() {
        let h = harness(FixedRoll::never_rare()).await;

        let mut missing = request("Run", Difficulty::Easy, Priority::Normal);
        missing.life_area_id = "nowhere".to_string();
        assert!(matches!(
            h.service.create_quest(missing).await,
            Err(DomainError::NotFound { .. })
        ));

        let mut inactive = request("Run", Difficulty::Easy, Priority::Normal);
        inactive.life_area_id = "retired".to_string();
        assert!(matches!(
            h.service.create_quest(inactive).await,
            Err(DomainError::Validation(_))
        ));

        assert!(matches!(
            h.service.create_quest(request("   ", Difficulty::Easy, Priority::Normal)).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_never_recomputes_rewards() {
        let h = harness(FixedRoll::never_rare()).await;
        let quest = h
            .service
            .create_quest(request("Deadlift day", Difficulty::Hard, Priority::High))
            .await
            .unwrap();

        let updated = h
            .service
            .update_quest(
                &quest.id,
                UpdateQuestRequest {
                    title: Some("Light deadlifts".to_string()),
                    difficulty: Some(Difficulty::Trivial),
                    priority: Some(Priority::Normal),
                    due_date: Some(fixed_now() + Duration::days(1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Light deadlifts");
        assert_eq!(updated.difficulty, Difficulty::Trivial);
        assert_eq!((updated.xp_reward, updated.currency_reward), (105, 27));
        assert!(updated.due_date.is_some());

        let cleared = h
            .service
            .update_quest(&quest.id, UpdateQuestRequest { clear_due_date: true, ..Default::default() })
            .await
            .unwrap();
        assert!(cleared.due_date.is_none());
    }

    #[tokio::test]
    async fn test_complete_quest_pays_once() {
        let h = harness(FixedRoll::never_rare()).await;
        let quest = h
            .service
            .create_quest(request("Deadlift day", Difficulty::Hard, Priority::High))
            .await
            .unwrap();

        let outcome = h.service.complete_quest(&quest.id).await.unwrap();
        assert_eq!(outcome.status, CompletionStatus::Completed);
        assert_eq!(outcome.payout.as_ref().unwrap().xp, 105);

        let paid = user(&h).await;
        assert_eq!((paid.total_xp, paid.total_currency), (105, 27));
        let vitality = area(&h, "vitality").await;
        assert_eq!((vitality.level, vitality.current_xp, vitality.total_xp), (2, 15, 105));

        let again = h.service.complete_quest(&quest.id).await.unwrap();
        assert_eq!(again.status, CompletionStatus::AlreadyCompleted);
        assert!(again.payout.is_none());
        assert_eq!(user(&h).await, paid);
        assert_eq!(area(&h, "vitality").await, vitality);
    }

    #[tokio::test]
    async fn test_complete_missing_quest_is_not_found() {
        let h = harness(FixedRoll::never_rare()).await;
        assert!(matches!(
            h.service.complete_quest("missing").await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_unfinished_subtasks_block_direct_completion() {
        let h = harness(FixedRoll::never_rare()).await;
        let mut quest = h
            .service
            .create_quest(request("Spring cleaning", Difficulty::Medium, Priority::Normal))
            .await
            .unwrap();
        quest.total_subtasks = 3;
        quest.completed_subtasks = 2;
        h.env.connection.create_quest_repository().update_quest(&quest).await.unwrap();

        assert!(matches!(
            h.service.complete_quest(&quest.id).await,
            Err(DomainError::InvariantViolation(_))
        ));
        assert_eq!(user(&h).await.total_xp, 0);
        assert!(!h.service.get_quest(&quest.id).await.unwrap().is_completed);
    }

    #[tokio::test]
    async fn test_rare_completion_with_catch_up() {
        let h = harness(FixedRoll::always_rare()).await;
        let mut strength = area(&h, "strength").await;
        strength.level = 4;
        h.env.connection.commit(ChangeSet::new().with_life_area(strength)).await.unwrap();

        let quest = h
            .service
            .create_quest(request("Deadlift day", Difficulty::Hard, Priority::High))
            .await
            .unwrap();
        let outcome = h.service.complete_quest(&quest.id).await.unwrap();

        let payout = outcome.payout.unwrap();
        assert!(payout.was_rare && payout.catch_up_applied);
        assert_eq!((payout.xp, payout.currency), (252, 64));

        let stored = h.service.get_quest(&quest.id).await.unwrap();
        assert!(stored.was_rare_quest);
        assert_eq!((stored.xp_reward, stored.currency_reward), (252, 64));
    }

    #[tokio::test]
    async fn test_delete_quest_cascades_to_subtasks() {
        let h = harness(FixedRoll::never_rare()).await;
        let quest = h
            .service
            .create_quest(request("Clean house", Difficulty::Medium, Priority::Normal))
            .await
            .unwrap();
        let subtasks = h.env.connection.create_subtask_repository();
        subtasks.store_subtask(&sample_subtask("s1", &quest.id)).await.unwrap();
        subtasks.store_subtask(&sample_subtask("s2", &quest.id)).await.unwrap();
        subtasks.store_subtask(&sample_subtask("keep", "other")).await.unwrap();

        h.service.delete_quest(&quest.id).await.unwrap();

        assert!(matches!(
            h.service.get_quest(&quest.id).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(subtasks.list_subtasks_for_quest(&quest.id).await.unwrap().is_empty());
        assert!(subtasks.get_subtask("keep").await.unwrap().is_some());
        assert!(matches!(
            h.service.delete_quest(&quest.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_daily_reset_after_met_target() {
        let h = harness(FixedRoll::never_rare()).await;
        let quest = h
            .service
            .create_quest(recurring_request(RecurrenceType::Daily, 1))
            .await
            .unwrap();
        assert_eq!(
            quest.recurrence.as_ref().unwrap().next_reset,
            Utc.with_ymd_and_hms(2025, 3, 13, 0, 0, 0).unwrap()
        );

        let outcome = h.service.complete_recurring_quest(&quest.id).await.unwrap();
        assert_eq!(outcome.status, CompletionStatus::Completed);
        assert!(h.service.get_quest(&quest.id).await.unwrap().is_completed);

        h.clock.advance(Duration::days(1));
        let report = h.service.check_and_reset_recurring_quests().await.unwrap();
        assert_eq!(report, ResetReport { checked: 1, reset: 1 });

        let reset = h.service.get_quest(&quest.id).await.unwrap();
        let recurrence = reset.recurrence.as_ref().unwrap();
        assert_eq!(recurrence.streak, 1);
        assert_eq!(recurrence.completed_count, 0);
        assert_eq!(recurrence.next_reset, Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap());
        assert!(!reset.is_completed);

        // Nothing further is due
        let again = h.service.check_and_reset_recurring_quests().await.unwrap();
        assert_eq!(again.reset, 0);
    }

    #[tokio::test]
    async fn test_overdue_list_sees_reopened_recurring_quest() {
        let h = harness(FixedRoll::never_rare()).await;
        let quest = h
            .service
            .create_quest(CreateQuestRequest {
                due_date: Some(fixed_now() + Duration::hours(12)),
                ..recurring_request(RecurrenceType::Daily, 1)
            })
            .await
            .unwrap();
        h.service.complete_recurring_quest(&quest.id).await.unwrap();

        h.clock.advance(Duration::days(1));
        let overdue = h.service.get_overdue_quests().await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, quest.id);
        assert!(!overdue[0].is_completed);
        assert_eq!(overdue[0].recurrence.as_ref().unwrap().completed_count, 0);
    }

    #[tokio::test]
    async fn test_daily_reset_with_unmet_target_breaks_streak() {
        let h = harness(FixedRoll::never_rare()).await;
        let quest = h
            .service
            .create_quest(recurring_request(RecurrenceType::Daily, 2))
            .await
            .unwrap();
        let outcome = h.service.complete_quest(&quest.id).await.unwrap();
        assert_eq!(outcome.status, CompletionStatus::PeriodProgress);

        h.clock.advance(Duration::days(1));
        let progress = h.service.get_recurring_progress(&quest.id).await.unwrap();
        assert_eq!(progress.completed, 0);
        assert_eq!(progress.status, RecurringQuestStatus::Active);

        let reset = h.service.get_quest(&quest.id).await.unwrap();
        assert_eq!(reset.recurrence.unwrap().streak, 0);
    }

    #[tokio::test]
    async fn test_recurring_payout_keeps_base_reward() {
        let h = harness(FixedRoll::new(vec![0.5, 0.0])).await;
        let quest = h
            .service
            .create_quest(recurring_request(RecurrenceType::Weekly, 3))
            .await
            .unwrap();

        h.service.complete_quest(&quest.id).await.unwrap();
        let rare = h.service.complete_quest(&quest.id).await.unwrap();
        assert_eq!(rare.payout.unwrap().xp, 30);

        let stored = h.service.get_quest(&quest.id).await.unwrap();
        assert_eq!((stored.xp_reward, stored.currency_reward), (15, 4));
        let recurrence = stored.recurrence.unwrap();
        assert_eq!(recurrence.completed_count, 2);
        assert_eq!((recurrence.last_payout_xp, recurrence.last_payout_currency), (30, 8));
        assert_eq!(user(&h).await.total_xp, 45);
    }

    #[tokio::test]
    async fn test_pausing_recurrence_makes_completion_one_off() {
        let h = harness(FixedRoll::never_rare()).await;
        let quest = h
            .service
            .create_quest(recurring_request(RecurrenceType::Weekly, 3))
            .await
            .unwrap();
        h.service
            .update_quest(&quest.id, UpdateQuestRequest { recurrence_active: Some(false), ..Default::default() })
            .await
            .unwrap();

        let outcome = h.service.complete_quest(&quest.id).await.unwrap();
        assert_eq!(outcome.status, CompletionStatus::Completed);
        let progress = h.service.get_recurring_progress(&quest.id).await.unwrap();
        assert_eq!(progress.status, RecurringQuestStatus::Inactive);

        let one_off = h
            .service
            .create_quest(request("Run", Difficulty::Easy, Priority::Normal))
            .await
            .unwrap();
        assert!(matches!(
            h.service
                .update_quest(&one_off.id, UpdateQuestRequest { recurrence_active: Some(true), ..Default::default() })
                .await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters_stats_and_overdue() {
        let h = harness(FixedRoll::never_rare()).await;

        let mut late = request("File taxes", Difficulty::Medium, Priority::High);
        late.due_date = Some(fixed_now() + Duration::hours(2));
        late.tags = vec!["admin".to_string()];
        let late = h.service.create_quest(late).await.unwrap();

        h.clock.advance(Duration::minutes(1));
        let done = h
            .service
            .create_quest(request("Walk", Difficulty::Easy, Priority::Normal))
            .await
            .unwrap();
        h.service.complete_quest(&done.id).await.unwrap();

        h.clock.advance(Duration::minutes(1));
        let daily = h
            .service
            .create_quest(recurring_request(RecurrenceType::Daily, 1))
            .await
            .unwrap();

        h.clock.advance(Duration::hours(3));

        let all = h.service.list_quests(QuestListRequest::default()).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec![daily.id.as_str(), done.id.as_str(), late.id.as_str()]);

        let list = |filter| QuestListRequest { filter, ..Default::default() };
        assert_eq!(h.service.list_quests(list(QuestFilter::Active)).await.unwrap().len(), 2);
        assert_eq!(h.service.list_quests(list(QuestFilter::Completed)).await.unwrap().len(), 1);
        assert_eq!(h.service.list_quests(list(QuestFilter::Recurring)).await.unwrap().len(), 1);

        let overdue = h.service.get_overdue_quests().await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, late.id);

        let tagged = h
            .service
            .list_quests(QuestListRequest { tag: Some("admin".to_string()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(tagged.len(), 1);

        let stats = h.service.quest_stats().await.unwrap();
        assert_eq!(
            stats,
            QuestStats { all: 3, active: 2, completed: 1, overdue: 1, recurring: 1, completed_today: 1 }
        );
    }
}
