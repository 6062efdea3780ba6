//! The single local user, first-run seeding and the dashboard summary.
//!
//! ## Business Rules
//!
//! - Initialization is idempotent: defaults are only added to empty tables
//! - Seeding writes the user, default life areas and default rewards in one commit
//! - Due recurring resets run as part of startup

use chrono::{DateTime, Utc};
use shared::{DashboardSummary, LifeArea, Reward, UpdateUserSettingsRequest, User};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::clock::Clock;
use super::errors::DomainResult;
use super::game_config::{DEFAULT_LIFE_AREAS, DEFAULT_REWARDS, DEFAULT_USER_NAME};
use super::quest_service::QuestService;
use super::validation::validate_title;
use crate::storage::{ChangeSet, Connection, LifeAreaStorage, RewardStorage, UserStorage};

pub struct UserService<C: Connection> {
    connection: C,
    user_repository: C::UserRepository,
    life_area_repository: C::LifeAreaRepository,
    reward_repository: C::RewardRepository,
    quest_service: Arc<QuestService<C>>,
    clock: Arc<dyn Clock>,
}

impl<C: Connection> UserService<C> {
    pub fn new(connection: C, clock: Arc<dyn Clock>, quest_service: Arc<QuestService<C>>) -> Self {
        Self {
            user_repository: connection.create_user_repository(),
            life_area_repository: connection.create_life_area_repository(),
            reward_repository: connection.create_reward_repository(),
            connection,
            quest_service,
            clock,
        }
    }

    /// Seed missing defaults and run any due recurring resets
    pub async fn initialize(&self) -> DomainResult<User> {
        let user = {
            let lock = self.connection.operation_lock();
            let _guard = lock.lock().await;
            self.seed_defaults_locked().await?
        };

        let report = self.quest_service.check_and_reset_recurring_quests().await?;
        info!(
            "Initialized for {}: {} recurring quest(s) checked, {} reset",
            user.name, report.checked, report.reset
        );
        Ok(user)
    }

    async fn seed_defaults_locked(&self) -> DomainResult<User> {
        let now = self.clock.now();
        let mut changes = ChangeSet::new();

        let user = match self.user_repository.get_user().await? {
            Some(user) => user,
            None => {
                info!("Creating default user");
                let user = default_user(now);
                changes = changes.with_user(user.clone());
                user
            }
        };

        if self.life_area_repository.list_life_areas().await?.is_empty() {
            info!("Seeding {} default life areas", DEFAULT_LIFE_AREAS.len());
            for area in default_life_areas(now) {
                changes = changes.with_life_area(area);
            }
        }

        if self.reward_repository.list_rewards().await?.is_empty() {
            info!("Seeding {} default rewards", DEFAULT_REWARDS.len());
            for reward in default_rewards(now) {
                changes = changes.with_reward(reward);
            }
        }

        if !changes.is_empty() {
            self.connection.commit(changes).await?;
        }
        Ok(user)
    }

    pub async fn get_user(&self) -> DomainResult<User> {
        self.quest_service.require_user().await
    }

    pub async fn update_settings(&self, request: UpdateUserSettingsRequest) -> DomainResult<User> {
        info!("Updating user settings: {:?}", request);

        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;

        let mut user = self.quest_service.require_user().await?;
        if let Some(name) = request.name {
            user.name = validate_title("Name", &name)?;
        }
        if let Some(week_starts_on_sunday) = request.week_starts_on_sunday {
            user.week_starts_on_sunday = week_starts_on_sunday;
        }
        user.last_active_at = self.clock.now();

        self.user_repository.store_user(&user).await?;
        Ok(user)
    }

    /// Totals, today's completions, overdue count and the best life area level
    pub async fn dashboard(&self) -> DomainResult<DashboardSummary> {
        let stats = self.quest_service.quest_stats().await?;
        let user = self.quest_service.require_user().await?;
        let highest_level = self
            .life_area_repository
            .list_life_areas()
            .await?
            .iter()
            .map(|area| area.level)
            .max()
            .unwrap_or(1);

        Ok(DashboardSummary {
            user,
            active_quests: stats.active,
            completed_today: stats.completed_today,
            overdue_quests: stats.overdue,
            highest_level,
        })
    }
}

fn default_user(now: DateTime<Utc>) -> User {
    User {
        id: Uuid::new_v4().to_string(),
        name: DEFAULT_USER_NAME.to_string(),
        total_xp: 0,
        total_currency: 0,
        week_starts_on_sunday: true,
        created_at: now,
        last_active_at: now,
        sync_id: Some(Uuid::new_v4().to_string()),
    }
}

fn default_life_areas(now: DateTime<Utc>) -> Vec<LifeArea> {
    DEFAULT_LIFE_AREAS
        .iter()
        .map(|area| LifeArea {
            id: area.id.to_string(),
            name: area.name.to_string(),
            description: area.description.to_string(),
            icon: area.icon.to_string(),
            color: area.color.to_string(),
            level: 1,
            current_xp: 0,
            total_xp: 0,
            is_custom: false,
            is_active: true,
            created_at: now,
            updated_at: now,
            sync_id: None,
            last_sync_at: None,
        })
        .collect()
}

fn default_rewards(now: DateTime<Utc>) -> Vec<Reward> {
    DEFAULT_REWARDS
        .iter()
        .map(|reward| Reward {
            id: Uuid::new_v4().to_string(),
            name: reward.name.to_string(),
            description: Some(reward.description.to_string()),
            cost: reward.cost,
            category: reward.category.to_string(),
            is_custom: false,
            is_purchased: false,
            purchased_at: None,
            created_at: now,
            updated_at: now,
            sync_id: None,
        })
        .collect()
}
