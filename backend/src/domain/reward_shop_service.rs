//! Reward shop: user-defined purchasable rewards.
//!
//! Purchasing debits the user's currency and marks the reward purchased in a
//! single commit.

use shared::{
    CreateRewardRequest, PurchaseRewardResponse, Reward, RewardListRequest, RewardListResponse,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::clock::Clock;
use super::errors::{DomainError, DomainResult};
use super::game_config::{SuggestedRewardPrices, DEFAULT_REWARD_CATEGORY};
use super::validation::{normalize_description, validate_title};
use crate::storage::{ChangeSet, Connection, RewardStorage, UserStorage};

pub struct RewardShopService<C: Connection> {
    connection: C,
    reward_repository: C::RewardRepository,
    user_repository: C::UserRepository,
    clock: Arc<dyn Clock>,
}

impl<C: Connection> RewardShopService<C> {
    pub fn new(connection: C, clock: Arc<dyn Clock>) -> Self {
        Self {
            reward_repository: connection.create_reward_repository(),
            user_repository: connection.create_user_repository(),
            connection,
            clock,
        }
    }

    async fn require_reward(&self, reward_id: &str) -> DomainResult<Reward> {
        self.reward_repository
            .get_reward(reward_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reward", reward_id))
    }

    /// Create a custom reward; cost defaults to the medium suggested price
    pub async fn create_reward(&self, request: CreateRewardRequest) -> DomainResult<Reward> {
        info!("Creating reward {:?}", request.name);
        let name = validate_title("Reward name", &request.name)?;
        let cost = request.cost.filter(|c| *c > 0).unwrap_or(SuggestedRewardPrices::MEDIUM);
        let category = request
            .category
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_REWARD_CATEGORY.to_string());
        let now = self.clock.now();

        let reward = Reward {
            id: Uuid::new_v4().to_string(),
            name,
            description: normalize_description(request.description),
            cost,
            category,
            is_custom: true,
            is_purchased: false,
            purchased_at: None,
            created_at: now,
            updated_at: now,
            sync_id: Some(Uuid::new_v4().to_string()),
        };

        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;
        self.reward_repository.store_reward(&reward).await?;
        Ok(reward)
    }

    pub async fn get_reward(&self, reward_id: &str) -> DomainResult<Reward> {
        self.require_reward(reward_id).await
    }

    /// Rewards matching the search and category, split into available and purchased
    pub async fn list_rewards(&self, request: RewardListRequest) -> DomainResult<RewardListResponse> {
        let search = request
            .search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let category = request
            .category
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty() && c != "all");

        let matching = self
            .reward_repository
            .list_rewards()
            .await?
            .into_iter()
            .filter(|reward| {
                search.as_ref().map_or(true, |needle| {
                    reward.name.to_lowercase().contains(needle)
                        || reward
                            .description
                            .as_ref()
                            .map_or(false, |d| d.to_lowercase().contains(needle))
                })
            })
            .filter(|reward| category.as_ref().map_or(true, |c| &reward.category == c));

        let (purchased, available): (Vec<Reward>, Vec<Reward>) =
            matching.partition(|reward| reward.is_purchased);
        Ok(RewardListResponse { available, purchased })
    }

    pub async fn delete_reward(&self, reward_id: &str) -> DomainResult<()> {
        info!("Deleting reward {}", reward_id);
        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;

        if !self.reward_repository.delete_reward(reward_id).await? {
            return Err(DomainError::not_found("Reward", reward_id));
        }
        Ok(())
    }

    /// Buy a reward with currency
    pub async fn purchase_reward(&self, reward_id: &str) -> DomainResult<PurchaseRewardResponse> {
        info!("Purchasing reward {}", reward_id);

        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;

        let mut reward = self.require_reward(reward_id).await?;
        if reward.is_purchased {
            return Err(DomainError::InvariantViolation(format!(
                "Reward '{}' has already been purchased",
                reward.name
            )));
        }

        let mut user = self
            .user_repository
            .get_user()
            .await?
            .ok_or_else(|| DomainError::not_found("User", "current"))?;
        if user.total_currency < reward.cost {
            warn!(
                "Cannot purchase reward {}: costs {}, balance {}",
                reward_id, reward.cost, user.total_currency
            );
            return Err(DomainError::InsufficientFunds {
                cost: reward.cost,
                available: user.total_currency,
            });
        }

        let now = self.clock.now();
        user.total_currency -= reward.cost;
        user.last_active_at = now;
        reward.is_purchased = true;
        reward.purchased_at = Some(now);
        reward.updated_at = now;

        let remaining_currency = user.total_currency;
        self.connection
            .commit(ChangeSet::new().with_user(user).with_reward(reward.clone()))
            .await?;

        info!("Purchased reward {} for {}; {} left", reward.id, reward.cost, remaining_currency);
        Ok(PurchaseRewardResponse { reward, remaining_currency })
    }
}
