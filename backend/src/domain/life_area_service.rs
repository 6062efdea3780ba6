//! Life area management.
//!
//! ## Business Rules
//!
//! - Default (non-custom) life areas can be deactivated but never deleted
//! - A life area referenced by an incomplete quest cannot be deleted
//! - Levels only move through quest completion, never through edits

use shared::{CreateLifeAreaRequest, LevelProgress, LifeArea, UpdateLifeAreaRequest};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::clock::Clock;
use super::errors::{DomainError, DomainResult};
use super::game_config::{DEFAULT_LIFE_AREA_COLOR, DEFAULT_LIFE_AREA_ICON};
use super::leveling::level_progress;
use super::validation::validate_title;
use crate::storage::{Connection, LifeAreaStorage, QuestStorage};

pub struct LifeAreaService<C: Connection> {
    connection: C,
    life_area_repository: C::LifeAreaRepository,
    quest_repository: C::QuestRepository,
    clock: Arc<dyn Clock>,
}

impl<C: Connection> LifeAreaService<C> {
    pub fn new(connection: C, clock: Arc<dyn Clock>) -> Self {
        Self {
            life_area_repository: connection.create_life_area_repository(),
            quest_repository: connection.create_quest_repository(),
            connection,
            clock,
        }
    }

    async fn require_life_area(&self, life_area_id: &str) -> DomainResult<LifeArea> {
        self.life_area_repository
            .get_life_area(life_area_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Life area", life_area_id))
    }

    /// Create a custom life area starting at level 1
    pub async fn create_life_area(&self, request: CreateLifeAreaRequest) -> DomainResult<LifeArea> {
        info!("Creating life area {:?}", request.name);
        let name = validate_title("Life area name", &request.name)?;
        let now = self.clock.now();

        let area = LifeArea {
            id: Uuid::new_v4().to_string(),
            name,
            description: request.description.trim().to_string(),
            icon: request
                .icon
                .filter(|icon| !icon.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LIFE_AREA_ICON.to_string()),
            color: request
                .color
                .filter(|color| !color.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LIFE_AREA_COLOR.to_string()),
            level: 1,
            current_xp: 0,
            total_xp: 0,
            is_custom: true,
            is_active: true,
            created_at: now,
            updated_at: now,
            sync_id: Some(Uuid::new_v4().to_string()),
            last_sync_at: None,
        };

        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;
        self.life_area_repository.store_life_area(&area).await?;
        Ok(area)
    }

    pub async fn get_life_area(&self, life_area_id: &str) -> DomainResult<LifeArea> {
        self.require_life_area(life_area_id).await
    }

    /// All life areas ordered by name
    pub async fn list_life_areas(&self) -> DomainResult<Vec<LifeArea>> {
        Ok(self.life_area_repository.list_life_areas().await?)
    }

    /// Edit presentation fields or toggle the active flag
    pub async fn update_life_area(
        &self,
        life_area_id: &str,
        request: UpdateLifeAreaRequest,
    ) -> DomainResult<LifeArea> {
        info!("Updating life area {}: {:?}", life_area_id, request);

        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;

        let mut area = self.require_life_area(life_area_id).await?;
        if let Some(name) = request.name {
            area.name = validate_title("Life area name", &name)?;
        }
        if let Some(description) = request.description {
            area.description = description.trim().to_string();
        }
        if let Some(icon) = request.icon {
            area.icon = icon;
        }
        if let Some(color) = request.color {
            area.color = color;
        }
        if let Some(is_active) = request.is_active {
            area.is_active = is_active;
        }
        area.updated_at = self.clock.now();

        self.life_area_repository.update_life_area(&area).await?;
        Ok(area)
    }

    /// Delete a custom life area that no incomplete quest still uses
    pub async fn delete_life_area(&self, life_area_id: &str) -> DomainResult<()> {
        info!("Deleting life area {}", life_area_id);

        let lock = self.connection.operation_lock();
        let _guard = lock.lock().await;

        let area = self.require_life_area(life_area_id).await?;

        let blocking = self
            .quest_repository
            .list_quests_for_life_area(life_area_id)
            .await?
            .iter()
            .filter(|quest| !quest.is_completed)
            .count();
        if blocking > 0 {
            warn!("Refusing to delete life area {}: {} active quest(s)", life_area_id, blocking);
            return Err(DomainError::InvariantViolation(format!(
                "Cannot delete life area: {} active quests are still using it. Complete or delete the quests first.",
                blocking
            )));
        }
        if !area.is_custom {
            warn!("Refusing to delete default life area {}", life_area_id);
            return Err(DomainError::InvariantViolation(
                "Cannot delete default life areas. You can deactivate them instead.".to_string(),
            ));
        }

        self.life_area_repository.delete_life_area(life_area_id).await?;
        Ok(())
    }

    /// XP progress toward the next level
    pub async fn calculate_level_progress(&self, life_area_id: &str) -> DomainResult<LevelProgress> {
        let area = self.require_life_area(life_area_id).await?;
        Ok(level_progress(&area))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::FixedClock;
    use crate::storage::csv::test_utils::{fixed_now, sample_life_area, sample_quest, TestEnvironment};
    use crate::storage::csv::CsvConnection;
    use crate::storage::ChangeSet;

    async fn setup() -> (TestEnvironment, LifeAreaService<CsvConnection>) {
        let env = TestEnvironment::new().unwrap();
        let mut vitality = sample_life_area("vitality", "Vitality");
        vitality.is_custom = false;
        env.connection
            .commit(
                ChangeSet::new()
                    .with_life_area(vitality)
                    .with_life_area(sample_life_area("chess", "Chess")),
            )
            .await
            .unwrap();
        let service = LifeAreaService::new(env.connection.clone(), Arc::new(FixedClock::new(fixed_now())));
        (env, service)
    }

    #[tokio::test]
    async fn test_create_uses_defaults() {
        let (_env, service) = setup().await;
        let area = service
            .create_life_area(CreateLifeAreaRequest {
                name: " Music ".to_string(),
                description: "Practice".to_string(),
                icon: None,
                color: Some(String::new()),
            })
            .await
            .unwrap();

        assert_eq!(area.name, "Music");
        assert_eq!(area.icon, DEFAULT_LIFE_AREA_ICON);
        assert_eq!(area.color, DEFAULT_LIFE_AREA_COLOR);
        assert_eq!(area.level, 1);
        assert!(area.is_custom && area.is_active);

        let names: Vec<String> = service.list_life_areas().await.unwrap().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["Chess", "Music", "Vitality"]);
    }

    #[tokio::test]
    async fn test_delete_blocked_by_incomplete_quests() {
        let (env, service) = setup().await;
        let mut done = sample_quest("done", "chess");
        done.is_completed = true;
        env.connection
            .commit(
                ChangeSet::new()
                    .with_quest(sample_quest("open1", "chess"))
                    .with_quest(sample_quest("open2", "chess"))
                    .with_quest(done),
            )
            .await
            .unwrap();

        match service.delete_life_area("chess").await {
            Err(DomainError::InvariantViolation(message)) => assert!(message.contains("2 active quests")),
            other => panic!("expected invariant violation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_allowed_with_only_completed_quests() {
        let (env, service) = setup().await;
        let mut done = sample_quest("done", "chess");
        done.is_completed = true;
        env.connection.commit(ChangeSet::new().with_quest(done)).await.unwrap();

        service.delete_life_area("chess").await.unwrap();
        assert!(matches!(
            service.get_life_area("chess").await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_default_area_can_never_be_deleted() {
        let (_env, service) = setup().await;
        match service.delete_life_area("vitality").await {
            Err(DomainError::InvariantViolation(message)) => {
                assert!(message.contains("Cannot delete default life areas"))
            }
            other => panic!("expected invariant violation, got {:?}", other),
        }

        let deactivated = service
            .update_life_area("vitality", UpdateLifeAreaRequest { is_active: Some(false), ..Default::default() })
            .await
            .unwrap();
        assert!(!deactivated.is_active);
        assert!(service.delete_life_area("vitality").await.is_err());
    }

    #[tokio::test]
    async fn test_level_progress() {
        let (env, service) = setup().await;
        let mut chess = sample_life_area("chess", "Chess");
        chess.level = 2;
        chess.current_xp = 90;
        env.connection.commit(ChangeSet::new().with_life_area(chess)).await.unwrap();

        let progress = service.calculate_level_progress("chess").await.unwrap();
        assert_eq!(progress.current, 90);
        assert_eq!(progress.required, 180);
        assert!((progress.percentage - 50.0).abs() < 1e-9);

        assert!(matches!(
            service.calculate_level_progress("missing").await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
