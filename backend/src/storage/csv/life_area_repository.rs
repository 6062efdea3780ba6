//! # CSV Life Area Repository
//!
//! ```csv
//! id,name,description,icon,color,level,current_xp,total_xp,is_custom,is_active,created_at,updated_at,sync_id,last_sync_at
//! vitality,Vitality,"Physical health, fitness, and energy",💪,#ef4444,3,120,570,false,true,2025-03-12T08:00:00Z,2025-03-14T19:30:00Z,,
//! ```

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::LifeArea;
use tracing::debug;

use super::connection::{CsvConnection, LIFE_AREAS_FILE};
use crate::storage::traits::{ChangeSet, Connection, LifeAreaStorage};

/// CSV record structure for life areas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct LifeAreaRecord {
    pub(super) id: String,
    name: String,
    description: String,
    icon: String,
    color: String,
    level: u32,
    current_xp: u64,
    total_xp: u64,
    is_custom: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    sync_id: Option<String>,
    last_sync_at: Option<DateTime<Utc>>,
}

impl From<LifeArea> for LifeAreaRecord {
    fn from(area: LifeArea) -> Self {
        LifeAreaRecord {
            id: area.id,
            name: area.name,
            description: area.description,
            icon: area.icon,
            color: area.color,
            level: area.level,
            current_xp: area.current_xp,
            total_xp: area.total_xp,
            is_custom: area.is_custom,
            is_active: area.is_active,
            created_at: area.created_at,
            updated_at: area.updated_at,
            sync_id: area.sync_id,
            last_sync_at: area.last_sync_at,
        }
    }
}

impl From<LifeAreaRecord> for LifeArea {
    fn from(record: LifeAreaRecord) -> Self {
        LifeArea {
            id: record.id,
            name: record.name,
            description: record.description,
            icon: record.icon,
            color: record.color,
            level: record.level.max(1),
            current_xp: record.current_xp,
            total_xp: record.total_xp,
            is_custom: record.is_custom,
            is_active: record.is_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
            sync_id: record.sync_id,
            last_sync_at: record.last_sync_at,
        }
    }
}

#[derive(Clone)]
pub struct LifeAreaRepository {
    connection: CsvConnection,
}

impl LifeAreaRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_life_areas(&self) -> Result<Vec<LifeArea>> {
        let records: Vec<LifeAreaRecord> = self.connection.read_table(LIFE_AREAS_FILE)?;
        Ok(records.into_iter().map(LifeArea::from).collect())
    }
}

#[async_trait]
impl LifeAreaStorage for LifeAreaRepository {
    async fn store_life_area(&self, life_area: &LifeArea) -> Result<()> {
        debug!("Storing life area {}", life_area.id);
        self.connection
            .commit(ChangeSet::new().with_life_area(life_area.clone()))
            .await
    }

    async fn bulk_store_life_areas(&self, life_areas: &[LifeArea]) -> Result<()> {
        let mut changes = ChangeSet::new();
        changes.life_areas.extend(life_areas.iter().cloned());
        self.connection.commit(changes).await
    }

    async fn get_life_area(&self, life_area_id: &str) -> Result<Option<LifeArea>> {
        Ok(self
            .read_life_areas()?
            .into_iter()
            .find(|area| area.id == life_area_id))
    }

    async fn list_life_areas(&self) -> Result<Vec<LifeArea>> {
        let mut areas = self.read_life_areas()?;
        areas.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(areas)
    }

    async fn update_life_area(&self, life_area: &LifeArea) -> Result<()> {
        if self.get_life_area(&life_area.id).await?.is_none() {
            return Err(anyhow!("Life area {} does not exist", life_area.id));
        }
        self.store_life_area(life_area).await
    }

    async fn delete_life_area(&self, life_area_id: &str) -> Result<bool> {
        if self.get_life_area(life_area_id).await?.is_none() {
            return Ok(false);
        }
        self.connection
            .commit(ChangeSet::new().delete_life_area(life_area_id))
            .await?;
        Ok(true)
    }
}
