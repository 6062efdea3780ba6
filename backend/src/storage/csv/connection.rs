//! # CSV Connection
//!
//! Owns the data directory and the write path shared by every repository.
//!
//! ```text
//! data/
//! ├── user.yaml
//! ├── life_areas.csv
//! ├── quests.csv
//! ├── subtasks.csv
//! ├── rewards.csv
//! └── commit.journal   (only while a commit is in flight)
//! ```
//!
//! A commit stages every touched file as `<file>.tmp`, writes the list of
//! staged files to `commit.journal`, renames each staged file over its
//! target, then removes the journal. Opening a connection rolls a leftover
//! journal forward and discards staged files that never made it into one.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::User;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::life_area_repository::{LifeAreaRecord, LifeAreaRepository};
use super::quest_repository::{QuestRecord, QuestRepository};
use super::reward_repository::{RewardRecord, RewardRepository};
use super::subtask_repository::{SubtaskRecord, SubtaskRepository};
use super::user_repository::UserRepository;
use crate::storage::traits::{ChangeSet, Connection};

pub(super) const USER_FILE: &str = "user.yaml";
pub(super) const LIFE_AREAS_FILE: &str = "life_areas.csv";
pub(super) const QUESTS_FILE: &str = "quests.csv";
pub(super) const SUBTASKS_FILE: &str = "subtasks.csv";
pub(super) const REWARDS_FILE: &str = "rewards.csv";
const JOURNAL_FILE: &str = "commit.journal";
const STAGED_SUFFIX: &str = "tmp";

/// CsvConnection manages the data directory and applies change sets
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
    write_lock: Arc<Mutex<()>>,
    operation_lock: Arc<tokio::sync::Mutex<()>>,
}

impl CsvConnection {
    /// Open (creating if needed) a data directory and recover any interrupted commit
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).with_context(|| {
                format!("Failed to create data directory {}", base_path.display())
            })?;
        }

        let connection = Self {
            base_directory: base_path,
            write_lock: Arc::new(Mutex::new(())),
            operation_lock: Arc::new(tokio::sync::Mutex::new(())),
        };
        connection.recover()?;
        Ok(connection)
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub(super) fn file_path(&self, file_name: &str) -> PathBuf {
        self.base_directory.join(file_name)
    }

    fn staged_path(&self, file_name: &str) -> PathBuf {
        self.file_path(&format!("{}.{}", file_name, STAGED_SUFFIX))
    }

    /// Read every record of a CSV file; a missing file is an empty table
    pub(super) fn read_table<R: DeserializeOwned>(&self, file_name: &str) -> Result<Vec<R>> {
        let path = self.file_path(file_name);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let mut reader = csv::Reader::from_reader(BufReader::new(file));
        let mut records = Vec::new();
        for result in reader.deserialize() {
            let record: R = result
                .with_context(|| format!("Failed to parse record in {}", path.display()))?;
            records.push(record);
        }
        Ok(records)
    }

    pub(super) fn read_user(&self) -> Result<Option<User>> {
        let path = self.file_path(USER_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let user: User = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(user))
    }

    fn stage_table<R: Serialize>(&self, file_name: &str, records: &[R]) -> Result<()> {
        let staged = self.staged_path(file_name);
        let file = File::create(&staged)
            .with_context(|| format!("Failed to create {}", staged.display()))?;
        let mut writer = csv::Writer::from_writer(BufWriter::new(file));
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn stage_user(&self, user: &User) -> Result<()> {
        let staged = self.staged_path(USER_FILE);
        let yaml = serde_yaml::to_string(user)?;
        fs::write(&staged, yaml)
            .with_context(|| format!("Failed to write {}", staged.display()))?;
        Ok(())
    }

    /// Synchronous body of [`Connection::commit`]
    fn commit_changes(&self, changes: ChangeSet) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let _guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut staged: Vec<&'static str> = Vec::new();
        let result = self.stage_changes(changes, &mut staged);
        if let Err(e) = result {
            for file_name in &staged {
                let _ = fs::remove_file(self.staged_path(file_name));
            }
            return Err(e);
        }

        self.write_journal(&staged)?;
        self.apply_staged(&staged)?;
        fs::remove_file(self.file_path(JOURNAL_FILE))?;

        debug!("Committed {} file(s): {:?}", staged.len(), staged);
        Ok(())
    }

    fn stage_changes(&self, changes: ChangeSet, staged: &mut Vec<&'static str>) -> Result<()> {
        if let Some(user) = &changes.user {
            self.stage_user(user)?;
            staged.push(USER_FILE);
        }

        if !changes.life_areas.is_empty() || !changes.deleted_life_area_ids.is_empty() {
            let mut records: Vec<LifeAreaRecord> = self.read_table(LIFE_AREAS_FILE)?;
            let deleted: HashSet<&String> = changes.deleted_life_area_ids.iter().collect();
            records.retain(|r| !deleted.contains(&r.id));
            for area in changes.life_areas {
                upsert(&mut records, LifeAreaRecord::from(area), |r| r.id.clone());
            }
            self.stage_table(LIFE_AREAS_FILE, &records)?;
            staged.push(LIFE_AREAS_FILE);
        }

        if !changes.quests.is_empty() || !changes.deleted_quest_ids.is_empty() {
            let mut records: Vec<QuestRecord> = self.read_table(QUESTS_FILE)?;
            let deleted: HashSet<&String> = changes.deleted_quest_ids.iter().collect();
            records.retain(|r| !deleted.contains(&r.id));
            for quest in changes.quests {
                upsert(&mut records, QuestRecord::from(quest), |r| r.id.clone());
            }
            self.stage_table(QUESTS_FILE, &records)?;
            staged.push(QUESTS_FILE);
        }

        if !changes.subtasks.is_empty() || !changes.deleted_subtask_ids.is_empty() {
            let mut records: Vec<SubtaskRecord> = self.read_table(SUBTASKS_FILE)?;
            let deleted: HashSet<&String> = changes.deleted_subtask_ids.iter().collect();
            records.retain(|r| !deleted.contains(&r.id));
            for subtask in changes.subtasks {
                upsert(&mut records, SubtaskRecord::from(subtask), |r| r.id.clone());
            }
            self.stage_table(SUBTASKS_FILE, &records)?;
            staged.push(SUBTASKS_FILE);
        }

        if !changes.rewards.is_empty() || !changes.deleted_reward_ids.is_empty() {
            let mut records: Vec<RewardRecord> = self.read_table(REWARDS_FILE)?;
            let deleted: HashSet<&String> = changes.deleted_reward_ids.iter().collect();
            records.retain(|r| !deleted.contains(&r.id));
            for reward in changes.rewards {
                upsert(&mut records, RewardRecord::from(reward), |r| r.id.clone());
            }
            self.stage_table(REWARDS_FILE, &records)?;
            staged.push(REWARDS_FILE);
        }

        Ok(())
    }

    fn write_journal(&self, staged: &[&str]) -> Result<()> {
        let journal = self.file_path(JOURNAL_FILE);
        let staged_journal = self.staged_path(JOURNAL_FILE);
        {
            let mut file = File::create(&staged_journal)?;
            for file_name in staged {
                writeln!(file, "{}", file_name)?;
            }
            file.sync_all()?;
        }
        fs::rename(&staged_journal, &journal)?;
        Ok(())
    }

    fn apply_staged<S: AsRef<str>>(&self, staged: &[S]) -> Result<()> {
        for file_name in staged {
            let file_name = file_name.as_ref();
            let from = self.staged_path(file_name);
            if from.exists() {
                fs::rename(&from, self.file_path(file_name))
                    .with_context(|| format!("Failed to apply staged {}", file_name))?;
            }
        }
        Ok(())
    }

    /// Finish a journaled commit and drop staged files that were never journaled
    fn recover(&self) -> Result<()> {
        let journal = self.file_path(JOURNAL_FILE);
        if journal.exists() {
            let contents = fs::read_to_string(&journal)?;
            let staged: Vec<&str> = contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect();
            info!("Rolling forward interrupted commit of {} file(s)", staged.len());
            self.apply_staged(&staged)?;
            fs::remove_file(&journal)?;
        }

        for entry in fs::read_dir(&self.base_directory)? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == STAGED_SUFFIX) {
                warn!("Discarding uncommitted staged file {}", path.display());
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

fn upsert<R, F>(records: &mut Vec<R>, record: R, id_of: F)
where
    F: Fn(&R) -> String,
{
    let id = id_of(&record);
    match records.iter_mut().find(|existing| id_of(existing) == id) {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}

#[async_trait]
impl Connection for CsvConnection {
    type UserRepository = UserRepository;
    type LifeAreaRepository = LifeAreaRepository;
    type QuestRepository = QuestRepository;
    type SubtaskRepository = SubtaskRepository;
    type RewardRepository = RewardRepository;

    fn create_user_repository(&self) -> Self::UserRepository {
        UserRepository::new(self.clone())
    }

    fn create_life_area_repository(&self) -> Self::LifeAreaRepository {
        LifeAreaRepository::new(self.clone())
    }

    fn create_quest_repository(&self) -> Self::QuestRepository {
        QuestRepository::new(self.clone())
    }

    fn create_subtask_repository(&self) -> Self::SubtaskRepository {
        SubtaskRepository::new(self.clone())
    }

    fn create_reward_repository(&self) -> Self::RewardRepository {
        RewardRepository::new(self.clone())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<()> {
        self.commit_changes(changes)
    }

    fn operation_lock(&self) -> Arc<tokio::sync::Mutex<()>> {
        self.operation_lock.clone()
    }
}
