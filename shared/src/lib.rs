use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing one of the shared enums from its string form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

/// The five ordered difficulty tiers of a quest or subtask
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Trivial,
    Easy,
    Medium,
    Hard,
    Impossible,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Trivial,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Impossible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Trivial => "trivial",
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Impossible => "impossible",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Easy
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ParseEnumError { kind: "difficulty", value: s.to_string() })
    }
}

/// Quest priority, which scales the base XP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Normal,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            other => Err(ParseEnumError { kind: "priority", value: other.to_string() }),
        }
    }
}

/// How often a recurring quest's period rolls over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
}

impl RecurrenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceType::Daily => "daily",
            RecurrenceType::Weekly => "weekly",
            RecurrenceType::Monthly => "monthly",
        }
    }

    /// The period noun used in descriptions ("day", "week", "month")
    pub fn period_name(&self) -> &'static str {
        match self {
            RecurrenceType::Daily => "day",
            RecurrenceType::Weekly => "week",
            RecurrenceType::Monthly => "month",
        }
    }
}

impl fmt::Display for RecurrenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrenceType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(RecurrenceType::Daily),
            "weekly" => Ok(RecurrenceType::Weekly),
            "monthly" => Ok(RecurrenceType::Monthly),
            other => Err(ParseEnumError { kind: "recurrence type", value: other.to_string() }),
        }
    }
}

/// The single player of an installation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Cumulative XP across all life areas
    pub total_xp: u64,
    /// Spendable currency balance
    pub total_currency: u64,
    /// Weekly recurrences reset on Sunday when true, Monday otherwise
    pub week_starts_on_sunday: bool,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    #[serde(default)]
    pub sync_id: Option<String>,
}

/// A skill category that levels up from quest XP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeArea {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    /// Always >= 1
    pub level: u32,
    /// XP accrued toward the next level
    pub current_xp: u64,
    /// Cumulative XP, never decreases
    pub total_xp: u64,
    pub is_custom: bool,
    /// Inactive areas cannot be assigned to new quests
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub sync_id: Option<String>,
    #[serde(default)]
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// Repeating-quest bookkeeping embedded in a quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    #[serde(rename = "type")]
    pub recurrence_type: RecurrenceType,
    /// Completions required per period
    pub target_count: u32,
    /// Completions in the current period
    pub completed_count: u32,
    pub last_reset: DateTime<Utc>,
    pub next_reset: DateTime<Utc>,
    pub is_active: bool,
    /// Consecutive periods in which the target was met
    pub streak: u32,
    /// XP paid by the most recent completion in any period
    #[serde(default)]
    pub last_payout_xp: u64,
    #[serde(default)]
    pub last_payout_currency: u64,
}

impl Recurrence {
    pub fn target_met(&self) -> bool {
        self.completed_count >= self.target_count
    }
}

/// A task that pays XP and currency on completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub priority: Priority,
    pub life_area_id: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,

    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_subtasks: u32,
    pub total_subtasks: u32,

    /// Frozen at creation, overwritten with the rolled payout on one-off completion
    pub xp_reward: u64,
    pub currency_reward: u64,
    pub was_rare_quest: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub recurrence: Option<Recurrence>,

    #[serde(default)]
    pub sync_id: Option<String>,
    #[serde(default)]
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl Quest {
    /// True when the quest has a recurrence that is still running
    pub fn has_active_recurrence(&self) -> bool {
        self.recurrence.as_ref().map_or(false, |r| r.is_active)
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && self.due_date.map_or(false, |due| due < now)
    }

    /// Completed either as a one-off or for the current recurring period
    pub fn is_done(&self) -> bool {
        self.is_completed || self.recurrence.as_ref().map_or(false, Recurrence::target_met)
    }
}

/// A sub-unit of a quest, linked by `quest_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub quest_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub priority: Priority,
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Estimate only: subtask completion never pays this out
    pub xp_reward: u64,
    pub currency_reward: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub sync_id: Option<String>,
}

/// A user-defined item that can be bought with currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub cost: u64,
    pub category: String,
    pub is_custom: bool,
    pub is_purchased: bool,
    #[serde(default)]
    pub purchased_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub sync_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceRequest {
    #[serde(rename = "type")]
    pub recurrence_type: RecurrenceType,
    #[serde(default = "default_target_count")]
    pub target_count: u32,
}

fn default_target_count() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateQuestRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub priority: Priority,
    pub life_area_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRequest>,
}

/// Partial quest edit; rewards are never recomputed from these fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateQuestRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub life_area_id: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub clear_due_date: bool,
    #[serde(default)]
    pub recurrence_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSubtaskRequest {
    pub quest_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateSubtaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLifeAreaRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateLifeAreaRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRewardRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cost: Option<u64>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardListRequest {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardListResponse {
    pub available: Vec<Reward>,
    pub purchased: Vec<Reward>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRewardResponse {
    pub reward: Reward,
    pub remaining_currency: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateUserSettingsRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub week_starts_on_sunday: Option<bool>,
}

/// Derived view of a life area's progress toward its next level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub current: u64,
    pub required: u64,
    /// 0.0 - 100.0
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringQuestStatus {
    Inactive,
    PendingReset,
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringQuestProgress {
    pub completed: u32,
    pub target: u32,
    pub percentage: f64,
    pub is_completed: bool,
    pub days_until_reset: i64,
    /// "5h", "3 days", "Ready to reset", or empty for one-off quests
    pub time_until_reset: String,
    pub status: RecurringQuestStatus,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestFilter {
    All,
    Active,
    Completed,
    Overdue,
    Recurring,
}

impl Default for QuestFilter {
    fn default() -> Self {
        QuestFilter::All
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestListRequest {
    #[serde(default)]
    pub filter: QuestFilter,
    #[serde(default)]
    pub life_area_id: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestStats {
    pub all: usize,
    pub active: usize,
    pub completed: usize,
    pub overdue: usize,
    pub recurring: usize,
    pub completed_today: usize,
}

/// What was actually paid for one completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub xp: u64,
    pub currency: u64,
    pub was_rare: bool,
    pub catch_up_applied: bool,
    pub life_area_id: String,
    /// Level of the credited life area after the award, if it exists
    pub level_after: Option<u32>,
    pub levels_gained: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    /// The quest is now completed
    Completed,
    /// A recurring completion was counted but the period target is not met yet
    PeriodProgress,
    /// Nothing changed; the quest (or period) was already completed
    AlreadyCompleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub quest_id: String,
    pub status: CompletionStatus,
    pub payout: Option<Payout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskCompletionOutcome {
    pub subtask_id: String,
    pub already_completed: bool,
    pub completed_subtasks: u32,
    pub total_subtasks: u32,
    /// Present when this subtask finished the parent quest
    pub quest_completion: Option<CompletionOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetReport {
    pub checked: usize,
    pub reset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub user: User,
    pub active_quests: usize,
    pub completed_today: usize,
    pub overdue_quests: usize,
    pub highest_level: u32,
}
