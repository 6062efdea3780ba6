//! Quest completion transaction.
//!
//! Completion is planned as a pure function over the records it touches and
//! returned as a [`ChangeSet`] so the caller can commit quest, user and life
//! area together. Subtask completion folds the same plan into its own change
//! set when the last subtask finishes the parent.

use chrono::{DateTime, TimeZone, Utc};
use shared::{CompletionOutcome, CompletionStatus, LifeArea, Payout, Quest, User};

use super::leveling::credit_life_area;
use super::modifiers::{catch_up_applies, roll_rarity, RandomSource, RolledModifiers};
use super::recurrence::reset_if_due;
use super::reward_formula::RewardAmounts;
use crate::storage::ChangeSet;

/// Everything a completion needs to know about the world at completion time
pub struct CompletionContext<'a, Tz: TimeZone> {
    pub user: &'a User,
    /// All life areas, for the catch-up comparison against the current max level
    pub life_areas: &'a [LifeArea],
    pub random: &'a dyn RandomSource,
    pub now: DateTime<Utc>,
    /// Zone used for recurring period boundaries
    pub zone: &'a Tz,
}

/// The records to write and the outcome to report for one completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionPlan {
    pub outcome: CompletionOutcome,
    pub changes: ChangeSet,
}

impl CompletionPlan {
    fn unchanged(quest_id: &str, status: CompletionStatus) -> Self {
        Self {
            outcome: CompletionOutcome {
                quest_id: quest_id.to_string(),
                status,
                payout: None,
            },
            changes: ChangeSet::new(),
        }
    }

    /// The quest as it will be stored, if the plan writes it
    pub fn planned_quest(&self) -> Option<&Quest> {
        self.changes
            .quests
            .iter()
            .rev()
            .find(|q| q.id == self.outcome.quest_id)
    }
}

/// Plans a completion, taking the recurring path for quests with an active recurrence
pub fn plan_completion<Tz: TimeZone>(quest: &Quest, ctx: &CompletionContext<'_, Tz>) -> CompletionPlan {
    if quest.has_active_recurrence() {
        plan_recurring_completion(quest, ctx)
    } else {
        plan_one_off_completion(quest, ctx)
    }
}

/// One-off completion: pays once and overwrites the stored reward with the payout
pub fn plan_one_off_completion<Tz: TimeZone>(
    quest: &Quest,
    ctx: &CompletionContext<'_, Tz>,
) -> CompletionPlan {
    if quest.is_completed {
        return CompletionPlan::unchanged(&quest.id, CompletionStatus::AlreadyCompleted);
    }

    let base = RewardAmounts { xp: quest.xp_reward, currency: quest.currency_reward };
    let (payout, mut changes) = pay_out(base, &quest.life_area_id, ctx);

    let mut completed = quest.clone();
    completed.is_completed = true;
    completed.completed_at = Some(ctx.now);
    completed.was_rare_quest = payout.was_rare;
    completed.xp_reward = payout.xp;
    completed.currency_reward = payout.currency;
    completed.updated_at = ctx.now;
    changes.quests.push(completed);

    CompletionPlan {
        outcome: CompletionOutcome {
            quest_id: quest.id.clone(),
            status: CompletionStatus::Completed,
            payout: Some(payout),
        },
        changes,
    }
}

/// Recurring completion: counts toward the period target and pays every time
///
/// The stored base reward is left alone; the rolled amounts go to
/// `last_payout_*` on the recurrence. A due reset runs first so a stale count
/// from an earlier period is never extended.
pub fn plan_recurring_completion<Tz: TimeZone>(
    quest: &Quest,
    ctx: &CompletionContext<'_, Tz>,
) -> CompletionPlan {
    if !quest.has_active_recurrence() {
        return plan_one_off_completion(quest, ctx);
    }

    let mut updated = quest.clone();
    let was_reset = reset_if_due(&mut updated, ctx.now, ctx.zone, ctx.user.week_starts_on_sunday);

    let target_met = updated.recurrence.as_ref().map_or(false, |r| r.target_met());
    if target_met {
        let mut plan = CompletionPlan::unchanged(&quest.id, CompletionStatus::AlreadyCompleted);
        if was_reset {
            plan.changes.quests.push(updated);
        }
        return plan;
    }

    let base = RewardAmounts { xp: updated.xp_reward, currency: updated.currency_reward };
    let (payout, mut changes) = pay_out(base, &updated.life_area_id, ctx);

    let mut period_done = false;
    if let Some(recurrence) = updated.recurrence.as_mut() {
        recurrence.completed_count += 1;
        recurrence.last_payout_xp = payout.xp;
        recurrence.last_payout_currency = payout.currency;
        period_done = recurrence.target_met();
    }
    updated.was_rare_quest = payout.was_rare;
    updated.updated_at = ctx.now;
    if period_done {
        updated.is_completed = true;
        updated.completed_at = Some(ctx.now);
    }
    changes.quests.push(updated);

    CompletionPlan {
        outcome: CompletionOutcome {
            quest_id: quest.id.clone(),
            status: if period_done {
                CompletionStatus::Completed
            } else {
                CompletionStatus::PeriodProgress
            },
            payout: Some(payout),
        },
        changes,
    }
}

/// Rolls the modifiers, then credits the user and the quest's life area
fn pay_out<Tz: TimeZone>(
    base: RewardAmounts,
    life_area_id: &str,
    ctx: &CompletionContext<'_, Tz>,
) -> (Payout, ChangeSet) {
    let area = ctx.life_areas.iter().find(|a| a.id == life_area_id);
    let modifiers = RolledModifiers {
        is_rare: roll_rarity(ctx.random),
        catch_up: area.map_or(false, |a| catch_up_applies(a.level, ctx.life_areas)),
    };
    let amounts = modifiers.apply(base);

    let mut user = ctx.user.clone();
    user.total_xp += amounts.xp;
    user.total_currency += amounts.currency;
    user.last_active_at = ctx.now;
    let mut changes = ChangeSet::new().with_user(user);

    let mut level_after = None;
    let mut levels_gained = 0;
    if let Some(area) = area {
        let mut credited = area.clone();
        levels_gained = credit_life_area(&mut credited, amounts.xp);
        credited.updated_at = ctx.now;
        level_after = Some(credited.level);
        changes.life_areas.push(credited);
    }

    let payout = Payout {
        xp: amounts.xp,
        currency: amounts.currency,
        was_rare: modifiers.is_rare,
        catch_up_applied: modifiers.catch_up,
        life_area_id: life_area_id.to_string(),
        level_after,
        levels_gained,
    };
    (payout, changes)
}
