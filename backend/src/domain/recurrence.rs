//! Recurring quest state machine.
//!
//! A recurring quest is in one of four states:
//!
//! ```text
//! inactive        recurrence.is_active == false (terminal)
//! pending_reset   now >= next_reset, checked before anything else
//! completed       completed_count >= target_count
//! active          otherwise
//! ```
//!
//! The reset transition is the only place `completed_count` goes back to 0 and
//! the only place the streak changes. Calendar boundaries (midnight, week start,
//! first of the month) are computed in the zone passed by the caller; services
//! pass `Local`.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use shared::{
    Quest, Recurrence, RecurrenceRequest, RecurrenceType, RecurringQuestProgress,
    RecurringQuestStatus,
};

/// Midnight at the start of the next period after `now`
pub fn next_reset_date<Tz: TimeZone>(
    recurrence_type: RecurrenceType,
    now: &DateTime<Tz>,
    week_starts_on_sunday: bool,
) -> DateTime<Tz> {
    let today = now.date_naive();
    let next_date = match recurrence_type {
        RecurrenceType::Daily => today + Duration::days(1),
        RecurrenceType::Weekly => {
            let weekday = today.weekday().num_days_from_sunday() as i64;
            let offset = if week_starts_on_sunday { 7 } else { 8 };
            let days = match (offset - weekday) % 7 {
                0 => 7,
                n => n,
            };
            today + Duration::days(days)
        }
        RecurrenceType::Monthly => first_of_next_month(today),
    };
    midnight(&now.timezone(), next_date)
}

fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date + Duration::days(31))
}

fn midnight<Tz: TimeZone>(zone: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    zone.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| zone.from_utc_datetime(&naive))
}

/// Builds the embedded recurrence for a newly created quest
pub fn new_recurrence<Tz: TimeZone>(
    request: &RecurrenceRequest,
    now: DateTime<Utc>,
    zone: &Tz,
    week_starts_on_sunday: bool,
) -> Recurrence {
    let next_reset = next_reset_date(
        request.recurrence_type,
        &now.with_timezone(zone),
        week_starts_on_sunday,
    );
    Recurrence {
        recurrence_type: request.recurrence_type,
        target_count: request.target_count.max(1),
        completed_count: 0,
        last_reset: now,
        next_reset: next_reset.with_timezone(&Utc),
        is_active: true,
        streak: 0,
        last_payout_xp: 0,
        last_payout_currency: 0,
    }
}

pub fn should_reset(quest: &Quest, now: DateTime<Utc>) -> bool {
    match &quest.recurrence {
        Some(recurrence) if recurrence.is_active => now >= recurrence.next_reset,
        _ => false,
    }
}

pub fn status(quest: &Quest, now: DateTime<Utc>) -> RecurringQuestStatus {
    let recurrence = match &quest.recurrence {
        Some(r) if r.is_active => r,
        _ => return RecurringQuestStatus::Inactive,
    };
    if now >= recurrence.next_reset {
        RecurringQuestStatus::PendingReset
    } else if recurrence.target_met() {
        RecurringQuestStatus::Completed
    } else {
        RecurringQuestStatus::Active
    }
}

/// Runs the reset transition if one is due. Returns true when the quest changed.
///
/// Idempotent: a second call before the new `next_reset` does nothing. The
/// streak grows only when the period being closed met its target.
pub fn reset_if_due<Tz: TimeZone>(
    quest: &mut Quest,
    now: DateTime<Utc>,
    zone: &Tz,
    week_starts_on_sunday: bool,
) -> bool {
    if !should_reset(quest, now) {
        return false;
    }
    let recurrence = match quest.recurrence.as_mut() {
        Some(r) => r,
        None => return false,
    };

    recurrence.streak = if recurrence.target_met() {
        recurrence.streak + 1
    } else {
        0
    };
    recurrence.completed_count = 0;
    recurrence.last_reset = now;
    recurrence.next_reset = next_reset_date(
        recurrence.recurrence_type,
        &now.with_timezone(zone),
        week_starts_on_sunday,
    )
    .with_timezone(&Utc);

    quest.is_completed = false;
    quest.completed_at = None;
    quest.updated_at = now;
    true
}

/// "Complete once per day", "Complete 3 times per week"
pub fn describe(quest: &Quest) -> String {
    match &quest.recurrence {
        None => String::new(),
        Some(r) if r.target_count == 1 => {
            format!("Complete once per {}", r.recurrence_type.period_name())
        }
        Some(r) => format!(
            "Complete {} times per {}",
            r.target_count,
            r.recurrence_type.period_name()
        ),
    }
}

pub fn progress(quest: &Quest, now: DateTime<Utc>) -> RecurringQuestProgress {
    let recurrence = match &quest.recurrence {
        Some(r) => r,
        None => {
            return RecurringQuestProgress {
                completed: 0,
                target: 1,
                percentage: if quest.is_completed { 100.0 } else { 0.0 },
                is_completed: quest.is_completed,
                days_until_reset: 0,
                time_until_reset: String::new(),
                status: RecurringQuestStatus::Inactive,
                description: String::new(),
            }
        }
    };

    let target = recurrence.target_count.max(1);
    let percentage = (recurrence.completed_count as f64 / target as f64 * 100.0).min(100.0);

    let remaining = recurrence.next_reset - now;
    let (days_until_reset, time_until_reset) = if remaining > Duration::zero() {
        let millis = remaining.num_milliseconds();
        let days = ceil_div(millis, Duration::days(1).num_milliseconds());
        if days == 1 {
            let hours = ceil_div(millis, Duration::hours(1).num_milliseconds());
            (days, format!("{}h", hours))
        } else {
            (days, format!("{} days", days))
        }
    } else {
        (0, "Ready to reset".to_string())
    };

    RecurringQuestProgress {
        completed: recurrence.completed_count,
        target: recurrence.target_count,
        percentage,
        is_completed: recurrence.target_met(),
        days_until_reset,
        time_until_reset,
        status: status(quest, now),
        description: describe(quest),
    }
}

fn ceil_div(value: i64, divisor: i64) -> i64 {
    (value + divisor - 1) / divisor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use shared::{Difficulty, Priority};
    use std::collections::BTreeSet;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn recurring_quest(kind: RecurrenceType, target: u32, now: DateTime<Utc>) -> Quest {
        let request = RecurrenceRequest { recurrence_type: kind, target_count: target };
        Quest {
            id: "q".to_string(),
            title: "Stretch".to_string(),
            description: None,
            difficulty: Difficulty::Easy,
            priority: Priority::Normal,
            life_area_id: "vitality".to_string(),
            tags: BTreeSet::new(),
            is_completed: false,
            completed_at: None,
            completed_subtasks: 0,
            total_subtasks: 0,
            xp_reward: 15,
            currency_reward: 4,
            was_rare_quest: false,
            created_at: now,
            updated_at: now,
            due_date: None,
            recurrence: Some(new_recurrence(&request, now, &Utc, true)),
            sync_id: None,
            last_sync_at: None,
        }
    }

    #[test]
    fn test_daily_reset_is_next_midnight() {
        // 2025-03-12 is a Wednesday
        let now = at(2025, 3, 12, 15, 30);
        assert_eq!(next_reset_date(RecurrenceType::Daily, &now, true), at(2025, 3, 13, 0, 0));
    }

    #[test]
    fn test_daily_reset_from_midnight_moves_a_full_day() {
        let now = at(2025, 3, 12, 0, 0);
        assert_eq!(next_reset_date(RecurrenceType::Daily, &now, true), at(2025, 3, 13, 0, 0));
    }

    #[test]
    fn test_weekly_reset_respects_week_start() {
        let wednesday = at(2025, 3, 12, 9, 0);
        assert_eq!(
            next_reset_date(RecurrenceType::Weekly, &wednesday, true),
            at(2025, 3, 16, 0, 0)
        );
        assert_eq!(
            next_reset_date(RecurrenceType::Weekly, &wednesday, false),
            at(2025, 3, 17, 0, 0)
        );

        // On the boundary day itself, the reset is a full week away
        let sunday = at(2025, 3, 16, 9, 0);
        assert_eq!(next_reset_date(RecurrenceType::Weekly, &sunday, true), at(2025, 3, 23, 0, 0));
        let monday = at(2025, 3, 17, 9, 0);
        assert_eq!(next_reset_date(RecurrenceType::Weekly, &monday, false), at(2025, 3, 24, 0, 0));
    }

    #[test]
    fn test_monthly_reset_rolls_year() {
        let now = at(2025, 12, 20, 9, 0);
        assert_eq!(next_reset_date(RecurrenceType::Monthly, &now, true), at(2026, 1, 1, 0, 0));
        let now = at(2025, 1, 31, 23, 59);
        assert_eq!(next_reset_date(RecurrenceType::Monthly, &now, true), at(2025, 2, 1, 0, 0));
    }

    #[test]
    fn test_reset_uses_the_given_zone() {
        let zone = FixedOffset::east_opt(2 * 3600).unwrap();
        // 23:30 UTC is already 01:30 on the next day at UTC+2
        let now = at(2025, 3, 12, 23, 30).with_timezone(&zone);
        let next = next_reset_date(RecurrenceType::Daily, &now, true);
        assert_eq!(next.with_timezone(&Utc), at(2025, 3, 13, 22, 0));
    }

    #[test]
    fn test_met_target_increments_streak_on_reset() {
        let created = at(2025, 3, 12, 8, 0);
        let mut quest = recurring_quest(RecurrenceType::Daily, 1, created);
        {
            let r = quest.recurrence.as_mut().unwrap();
            r.completed_count = 1;
            r.streak = 4;
        }
        quest.is_completed = true;
        quest.completed_at = Some(created);

        let now = at(2025, 3, 13, 7, 0);
        assert!(reset_if_due(&mut quest, now, &Utc, true));

        let r = quest.recurrence.as_ref().unwrap();
        assert_eq!(r.streak, 5);
        assert_eq!(r.completed_count, 0);
        assert_eq!(r.last_reset, now);
        assert_eq!(r.next_reset, at(2025, 3, 14, 0, 0));
        assert!(!quest.is_completed);
        assert!(quest.completed_at.is_none());
    }

    #[test]
    fn test_unmet_target_breaks_streak() {
        let created = at(2025, 3, 12, 8, 0);
        let mut quest = recurring_quest(RecurrenceType::Daily, 2, created);
        quest.recurrence.as_mut().unwrap().streak = 3;

        assert!(reset_if_due(&mut quest, at(2025, 3, 13, 0, 0), &Utc, true));
        assert_eq!(quest.recurrence.as_ref().unwrap().streak, 0);
    }

    #[test]
    fn test_met_target_keeps_streak_across_a_gap() {
        let created = at(2025, 3, 12, 8, 0);
        let mut quest = recurring_quest(RecurrenceType::Daily, 1, created);
        {
            let r = quest.recurrence.as_mut().unwrap();
            r.completed_count = 1;
            r.streak = 2;
        }
        // Next opened a day and a half after the reset was due
        assert!(reset_if_due(&mut quest, at(2025, 3, 14, 9, 0), &Utc, true));
        let r = quest.recurrence.as_ref().unwrap();
        assert_eq!(r.streak, 3);
        assert_eq!(r.completed_count, 0);
        assert_eq!(r.next_reset, at(2025, 3, 15, 0, 0));
    }

    #[test]
    fn test_reset_is_idempotent_before_next_reset() {
        let created = at(2025, 3, 12, 8, 0);
        let mut quest = recurring_quest(RecurrenceType::Daily, 1, created);
        assert!(!reset_if_due(&mut quest, at(2025, 3, 12, 23, 59), &Utc, true));

        assert!(reset_if_due(&mut quest, at(2025, 3, 13, 1, 0), &Utc, true));
        let snapshot = quest.clone();
        assert!(!reset_if_due(&mut quest, at(2025, 3, 13, 2, 0), &Utc, true));
        assert_eq!(quest, snapshot);
    }

    #[test]
    fn test_inactive_recurrence_never_resets() {
        let created = at(2025, 3, 12, 8, 0);
        let mut quest = recurring_quest(RecurrenceType::Daily, 1, created);
        quest.recurrence.as_mut().unwrap().is_active = false;

        let later = at(2025, 4, 1, 0, 0);
        assert_eq!(status(&quest, later), RecurringQuestStatus::Inactive);
        assert!(!reset_if_due(&mut quest, later, &Utc, true));
    }

    #[test]
    fn test_status_checks_pending_reset_first() {
        let created = at(2025, 3, 12, 8, 0);
        let mut quest = recurring_quest(RecurrenceType::Daily, 1, created);
        assert_eq!(status(&quest, created), RecurringQuestStatus::Active);

        quest.recurrence.as_mut().unwrap().completed_count = 1;
        assert_eq!(status(&quest, created), RecurringQuestStatus::Completed);
        assert_eq!(status(&quest, at(2025, 3, 13, 0, 0)), RecurringQuestStatus::PendingReset);
    }

    #[test]
    fn test_progress_reports_time_until_reset() {
        let created = at(2025, 3, 12, 8, 0);
        let mut quest = recurring_quest(RecurrenceType::Weekly, 3, created);
        quest.recurrence.as_mut().unwrap().completed_count = 1;

        let progress = progress(&quest, created);
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.target, 3);
        assert!((progress.percentage - 100.0 / 3.0).abs() < 1e-9);
        assert!(!progress.is_completed);
        // Wednesday 08:00 to Sunday 00:00 is 3 days 16 hours
        assert_eq!(progress.days_until_reset, 4);
        assert_eq!(progress.time_until_reset, "4 days");
        assert_eq!(progress.description, "Complete 3 times per week");

        let late = at(2025, 3, 15, 20, 0);
        let progress = super::progress(&quest, late);
        assert_eq!(progress.days_until_reset, 1);
        assert_eq!(progress.time_until_reset, "4h");

        let after = at(2025, 3, 16, 0, 0);
        assert_eq!(super::progress(&quest, after).time_until_reset, "Ready to reset");
    }

    #[test]
    fn test_describe_single_completion() {
        let quest = recurring_quest(RecurrenceType::Daily, 1, at(2025, 3, 12, 8, 0));
        assert_eq!(describe(&quest), "Complete once per day");
    }
}
