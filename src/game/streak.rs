use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::store::operations::engagement::StreakRecord;

/// How one activity day related to the streak that preceded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    Unchanged,
    Extended,
    Restarted,
}

/// Daily continuity state derived purely from dates. Callers pass "today"
/// explicitly so the logic stays deterministic under test.
pub struct StreakTracker;

impl StreakTracker {
    /// Apply one logged-activity day to the record. Idempotent within a day:
    /// the same-day check guarantees repeated calls never double-increment.
    pub fn update(record: &mut StreakRecord, today: NaiveDate) -> StreakChange {
        let change = match record.last_activity_date {
            Some(last) if last == today => StreakChange::Unchanged,
            Some(last) if Some(last) == today.checked_sub_days(Days::new(1)) => {
                record.current_streak += 1;
                StreakChange::Extended
            }
            _ => {
                // Gap of two or more days, or first-ever activity
                record.current_streak = 1;
                record.streak_start_date = Some(today);
                StreakChange::Restarted
            }
        };

        if record.current_streak > record.longest_streak {
            record.longest_streak = record.current_streak;
        }
        record.last_activity_date = Some(today);
        change
    }
}
