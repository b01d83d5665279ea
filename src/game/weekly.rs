use chrono::{Datelike, Days, NaiveDate};

use crate::store::operations::engagement::WeeklyGoal;

/// What kind of progression event is being counted against the weekly goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalEvent {
    QuestComplete,
    BattleWon,
    XpOnly,
}

pub struct WeeklyGoalTracker;

impl WeeklyGoalTracker {
    /// The most recent Monday at or before the given date. Weekly records are
    /// keyed by this date; a new week implies a brand-new record.
    pub fn week_start(date: NaiveDate) -> NaiveDate {
        let days_from_monday = date.weekday().num_days_from_monday() as u64;
        date.checked_sub_days(Days::new(days_from_monday))
            .unwrap_or(date)
    }

    /// XP always accumulates; quest and battle counters only on their event
    /// kind. Counters are never clamped to the target.
    pub fn record_progress(goal: &mut WeeklyGoal, xp_delta: u32, event: GoalEvent) {
        goal.xp_earned += xp_delta;
        match event {
            GoalEvent::QuestComplete => goal.quests_completed += 1,
            GoalEvent::BattleWon => goal.battles_won += 1,
            GoalEvent::XpOnly => {}
        }
    }

    /// Display helper: percent of a target reached, capped at 100.
    pub fn percent_complete(earned: u32, target: u32) -> u32 {
        if target == 0 {
            return 100;
        }
        ((earned as u64 * 100) / target as u64).min(100) as u32
    }
}
