use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakRecord {
    pub hero_id: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
    pub streak_start_date: Option<NaiveDate>,
}

impl StreakRecord {
    pub fn fresh(hero_id: &str) -> Self {
        Self {
            hero_id: hero_id.to_string(),
            current_streak: 0,
            longest_streak: 0,
            last_activity_date: None,
            streak_start_date: None,
        }
    }
}

/// One record per (hero, week). Counters only ever grow; a new week gets a
/// brand-new record, which is the implicit weekly reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyGoal {
    pub hero_id: String,
    pub week_start: NaiveDate,
    pub xp_target: u32,
    pub xp_earned: u32,
    pub quests_target: u32,
    pub quests_completed: u32,
    pub battles_target: u32,
    pub battles_won: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    QuestComplete,
    BattleWon,
    BattleLost,
    AchievementUnlocked,
    LevelUp,
    AssignmentGraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub hero_id: String,
    pub kind: ActivityKind,
    pub title: String,
    pub xp_earned: u32,
    pub gold_earned: u32,
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DailyQuestKind {
    CompleteLesson,
    WinBattle,
    EarnXp,
}

/// Rotating daily challenge template, shared across heroes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyQuest {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub kind: DailyQuestKind,
    pub target_value: u32,
    pub xp_reward: u32,
    pub gold_reward: u32,
    pub icon: String,
    pub is_active: bool,
}

/// Per-(hero, template, calendar date) progress row; a new date starts blank.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroDailyQuest {
    pub hero_id: String,
    pub daily_quest_id: u32,
    pub date: NaiveDate,
    pub current_progress: u32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

fn default_daily_quests() -> Vec<DailyQuest> {
    vec![
        DailyQuest {
            id: 1,
            title: "Scholar's Path".to_string(),
            description: "Complete 1 lesson".to_string(),
            kind: DailyQuestKind::CompleteLesson,
            target_value: 1,
            xp_reward: 50,
            gold_reward: 20,
            icon: "📚".to_string(),
            is_active: true,
        },
        DailyQuest {
            id: 2,
            title: "Gladiator".to_string(),
            description: "Win 1 battle".to_string(),
            kind: DailyQuestKind::WinBattle,
            target_value: 1,
            xp_reward: 75,
            gold_reward: 30,
            icon: "⚔️".to_string(),
            is_active: true,
        },
        DailyQuest {
            id: 3,
            title: "Treasure Hunter".to_string(),
            description: "Earn 100 XP".to_string(),
            kind: DailyQuestKind::EarnXp,
            target_value: 100,
            xp_reward: 50,
            gold_reward: 20,
            icon: "⭐".to_string(),
            is_active: true,
        },
    ]
}

impl Store {
    pub fn get_streak(&self, hero_id: &str) -> Result<Option<StreakRecord>, StoreError> {
        match self.streaks.get(keys::streak_key(hero_id).as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn get_or_create_streak(&self, hero_id: &str) -> Result<StreakRecord, StoreError> {
        if let Some(existing) = self.get_streak(hero_id)? {
            return Ok(existing);
        }
        let fresh = StreakRecord::fresh(hero_id);
        self.put_streak(&fresh)?;
        Ok(fresh)
    }

    pub fn put_streak(&self, streak: &StreakRecord) -> Result<(), StoreError> {
        let bytes = Self::serialize(streak)?;
        self.streaks
            .insert(keys::streak_key(&streak.hero_id).as_bytes(), bytes)?;
        Ok(())
    }

    pub fn get_or_create_weekly_goal(
        &self,
        hero_id: &str,
        week_start: NaiveDate,
        game: &GameConfig,
    ) -> Result<WeeklyGoal, StoreError> {
        let key = keys::weekly_goal_key(hero_id, week_start);
        if let Some(raw) = self.weekly_goals.get(key.as_bytes())? {
            return Self::deserialize(&raw);
        }
        let fresh = WeeklyGoal {
            hero_id: hero_id.to_string(),
            week_start,
            xp_target: game.weekly_xp_target,
            xp_earned: 0,
            quests_target: game.weekly_quests_target,
            quests_completed: 0,
            battles_target: game.weekly_battles_target,
            battles_won: 0,
        };
        self.put_weekly_goal(&fresh)?;
        Ok(fresh)
    }

    pub fn put_weekly_goal(&self, goal: &WeeklyGoal) -> Result<(), StoreError> {
        let key = keys::weekly_goal_key(&goal.hero_id, goal.week_start);
        let bytes = Self::serialize(goal)?;
        self.weekly_goals.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    pub fn append_activity(&self, activity: &Activity) -> Result<(), StoreError> {
        let key = keys::activity_key(
            &activity.hero_id,
            activity.created_at.timestamp_millis(),
            &activity.id,
        );
        let bytes = Self::serialize(activity)?;
        self.activities.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    /// Newest-first thanks to the reverse-timestamp key layout.
    pub fn list_recent_activities(
        &self,
        hero_id: &str,
        limit: usize,
    ) -> Result<Vec<Activity>, StoreError> {
        let prefix = keys::activity_prefix(hero_id);
        let mut activities = Vec::with_capacity(limit);
        for item in self.activities.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            activities.push(Self::deserialize::<Activity>(&value)?);
            if activities.len() >= limit {
                break;
            }
        }
        Ok(activities)
    }

    /// Active daily quest templates, seeding the built-in defaults on first
    /// use. Lazy seeding mirrors how the rest of the engagement state is
    /// created on demand; there is no startup job.
    pub fn list_active_daily_quests(&self) -> Result<Vec<DailyQuest>, StoreError> {
        let mut templates = Vec::new();
        for item in self.daily_quests.iter() {
            let (_, value) = item?;
            let template: DailyQuest = Self::deserialize(&value)?;
            if template.is_active {
                templates.push(template);
            }
        }
        if templates.is_empty() {
            for template in default_daily_quests() {
                self.put_daily_quest(&template)?;
                templates.push(template);
            }
        }
        templates.sort_by_key(|t| t.id);
        Ok(templates)
    }

    pub fn put_daily_quest(&self, template: &DailyQuest) -> Result<(), StoreError> {
        let bytes = Self::serialize(template)?;
        self.daily_quests
            .insert(keys::daily_quest_key(template.id).as_bytes(), bytes)?;
        Ok(())
    }

    pub fn get_or_create_hero_daily_quest(
        &self,
        hero_id: &str,
        daily_quest_id: u32,
        date: NaiveDate,
    ) -> Result<HeroDailyQuest, StoreError> {
        let key = keys::hero_daily_quest_key(hero_id, date, daily_quest_id);
        if let Some(raw) = self.hero_daily_quests.get(key.as_bytes())? {
            return Self::deserialize(&raw);
        }
        let fresh = HeroDailyQuest {
            hero_id: hero_id.to_string(),
            daily_quest_id,
            date,
            current_progress: 0,
            is_completed: false,
            completed_at: None,
        };
        self.put_hero_daily_quest(&fresh)?;
        Ok(fresh)
    }

    pub fn put_hero_daily_quest(&self, row: &HeroDailyQuest) -> Result<(), StoreError> {
        let key = keys::hero_daily_quest_key(&row.hero_id, row.date, row.daily_quest_id);
        let bytes = Self::serialize(row)?;
        self.hero_daily_quests.insert(key.as_bytes(), bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn weekly_goal_created_with_configured_targets() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("engage-db").to_str().unwrap()).unwrap();

        let game = GameConfig {
            weekly_xp_target: 750,
            ..GameConfig::default()
        };
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let goal = store.get_or_create_weekly_goal("h1", monday, &game).unwrap();
        assert_eq!(goal.xp_target, 750);
        assert_eq!(goal.xp_earned, 0);

        // Second call returns the stored record, not a new one
        let mut bumped = goal.clone();
        bumped.xp_earned = 120;
        store.put_weekly_goal(&bumped).unwrap();
        let again = store.get_or_create_weekly_goal("h1", monday, &game).unwrap();
        assert_eq!(again.xp_earned, 120);
    }

    #[test]
    fn activities_list_newest_first() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("engage-db2").to_str().unwrap()).unwrap();

        for (i, offset_ms) in [(1, 1000), (2, 3000), (3, 2000)] {
            let created_at = DateTime::<Utc>::from_timestamp_millis(offset_ms).unwrap();
            store
                .append_activity(&Activity {
                    id: format!("a{i}"),
                    hero_id: "h1".to_string(),
                    kind: ActivityKind::QuestComplete,
                    title: format!("event {i}"),
                    xp_earned: 0,
                    gold_earned: 0,
                    reference_id: None,
                    created_at,
                })
                .unwrap();
        }

        let recent = store.list_recent_activities("h1", 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, "a2");
        assert_eq!(recent[1].id, "a3");
    }

    #[test]
    fn daily_quests_seed_once() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("engage-db3").to_str().unwrap()).unwrap();

        let first = store.list_active_daily_quests().unwrap();
        assert_eq!(first.len(), 3);
        let second = store.list_active_daily_quests().unwrap();
        assert_eq!(second.len(), 3);
        assert_eq!(first[0].id, second[0].id);
    }

    #[test]
    fn hero_daily_quest_is_per_date() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("engage-db4").to_str().unwrap()).unwrap();

        let d1 = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        let mut row = store.get_or_create_hero_daily_quest("h1", 1, d1).unwrap();
        row.current_progress = 1;
        row.is_completed = true;
        store.put_hero_daily_quest(&row).unwrap();

        let next_day = store.get_or_create_hero_daily_quest("h1", 1, d2).unwrap();
        assert_eq!(next_day.current_progress, 0);
        assert!(!next_day.is_completed);
    }
}
