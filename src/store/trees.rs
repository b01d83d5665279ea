pub const HEROES: &str = "heroes";
pub const SESSIONS: &str = "sessions";

// Content trees (read-mostly value objects)
pub const QUESTS: &str = "quests";
pub const MONSTERS: &str = "monsters";
pub const QUIZ_QUESTIONS: &str = "quiz_questions";
pub const ASSIGNMENTS: &str = "assignments";
pub const ACHIEVEMENTS: &str = "achievements";
pub const DAILY_QUESTS: &str = "daily_quests";

// Per-hero mutable state
pub const QUEST_PROGRESS: &str = "quest_progress";
pub const STREAKS: &str = "streaks";
pub const WEEKLY_GOALS: &str = "weekly_goals";
pub const UNLOCKED_ACHIEVEMENTS: &str = "unlocked_achievements";
pub const HERO_DAILY_QUESTS: &str = "hero_daily_quests";
pub const ACTIVITIES: &str = "activities";
pub const SUBMISSIONS: &str = "submissions";

pub const META: &str = "meta";
