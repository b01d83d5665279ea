pub mod keys;
pub mod migrate;
pub mod operations;
pub mod trees;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use thiserror::Error;

#[derive(Debug)]
pub struct Store {
    db: Db,
    pub heroes: sled::Tree,
    pub sessions: sled::Tree,
    pub quests: sled::Tree,
    pub monsters: sled::Tree,
    pub quiz_questions: sled::Tree,
    pub assignments: sled::Tree,
    pub achievements: sled::Tree,
    pub daily_quests: sled::Tree,
    pub quest_progress: sled::Tree,
    pub streaks: sled::Tree,
    pub weekly_goals: sled::Tree,
    pub unlocked_achievements: sled::Tree,
    pub hero_daily_quests: sled::Tree,
    pub activities: sled::Tree,
    pub submissions: sled::Tree,
    pub meta: sled::Tree,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
    #[error("conflict: entity={entity}, key={key}")]
    Conflict { entity: String, key: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("migration error at version {version}: {message}")]
    Migration { version: u32, message: String },
}

impl Store {
    pub fn open(sled_path: &str) -> Result<Self, StoreError> {
        let db = sled::open(sled_path)?;
        let heroes = db.open_tree(trees::HEROES)?;
        let sessions = db.open_tree(trees::SESSIONS)?;
        let quests = db.open_tree(trees::QUESTS)?;
        let monsters = db.open_tree(trees::MONSTERS)?;
        let quiz_questions = db.open_tree(trees::QUIZ_QUESTIONS)?;
        let assignments = db.open_tree(trees::ASSIGNMENTS)?;
        let achievements = db.open_tree(trees::ACHIEVEMENTS)?;
        let daily_quests = db.open_tree(trees::DAILY_QUESTS)?;
        let quest_progress = db.open_tree(trees::QUEST_PROGRESS)?;
        let streaks = db.open_tree(trees::STREAKS)?;
        let weekly_goals = db.open_tree(trees::WEEKLY_GOALS)?;
        let unlocked_achievements = db.open_tree(trees::UNLOCKED_ACHIEVEMENTS)?;
        let hero_daily_quests = db.open_tree(trees::HERO_DAILY_QUESTS)?;
        let activities = db.open_tree(trees::ACTIVITIES)?;
        let submissions = db.open_tree(trees::SUBMISSIONS)?;
        let meta = db.open_tree(trees::META)?;

        Ok(Self {
            db,
            heroes,
            sessions,
            quests,
            monsters,
            quiz_questions,
            assignments,
            achievements,
            daily_quests,
            quest_progress,
            streaks,
            weekly_goals,
            unlocked_achievements,
            hero_daily_quests,
            activities,
            submissions,
            meta,
        })
    }

    pub fn run_migrations(&self) -> Result<(), StoreError> {
        migrate::run(self)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub fn raw_db(&self) -> &Db {
        &self.db
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
