use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

/// One row per (hero, quest). Created on first interaction, never deleted.
/// For battle quests `score` is overloaded as the cumulative damage percent
/// dealt to the guarding monster (0–100, non-decreasing until defeat).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestProgress {
    pub hero_id: String,
    pub quest_id: String,
    pub is_completed: bool,
    pub score: u32,
    pub attempts: u32,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuestProgress {
    pub fn fresh(hero_id: &str, quest_id: &str) -> Self {
        let now = Utc::now();
        Self {
            hero_id: hero_id.to_string(),
            quest_id: quest_id.to_string(),
            is_completed: false,
            score: 0,
            attempts: 0,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Store {
    pub fn get_quest_progress(
        &self,
        hero_id: &str,
        quest_id: &str,
    ) -> Result<Option<QuestProgress>, StoreError> {
        let key = keys::quest_progress_key(hero_id, quest_id);
        match self.quest_progress.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn put_quest_progress(&self, progress: &QuestProgress) -> Result<(), StoreError> {
        let mut updated = progress.clone();
        updated.updated_at = Utc::now();
        let key = keys::quest_progress_key(&progress.hero_id, &progress.quest_id);
        let bytes = Self::serialize(&updated)?;
        self.quest_progress.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    pub fn get_or_create_quest_progress(
        &self,
        hero_id: &str,
        quest_id: &str,
    ) -> Result<QuestProgress, StoreError> {
        if let Some(existing) = self.get_quest_progress(hero_id, quest_id)? {
            return Ok(existing);
        }
        let fresh = QuestProgress::fresh(hero_id, quest_id);
        self.put_quest_progress(&fresh)?;
        Ok(fresh)
    }

    /// Aggregate feeding quest-type achievement checks.
    pub fn count_completed_quests(&self, hero_id: &str) -> Result<u64, StoreError> {
        let prefix = keys::quest_progress_prefix(hero_id);
        let mut count = 0;
        for item in self.quest_progress.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            let progress: QuestProgress = Self::deserialize(&value)?;
            if progress.is_completed {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn list_quest_progress(&self, hero_id: &str) -> Result<Vec<QuestProgress>, StoreError> {
        let prefix = keys::quest_progress_prefix(hero_id);
        let mut rows = Vec::new();
        for item in self.quest_progress.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            rows.push(Self::deserialize::<QuestProgress>(&value)?);
        }
        Ok(rows)
    }
}
