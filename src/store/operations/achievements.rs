use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    Quest,
    Combat,
    Social,
    Collection,
    Mastery,
}

/// Static achievement content. `requirement_value` is compared against the
/// aggregate stat matching `kind` (for Quest: completed quest count).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub kind: AchievementKind,
    pub requirement_value: u32,
    pub xp_reward: u32,
    pub gold_reward: u32,
    pub title_reward: Option<String>,
}

/// Append-only unlock row, unique per (hero, achievement).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedAchievement {
    pub hero_id: String,
    pub achievement_id: u32,
    pub unlocked_at: DateTime<Utc>,
}

impl Store {
    pub fn put_achievement(&self, achievement: &Achievement) -> Result<(), StoreError> {
        let bytes = Self::serialize(achievement)?;
        self.achievements
            .insert(keys::achievement_key(achievement.id).as_bytes(), bytes)?;
        Ok(())
    }

    /// All achievements in ascending id order. The evaluator depends on this
    /// ordering being deterministic (last-qualifying title wins).
    pub fn list_achievements(&self) -> Result<Vec<Achievement>, StoreError> {
        let mut achievements = Vec::new();
        for item in self.achievements.iter() {
            let (_, value) = item?;
            achievements.push(Self::deserialize::<Achievement>(&value)?);
        }
        Ok(achievements)
    }

    pub fn list_unlocked_achievement_ids(
        &self,
        hero_id: &str,
    ) -> Result<HashSet<u32>, StoreError> {
        let prefix = keys::unlocked_achievement_prefix(hero_id);
        let mut ids = HashSet::new();
        for item in self.unlocked_achievements.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            let row: UnlockedAchievement = Self::deserialize(&value)?;
            ids.insert(row.achievement_id);
        }
        Ok(ids)
    }

    pub fn list_unlocked_achievements(
        &self,
        hero_id: &str,
    ) -> Result<Vec<UnlockedAchievement>, StoreError> {
        let prefix = keys::unlocked_achievement_prefix(hero_id);
        let mut rows = Vec::new();
        for item in self.unlocked_achievements.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            rows.push(Self::deserialize::<UnlockedAchievement>(&value)?);
        }
        Ok(rows)
    }

    /// Insert-if-absent via compare-and-swap; a concurrent duplicate unlock
    /// surfaces as Conflict and the caller treats the row as already present.
    pub fn create_unlocked_achievement(
        &self,
        hero_id: &str,
        achievement_id: u32,
    ) -> Result<(), StoreError> {
        let key = keys::unlocked_achievement_key(hero_id, achievement_id);
        let row = UnlockedAchievement {
            hero_id: hero_id.to_string(),
            achievement_id,
            unlocked_at: Utc::now(),
        };
        let bytes = Self::serialize(&row)?;

        let cas_result = self
            .unlocked_achievements
            .compare_and_swap(key.as_bytes(), None::<&[u8]>, Some(bytes))
            .map_err(StoreError::Sled)?;

        if cas_result.is_err() {
            return Err(StoreError::Conflict {
                entity: "unlocked_achievement".to_string(),
                key,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn sample(id: u32, requirement: u32) -> Achievement {
        Achievement {
            id,
            name: format!("First Steps {id}"),
            description: "Complete quests".to_string(),
            kind: AchievementKind::Quest,
            requirement_value: requirement,
            xp_reward: 25,
            gold_reward: 10,
            title_reward: None,
        }
    }

    #[test]
    fn list_is_ordered_by_id() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("ach-db").to_str().unwrap()).unwrap();

        for id in [10, 2, 100, 1] {
            store.put_achievement(&sample(id, 1)).unwrap();
        }
        let all = store.list_achievements().unwrap();
        let ids: Vec<u32> = all.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 10, 100]);
    }

    #[test]
    fn unlock_is_once_only() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("ach-db2").to_str().unwrap()).unwrap();

        store.create_unlocked_achievement("h1", 1).unwrap();
        let err = store.create_unlocked_achievement("h1", 1).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let ids = store.list_unlocked_achievement_ids("h1").unwrap();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains(&1));
    }
}
