use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

/// Content records are authored outside the progression core (seed scripts,
/// tests). The core only ever reads them as resolved value objects.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestKind {
    Lesson,
    Battle,
    Assignment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub kind: QuestKind,
    pub xp_reward: u32,
    pub gold_reward: u32,
    pub created_at: DateTime<Utc>,
}

/// A monster guards exactly one quest. Immutable during a battle; the fight
/// state lives in the hero's QuestProgress record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monster {
    pub id: String,
    pub quest_id: String,
    pub name: String,
    pub description: String,
    pub hp: u32,
    pub damage_per_wrong_answer: u32,
    pub entry_cost: u32,
    pub pass_reward: u32,
    pub fail_penalty: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub monster_id: String,
    pub question_text: String,
    pub correct_answer: String,
    pub wrong_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub quest_id: String,
    pub title: String,
    pub description: String,
    pub max_score: u32,
    pub xp_reward: u32,
    pub gold_reward: u32,
}

/// Everything needed to resolve one battle answer, loaded in one step.
#[derive(Debug, Clone)]
pub struct BattleContext {
    pub question: QuizQuestion,
    pub monster: Monster,
    pub quest: Quest,
}

impl Store {
    pub fn put_quest(&self, quest: &Quest) -> Result<(), StoreError> {
        let bytes = Self::serialize(quest)?;
        self.quests
            .insert(keys::quest_key(&quest.id).as_bytes(), bytes)?;
        Ok(())
    }

    pub fn get_quest(&self, quest_id: &str) -> Result<Option<Quest>, StoreError> {
        match self.quests.get(keys::quest_key(quest_id).as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn list_quests(&self) -> Result<Vec<Quest>, StoreError> {
        let mut quests = Vec::new();
        for item in self.quests.iter() {
            let (_, value) = item?;
            quests.push(Self::deserialize::<Quest>(&value)?);
        }
        quests.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(quests)
    }

    pub fn put_monster(&self, monster: &Monster) -> Result<(), StoreError> {
        let bytes = Self::serialize(monster)?;
        self.monsters
            .insert(keys::monster_key(&monster.id).as_bytes(), bytes)?;
        // Secondary index: quest -> monster
        self.monsters.insert(
            keys::monster_quest_index_key(&monster.quest_id).as_bytes(),
            monster.id.as_bytes(),
        )?;
        Ok(())
    }

    pub fn get_monster(&self, monster_id: &str) -> Result<Option<Monster>, StoreError> {
        match self.monsters.get(keys::monster_key(monster_id).as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn get_monster_for_quest(&self, quest_id: &str) -> Result<Option<Monster>, StoreError> {
        let Some(raw_id) = self
            .monsters
            .get(keys::monster_quest_index_key(quest_id).as_bytes())?
        else {
            return Ok(None);
        };
        let monster_id = String::from_utf8_lossy(&raw_id).to_string();
        self.get_monster(&monster_id)
    }

    pub fn put_question(&self, question: &QuizQuestion) -> Result<(), StoreError> {
        let bytes = Self::serialize(question)?;
        self.quiz_questions
            .insert(keys::question_key(&question.id).as_bytes(), bytes)?;
        Ok(())
    }

    pub fn get_question(&self, question_id: &str) -> Result<Option<QuizQuestion>, StoreError> {
        match self
            .quiz_questions
            .get(keys::question_key(question_id).as_bytes())?
        {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Resolve question -> monster -> quest for one battle submission.
    /// A dangling reference in either hop is a NotFound domain error.
    pub fn get_battle_context(&self, question_id: &str) -> Result<BattleContext, StoreError> {
        let question =
            self.get_question(question_id)?
                .ok_or_else(|| StoreError::NotFound {
                    entity: "question".to_string(),
                    key: question_id.to_string(),
                })?;
        let monster =
            self.get_monster(&question.monster_id)?
                .ok_or_else(|| StoreError::NotFound {
                    entity: "monster".to_string(),
                    key: question.monster_id.clone(),
                })?;
        let quest = self
            .get_quest(&monster.quest_id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "quest".to_string(),
                key: monster.quest_id.clone(),
            })?;
        Ok(BattleContext {
            question,
            monster,
            quest,
        })
    }

    pub fn put_assignment(&self, assignment: &Assignment) -> Result<(), StoreError> {
        let bytes = Self::serialize(assignment)?;
        self.assignments
            .insert(keys::assignment_key(&assignment.id).as_bytes(), bytes)?;
        Ok(())
    }

    pub fn get_assignment(&self, assignment_id: &str) -> Result<Option<Assignment>, StoreError> {
        match self
            .assignments
            .get(keys::assignment_key(assignment_id).as_bytes())?
        {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    pub(crate) fn sample_quest(id: &str, kind: QuestKind) -> Quest {
        Quest {
            id: id.to_string(),
            title: "Loops of Doom".to_string(),
            description: "Defeat the while loop".to_string(),
            kind,
            xp_reward: 100,
            gold_reward: 25,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn battle_context_resolves_all_hops() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("content-db").to_str().unwrap()).unwrap();

        store
            .put_quest(&sample_quest("q1", QuestKind::Battle))
            .unwrap();
        store
            .put_monster(&Monster {
                id: "m1".to_string(),
                quest_id: "q1".to_string(),
                name: "Null Pointer".to_string(),
                description: String::new(),
                hp: 100,
                damage_per_wrong_answer: 10,
                entry_cost: 0,
                pass_reward: 30,
                fail_penalty: 5,
            })
            .unwrap();
        store
            .put_question(&QuizQuestion {
                id: "qq1".to_string(),
                monster_id: "m1".to_string(),
                question_text: "2 + 2?".to_string(),
                correct_answer: "4".to_string(),
                wrong_options: vec!["3".to_string(), "5".to_string()],
            })
            .unwrap();

        let ctx = store.get_battle_context("qq1").unwrap();
        assert_eq!(ctx.monster.name, "Null Pointer");
        assert_eq!(ctx.quest.id, "q1");
    }

    #[test]
    fn missing_question_is_not_found() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("content-db2").to_str().unwrap()).unwrap();

        let err = store.get_battle_context("ghost").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn monster_quest_index_resolves() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("content-db3").to_str().unwrap()).unwrap();

        store
            .put_quest(&sample_quest("q1", QuestKind::Battle))
            .unwrap();
        store
            .put_monster(&Monster {
                id: "m1".to_string(),
                quest_id: "q1".to_string(),
                name: "Segfault".to_string(),
                description: String::new(),
                hp: 100,
                damage_per_wrong_answer: 10,
                entry_cost: 10,
                pass_reward: 30,
                fail_penalty: 5,
            })
            .unwrap();

        let monster = store.get_monster_for_quest("q1").unwrap().unwrap();
        assert_eq!(monster.id, "m1");
        assert!(store.get_monster_for_quest("q2").unwrap().is_none());
    }
}
