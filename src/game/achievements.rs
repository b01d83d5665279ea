use crate::game::ledger::RewardLedger;
use crate::store::operations::achievements::{Achievement, AchievementKind};
use crate::store::operations::heroes::Hero;
use crate::store::{Store, StoreError};

/// Scans locked achievements against the hero's current aggregates and
/// unlocks every one whose requirement is met.
pub struct AchievementEvaluator<'a> {
    store: &'a Store,
    ledger: &'a RewardLedger,
}

impl<'a> AchievementEvaluator<'a> {
    pub fn new(store: &'a Store, ledger: &'a RewardLedger) -> Self {
        Self { store, ledger }
    }

    /// Unlock every qualifying achievement and apply its rewards to the hero
    /// in memory. The caller persists the hero afterwards; unlock rows are
    /// written here so a crash can at worst lose rewards, never duplicate an
    /// unlock.
    ///
    /// Candidates are walked in ascending id order, so when several titles
    /// unlock in one pass the highest-id one wins the display title.
    ///
    /// Achievement XP runs through the same leveling loop as every other XP
    /// grant, so a large reward can level the hero up here too.
    pub fn check_and_award(&self, hero: &mut Hero) -> Result<Vec<Achievement>, StoreError> {
        let unlocked = self.store.list_unlocked_achievement_ids(&hero.id)?;
        let completed_quests = self.store.count_completed_quests(&hero.id)?;

        let mut newly_unlocked = Vec::new();
        for achievement in self.store.list_achievements()? {
            if unlocked.contains(&achievement.id) {
                continue;
            }
            let aggregate = match achievement.kind {
                AchievementKind::Quest => completed_quests,
                // No aggregates tracked for the other kinds yet; they are
                // unlockable only through future stat plumbing.
                _ => continue,
            };
            if aggregate < u64::from(achievement.requirement_value) {
                continue;
            }

            match self
                .store
                .create_unlocked_achievement(&hero.id, achievement.id)
            {
                Ok(()) => {}
                // A concurrent evaluation got there first; rewards were
                // already paid on that path.
                Err(StoreError::Conflict { .. }) => continue,
                Err(e) => return Err(e),
            }

            self.ledger.award_xp(hero, achievement.xp_reward);
            self.ledger.award_gold(hero, achievement.gold_reward);
            if let Some(title) = &achievement.title_reward {
                hero.title = title.clone();
            }
            newly_unlocked.push(achievement);
        }

        Ok(newly_unlocked)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::config::GameConfig;
    use crate::store::operations::progress::QuestProgress;

    use super::*;

    fn setup() -> (tempfile::TempDir, Store, RewardLedger, Hero) {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        let ledger = RewardLedger::new(GameConfig::default());
        let hero = Hero::new_registered(
            "h1".to_string(),
            "h1@test.com".to_string(),
            "demo".to_string(),
            "hash".to_string(),
            "Novice".to_string(),
            &GameConfig::default(),
        );
        store.create_hero(&hero).unwrap();
        (dir, store, ledger, hero)
    }

    fn achievement(id: u32, requirement: u32, xp: u32, title: Option<&str>) -> Achievement {
        Achievement {
            id,
            name: format!("ach-{id}"),
            description: String::new(),
            kind: AchievementKind::Quest,
            requirement_value: requirement,
            xp_reward: xp,
            gold_reward: 10,
            title_reward: title.map(str::to_string),
        }
    }

    fn complete_quests(store: &Store, hero_id: &str, count: u32) {
        for i in 0..count {
            let mut progress = QuestProgress::fresh(hero_id, &format!("q{i}"));
            progress.is_completed = true;
            store.put_quest_progress(&progress).unwrap();
        }
    }

    #[test]
    fn unlocks_only_qualifying_achievements() {
        let (_dir, store, ledger, mut hero) = setup();
        store.put_achievement(&achievement(1, 1, 25, None)).unwrap();
        store.put_achievement(&achievement(2, 10, 100, None)).unwrap();
        complete_quests(&store, "h1", 2);

        let evaluator = AchievementEvaluator::new(&store, &ledger);
        let unlocked = evaluator.check_and_award(&mut hero).unwrap();

        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].id, 1);
        assert_eq!(hero.current_xp, 25);
        assert_eq!(hero.gold, 10);
    }

    #[test]
    fn second_pass_does_not_repay() {
        let (_dir, store, ledger, mut hero) = setup();
        store.put_achievement(&achievement(1, 1, 25, None)).unwrap();
        complete_quests(&store, "h1", 1);

        let evaluator = AchievementEvaluator::new(&store, &ledger);
        assert_eq!(evaluator.check_and_award(&mut hero).unwrap().len(), 1);
        assert_eq!(evaluator.check_and_award(&mut hero).unwrap().len(), 0);
        assert_eq!(hero.gold, 10);
    }

    #[test]
    fn last_qualifying_title_wins() {
        let (_dir, store, ledger, mut hero) = setup();
        store
            .put_achievement(&achievement(1, 1, 0, Some("Rookie")))
            .unwrap();
        store
            .put_achievement(&achievement(2, 2, 0, Some("Adventurer")))
            .unwrap();
        complete_quests(&store, "h1", 3);

        let evaluator = AchievementEvaluator::new(&store, &ledger);
        let unlocked = evaluator.check_and_award(&mut hero).unwrap();
        assert_eq!(unlocked.len(), 2);
        assert_eq!(hero.title, "Adventurer");
    }

    #[test]
    fn reward_xp_can_level_up() {
        let (_dir, store, ledger, mut hero) = setup();
        store.put_achievement(&achievement(1, 1, 150, None)).unwrap();
        complete_quests(&store, "h1", 1);

        let evaluator = AchievementEvaluator::new(&store, &ledger);
        evaluator.check_and_award(&mut hero).unwrap();
        assert_eq!(hero.level, 2);
        assert_eq!(hero.current_xp, 50);
        assert_eq!(hero.hp_current, hero.hp_max);
    }
}
