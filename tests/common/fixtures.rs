use chrono::Utc;

use academy_backend::store::operations::content::{
    Assignment, Monster, Quest, QuestKind, QuizQuestion,
};
use academy_backend::store::Store;

pub fn seed_lesson(store: &Store, id: &str, title: &str) -> Quest {
    let quest = Quest {
        id: id.to_string(),
        title: title.to_string(),
        description: format!("Lesson: {title}"),
        kind: QuestKind::Lesson,
        xp_reward: 100,
        gold_reward: 25,
        created_at: Utc::now(),
    };
    store.put_quest(&quest).expect("seed quest");
    quest
}

/// A battle quest with one guarding monster and one question. The correct
/// answer is always "4".
pub fn seed_battle(store: &Store, quest_id: &str, entry_cost: u32, fail_penalty: u32) {
    store
        .put_quest(&Quest {
            id: quest_id.to_string(),
            title: "Boss Fight".to_string(),
            description: String::new(),
            kind: QuestKind::Battle,
            xp_reward: 100,
            gold_reward: 25,
            created_at: Utc::now(),
        })
        .expect("seed battle quest");
    store
        .put_monster(&Monster {
            id: format!("{quest_id}-monster"),
            quest_id: quest_id.to_string(),
            name: "Stack Overflow".to_string(),
            description: String::new(),
            hp: 100,
            damage_per_wrong_answer: 10,
            entry_cost,
            pass_reward: 30,
            fail_penalty,
        })
        .expect("seed monster");
    store
        .put_question(&QuizQuestion {
            id: format!("{quest_id}-question"),
            monster_id: format!("{quest_id}-monster"),
            question_text: "2 + 2?".to_string(),
            correct_answer: "4".to_string(),
            wrong_options: vec!["3".to_string(), "5".to_string()],
        })
        .expect("seed question");
}

pub fn seed_assignment(store: &Store, id: &str, quest_id: &str) -> Assignment {
    let assignment = Assignment {
        id: id.to_string(),
        quest_id: quest_id.to_string(),
        title: "Ownership Essay".to_string(),
        description: "Explain move semantics".to_string(),
        max_score: 100,
        xp_reward: 200,
        gold_reward: 50,
    };
    store.put_assignment(&assignment).expect("seed assignment");
    assignment
}

/// Put a hero's gold at an exact value, bypassing the ledger.
pub fn set_hero_gold(store: &Store, hero_id: &str, gold: u32) {
    let mut hero = store
        .get_hero_by_id(hero_id)
        .expect("load hero")
        .expect("hero exists");
    hero.gold = gold;
    store.save_hero(&hero).expect("save hero");
}

/// Put a hero's current HP at an exact value, bypassing the ledger.
pub fn set_hero_hp(store: &Store, hero_id: &str, hp: u32) {
    let mut hero = store
        .get_hero_by_id(hero_id)
        .expect("load hero")
        .expect("hero exists");
    hero.hp_current = hp.min(hero.hp_max);
    store.save_hero(&hero).expect("save hero");
}
