use chrono::NaiveDate;

pub fn hero_key(hero_id: &str) -> String {
    hero_id.to_string()
}

pub fn hero_email_index_key(email: &str) -> String {
    format!("email:{}", email.to_lowercase())
}

pub fn session_key(token_hash: &str) -> String {
    token_hash.to_string()
}

pub fn quest_key(quest_id: &str) -> String {
    quest_id.to_string()
}

pub fn monster_key(monster_id: &str) -> String {
    monster_id.to_string()
}

pub fn monster_quest_index_key(quest_id: &str) -> String {
    format!("quest:{}", quest_id)
}

pub fn question_key(question_id: &str) -> String {
    question_id.to_string()
}

pub fn assignment_key(assignment_id: &str) -> String {
    assignment_id.to_string()
}

/// Zero-padded numeric id so a prefix scan yields ascending id order.
/// AchievementEvaluator relies on this for deterministic iteration.
pub fn achievement_key(achievement_id: u32) -> String {
    format!("{:06}", achievement_id)
}

pub fn daily_quest_key(daily_quest_id: u32) -> String {
    format!("{:06}", daily_quest_id)
}

pub fn quest_progress_key(hero_id: &str, quest_id: &str) -> String {
    format!("{}:{}", hero_id, quest_id)
}

pub fn quest_progress_prefix(hero_id: &str) -> String {
    format!("{}:", hero_id)
}

pub fn streak_key(hero_id: &str) -> String {
    hero_id.to_string()
}

pub fn weekly_goal_key(hero_id: &str, week_start: NaiveDate) -> String {
    format!("{}:{}", hero_id, week_start.format("%Y-%m-%d"))
}

pub fn unlocked_achievement_key(hero_id: &str, achievement_id: u32) -> String {
    format!("{}:{:06}", hero_id, achievement_id)
}

pub fn unlocked_achievement_prefix(hero_id: &str) -> String {
    format!("{}:", hero_id)
}

pub fn hero_daily_quest_key(hero_id: &str, date: NaiveDate, daily_quest_id: u32) -> String {
    format!("{}:{}:{:06}", hero_id, date.format("%Y-%m-%d"), daily_quest_id)
}

pub fn hero_daily_quest_prefix(hero_id: &str, date: NaiveDate) -> String {
    format!("{}:{}:", hero_id, date.format("%Y-%m-%d"))
}

/// Reverse-timestamp key so a prefix scan returns newest activities first.
pub fn activity_key(hero_id: &str, timestamp_ms: i64, activity_id: &str) -> String {
    let ts = timestamp_ms.max(0) as u64;
    let reverse_ts = u64::MAX - ts;
    format!("{}:{:020}:{}", hero_id, reverse_ts, activity_id)
}

pub fn activity_prefix(hero_id: &str) -> String {
    format!("{}:", hero_id)
}

pub fn submission_key(submission_id: &str) -> String {
    submission_id.to_string()
}

/// Uniqueness index: one submission per (hero, assignment).
pub fn submission_index_key(hero_id: &str, assignment_id: &str) -> String {
    format!("idx:{}:{}", hero_id, assignment_id)
}

pub fn submission_index_prefix(hero_id: &str) -> String {
    format!("idx:{}:", hero_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_key_orders_by_time_desc() {
        let k_new = activity_key("h1", 2000, "a2");
        let k_old = activity_key("h1", 1000, "a1");
        assert!(k_new < k_old);
    }

    #[test]
    fn achievement_key_orders_by_id_asc() {
        assert!(achievement_key(2) < achievement_key(10));
        assert!(achievement_key(10) < achievement_key(100));
    }

    #[test]
    fn email_index_is_normalized() {
        assert_eq!(hero_email_index_key("A@Ex.com"), "email:a@ex.com");
    }

    #[test]
    fn weekly_goal_key_embeds_week_start() {
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(weekly_goal_key("h1", monday), "h1:2024-03-04");
    }
}
