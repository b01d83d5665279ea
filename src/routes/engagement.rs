use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthHero;
use crate::game::weekly::WeeklyGoalTracker;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::store::operations::engagement::{Activity, DailyQuest, StreakRecord, WeeklyGoal};
use crate::store::StoreError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/activities", get(activities))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WeeklyGoalView {
    #[serde(flatten)]
    goal: WeeklyGoal,
    xp_percent: u32,
    quests_percent: u32,
    battles_percent: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DailyQuestView {
    #[serde(flatten)]
    template: DailyQuest,
    current_progress: u32,
    is_completed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Dashboard {
    streak: StreakRecord,
    weekly_goal: WeeklyGoalView,
    daily_quests: Vec<DailyQuestView>,
    recent_activities: Vec<Activity>,
    battle_ready: bool,
}

/// Streak, weekly goal, daily quests and the latest feed entries in one
/// call. All engagement state is lazily created here if the hero has none
/// yet; there is no background rollover job.
async fn dashboard(State(state): State<AppState>, hero: AuthHero) -> Result<Response, AppError> {
    let today = Utc::now().date_naive();
    Ok(ok(build_dashboard(&state, &hero.hero_id, today)?).into_response())
}

fn build_dashboard(
    state: &AppState,
    hero_id: &str,
    today: NaiveDate,
) -> Result<Dashboard, AppError> {
    let store = state.store();
    let hero = store
        .get_hero_by_id(hero_id)?
        .ok_or_else(|| StoreError::NotFound {
            entity: "hero".to_string(),
            key: hero_id.to_string(),
        })?;
    let streak = store.get_or_create_streak(hero_id)?;

    let week_start = WeeklyGoalTracker::week_start(today);
    let goal = store.get_or_create_weekly_goal(hero_id, week_start, &state.config().game)?;
    let weekly_goal = WeeklyGoalView {
        xp_percent: WeeklyGoalTracker::percent_complete(goal.xp_earned, goal.xp_target),
        quests_percent: WeeklyGoalTracker::percent_complete(
            goal.quests_completed,
            goal.quests_target,
        ),
        battles_percent: WeeklyGoalTracker::percent_complete(goal.battles_won, goal.battles_target),
        goal,
    };

    let mut daily_quests = Vec::new();
    for template in store.list_active_daily_quests()? {
        let row = store.get_or_create_hero_daily_quest(hero_id, template.id, today)?;
        daily_quests.push(DailyQuestView {
            template,
            current_progress: row.current_progress,
            is_completed: row.is_completed,
        });
    }

    let recent_activities = store.list_recent_activities(hero_id, 10)?;

    // Ready to fight at half HP or better
    let battle_ready = hero.hp_current * 2 >= hero.hp_max;

    Ok(Dashboard {
        streak,
        weekly_goal,
        daily_quests,
        recent_activities,
        battle_ready,
    })
}

#[derive(Deserialize)]
struct ActivitiesQuery {
    limit: Option<usize>,
}

const MAX_ACTIVITY_PAGE: usize = 100;

async fn activities(
    State(state): State<AppState>,
    hero: AuthHero,
    Query(query): Query<ActivitiesQuery>,
) -> Result<Response, AppError> {
    let limit = query.limit.unwrap_or(20).min(MAX_ACTIVITY_PAGE);
    let rows = state.store().list_recent_activities(&hero.hero_id, limit)?;
    Ok(ok(rows).into_response())
}
