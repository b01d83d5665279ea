use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::auth::AuthHero;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::store::operations::achievements::Achievement;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_achievements))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AchievementView {
    #[serde(flatten)]
    achievement: Achievement,
    unlocked: bool,
}

/// Every achievement, flagged with whether the caller has unlocked it.
pub(crate) async fn list_achievements(
    State(state): State<AppState>,
    hero: AuthHero,
) -> Result<Response, AppError> {
    let unlocked = state.store().list_unlocked_achievement_ids(&hero.hero_id)?;
    let rows: Vec<AchievementView> = state
        .store()
        .list_achievements()?
        .into_iter()
        .map(|achievement| AchievementView {
            unlocked: unlocked.contains(&achievement.id),
            achievement,
        })
        .collect();
    Ok(ok(rows).into_response())
}
