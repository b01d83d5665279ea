use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;

use crate::auth::AuthHero;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::store::operations::content::Quest;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quests))
        .route("/:quest_id/complete", post(complete_quest))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuestWithProgress {
    #[serde(flatten)]
    quest: Quest,
    is_completed: bool,
    score: u32,
    attempts: u32,
}

/// All quests, annotated with the caller's progress on each.
pub(crate) async fn list_quests(State(state): State<AppState>, hero: AuthHero) -> Result<Response, AppError> {
    let quests = state.store().list_quests()?;
    let mut rows = Vec::with_capacity(quests.len());
    for quest in quests {
        let progress = state.store().get_quest_progress(&hero.hero_id, &quest.id)?;
        let (is_completed, score, attempts) = progress
            .map(|p| (p.is_completed, p.score, p.attempts))
            .unwrap_or((false, 0, 0));
        rows.push(QuestWithProgress {
            quest,
            is_completed,
            score,
            attempts,
        });
    }
    Ok(ok(rows).into_response())
}

async fn complete_quest(
    State(state): State<AppState>,
    hero: AuthHero,
    Path(quest_id): Path<String>,
) -> Result<Response, AppError> {
    let result = state
        .progression()
        .complete_quest(&hero.hero_id, &quest_id)
        .await?;
    Ok(ok(result).into_response())
}
