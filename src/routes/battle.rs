use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use serde::Deserialize;

use crate::auth::AuthHero;
use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/answer", post(submit_answer))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub question_id: String,
    pub answer: String,
}

/// One quiz-answer submission. Business-rule refusals (cannot afford entry,
/// monster already defeated, hero at zero HP) come back as 200s with an
/// outcome field.
async fn submit_answer(
    State(state): State<AppState>,
    hero: AuthHero,
    JsonBody(req): JsonBody<AnswerRequest>,
) -> Result<Response, AppError> {
    if req.answer.is_empty() {
        return Err(AppError::bad_request(
            "BATTLE_EMPTY_ANSWER",
            "Answer must not be empty",
        ));
    }

    let result = state
        .progression()
        .submit_battle_answer(&hero.hero_id, &req.question_id, &req.answer)
        .await?;
    Ok(ok(result).into_response())
}
