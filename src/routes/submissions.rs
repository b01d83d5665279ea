use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthHero;
use crate::extractors::JsonBody;
use crate::game::progression::GradeApplicationResult;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::submissions::{Submission, SubmissionStatus};
use crate::store::StoreError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit).get(list_submissions))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub assignment_id: String,
    #[serde(default)]
    pub submission_text: Option<String>,
    #[serde(default)]
    pub submission_url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    submission: Submission,
    reward: Option<GradeApplicationResult>,
}

const MAX_SUBMISSION_TEXT: usize = 100_000;

/// Hand in an assignment. The submission row is committed before grading
/// runs, so a grader outage leaves it Pending for manual review instead of
/// losing the attempt. An approved verdict immediately pays the
/// grade-proportional reward.
pub(crate) async fn submit(
    State(state): State<AppState>,
    hero: AuthHero,
    JsonBody(req): JsonBody<SubmitRequest>,
) -> Result<Response, AppError> {
    let text = req
        .submission_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let url = req
        .submission_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());
    if text.is_none() && url.is_none() {
        return Err(AppError::bad_request(
            "SUBMISSION_EMPTY",
            "Provide submission text or a submission URL",
        ));
    }
    if text.is_some_and(|t| t.len() > MAX_SUBMISSION_TEXT) {
        return Err(AppError::bad_request(
            "SUBMISSION_TOO_LARGE",
            "Submission text is too long",
        ));
    }

    let assignment = state
        .store()
        .get_assignment(&req.assignment_id)?
        .ok_or_else(|| AppError::not_found("Assignment not found"))?;

    let mut submission = Submission {
        id: Uuid::new_v4().to_string(),
        assignment_id: assignment.id.clone(),
        hero_id: hero.hero_id.clone(),
        submission_text: text.map(str::to_string),
        submission_url: url.map(str::to_string),
        status: SubmissionStatus::Pending,
        feedback: None,
        grade_awarded: None,
        submitted_at: Utc::now(),
        graded_at: None,
    };

    match state.store().create_submission(&submission) {
        Ok(()) => {}
        Err(StoreError::Conflict { .. }) => {
            return Err(AppError::conflict(
                "SUBMISSION_EXISTS",
                "Assignment already submitted",
            ));
        }
        Err(e) => return Err(e.into()),
    }

    let verdict = state.grader().grade(&assignment, text, url).await;
    submission.status = verdict.status;
    submission.feedback = Some(verdict.feedback);
    if verdict.status != SubmissionStatus::Pending {
        submission.grade_awarded = Some(verdict.score);
        submission.graded_at = Some(Utc::now());
    }
    state.store().update_submission(&submission)?;

    let reward = if verdict.status == SubmissionStatus::Approved {
        Some(
            state
                .progression()
                .apply_grade(&hero.hero_id, &assignment.id, verdict.score)
                .await?,
        )
    } else {
        None
    };

    Ok(created(SubmitResponse { submission, reward }).into_response())
}

pub(crate) async fn list_submissions(
    State(state): State<AppState>,
    hero: AuthHero,
) -> Result<Response, AppError> {
    let rows = state.store().list_hero_submissions(&hero.hero_id)?;
    Ok(ok(rows).into_response())
}
