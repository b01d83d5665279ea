pub mod achievements;
pub mod auth;
pub mod battle;
pub mod engagement;
pub mod health;
pub mod heroes;
pub mod quests;
pub mod submissions;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::middleware::request_id;
use crate::state::AppState;

/// Maximum request body size: 1 MiB. Submission text is the largest payload.
const MAX_BODY_SIZE: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/auth", auth::router())
        .nest("/heroes", heroes::router())
        .nest("/quests", quests::router())
        .nest("/battle", battle::router())
        .nest("/engagement", engagement::router())
        .nest("/submissions", submissions::router())
        .nest("/achievements", achievements::router())
        // `nest` does not match the bare prefix with a trailing slash
        // (`/quests/` etc.), so alias those collection URLs explicitly.
        .route("/quests/", get(quests::list_quests))
        .route(
            "/submissions/",
            post(submissions::submit).get(submissions::list_submissions),
        )
        .route("/achievements/", get(achievements::list_achievements))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health::router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}
