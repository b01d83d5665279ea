use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::auth::AuthHero;
use crate::response::{ok, AppError};
use crate::routes::auth::HeroProfile;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

async fn me(State(state): State<AppState>, hero: AuthHero) -> Result<Response, AppError> {
    let record = state
        .store()
        .get_hero_by_id(&hero.hero_id)?
        .ok_or_else(|| AppError::not_found("Hero not found"))?;
    Ok(ok(HeroProfile::from(&record)).into_response())
}
