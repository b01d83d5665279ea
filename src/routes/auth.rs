use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{
    dummy_argon2_hash, extract_token_from_headers, hash_password, hash_token, sign_jwt_for_hero,
    verify_password, AuthHero,
};
use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::heroes::Hero;
use crate::store::operations::sessions::Session;
use crate::validation::{is_valid_class, is_valid_email, validate_password, validate_username};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub avatar_class: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HeroProfile {
    pub id: String,
    pub email: String,
    pub username: String,
    pub level: u32,
    pub current_xp: u32,
    pub hp_current: u32,
    pub hp_max: u32,
    pub gold: u32,
    pub avatar_class: String,
    pub title: String,
}

impl From<&Hero> for HeroProfile {
    fn from(value: &Hero) -> Self {
        Self {
            id: value.id.clone(),
            email: value.email.clone(),
            username: value.username.clone(),
            level: value.level,
            current_xp: value.current_xp,
            hp_current: value.hp_current,
            hp_max: value.hp_max,
            gold: value.gold,
            avatar_class: value.avatar_class.clone(),
            title: value.title.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub hero: HeroProfile,
}

/// Sign an access token and persist its session row.
fn issue_token(hero_id: &str, state: &AppState) -> Result<String, AppError> {
    let token = sign_jwt_for_hero(
        hero_id,
        &state.config().jwt_secret,
        state.config().jwt_expires_in_hours,
    )?;

    state.store().create_session(&Session {
        token_hash: hash_token(&token),
        hero_id: hero_id.to_string(),
        created_at: Utc::now(),
        expires_at: Utc::now() + Duration::hours(state.config().jwt_expires_in_hours as i64),
    })?;

    Ok(token)
}

async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<Response, AppError> {
    let email = req.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::bad_request(
            "AUTH_INVALID_EMAIL",
            "Invalid email format",
        ));
    }
    let username = req.username.trim();
    if let Err(msg) = validate_username(username) {
        return Err(AppError::bad_request("AUTH_INVALID_USERNAME", msg));
    }
    if let Err(msg) = validate_password(&req.password) {
        return Err(AppError::bad_request("AUTH_WEAK_PASSWORD", msg));
    }
    let avatar_class = req.avatar_class.as_deref().unwrap_or("Novice");
    if !is_valid_class(avatar_class) {
        return Err(AppError::bad_request(
            "AUTH_INVALID_CLASS",
            "Unknown hero class",
        ));
    }

    if state.store().get_hero_by_email(&email)?.is_some() {
        return Err(AppError::conflict(
            "AUTH_EMAIL_EXISTS",
            "Email already registered",
        ));
    }

    let hero = Hero::new_registered(
        Uuid::new_v4().to_string(),
        email,
        username.to_string(),
        hash_password(&req.password)?,
        avatar_class.to_string(),
        &state.config().game,
    );
    state.store().create_hero(&hero)?;

    let access_token = issue_token(&hero.id, &state)?;
    tracing::info!(hero_id = %hero.id, "Hero registered");

    Ok(created(AuthResponse {
        access_token,
        hero: HeroProfile::from(&hero),
    })
    .into_response())
}

async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Response, AppError> {
    let email = req.email.trim().to_lowercase();
    let hero = state.store().get_hero_by_email(&email)?;

    // Verify against a dummy hash when the account is unknown, so timing
    // does not reveal which emails exist.
    let hash = hero
        .as_ref()
        .map(|h| h.password_hash.clone())
        .unwrap_or_else(dummy_argon2_hash);
    let password_ok = verify_password(&req.password, &hash)?;

    let Some(hero) = hero.filter(|_| password_ok) else {
        return Err(AppError::unauthorized("Invalid email or password"));
    };

    let access_token = issue_token(&hero.id, &state)?;
    tracing::info!(hero_id = %hero.id, "Hero logged in");

    Ok(ok(AuthResponse {
        access_token,
        hero: HeroProfile::from(&hero),
    })
    .into_response())
}

async fn logout(
    State(state): State<AppState>,
    _hero: AuthHero,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let token = extract_token_from_headers(&headers)?;
    state.store().delete_session(&hash_token(&token))?;
    Ok(ok(serde_json::json!({ "loggedOut": true })).into_response())
}
