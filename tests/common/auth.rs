use axum::http::Method;
use axum::Router;

use super::http::{request, response_json};

/// Register a fresh hero and return (access_token, hero_id).
pub async fn register_and_get_token(app: &Router) -> (String, String) {
    let email = format!("hero-{}@test.com", uuid::Uuid::new_v4());
    let username = format!("hero-{}", uuid::Uuid::new_v4().simple());

    let response = request(
        app,
        Method::POST,
        "/api/auth/register",
        Some(serde_json::json!({
            "email": email,
            "username": username,
            "password": "Passw0rd!",
            "avatarClass": "Warrior",
        })),
        &[],
    )
    .await;

    let (status, _headers, body) = response_json(response).await;
    assert!(status.is_success(), "register failed: {body}");

    let token = body["data"]["accessToken"]
        .as_str()
        .expect("access token in register response")
        .to_string();
    let hero_id = body["data"]["hero"]["id"]
        .as_str()
        .expect("hero id in register response")
        .to_string();

    (token, hero_id)
}

pub fn auth_header(token: &str) -> String {
    format!("Bearer {token}")
}
