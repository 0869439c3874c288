//! Access gate. A single shared password (`APP_PASSWORD`) unlocks the API,
//! presented either as HTTP Basic credentials or as the login cookie.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::errors::{AppError, AppJson};
use crate::state::AppState;

pub const AUTH_COOKIE: &str = "postgen_auth";
const COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 30;
const REALM: &str = "Basic realm=\"PostGen\"";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// Middleware for every protected route.
pub async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if is_authorized(request.headers(), &state.config.app_password) {
        return next.run(request).await;
    }

    warn!("Rejected unauthenticated request to {}", request.uri().path());
    let mut response = AppError::Unauthorized.into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(REALM));
    response
}

/// POST /api/login
pub async fn handle_login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Response, AppError> {
    if request.password != state.config.app_password {
        return Ok((StatusCode::UNAUTHORIZED, Json(json!({ "ok": false }))).into_response());
    }

    let cookie = HeaderValue::from_str(&format!(
        "{AUTH_COOKIE}={}; HttpOnly; Secure; SameSite=Lax; Max-Age={COOKIE_MAX_AGE_SECS}; Path=/",
        state.config.app_password
    ))
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid cookie value: {e}")))?;

    let mut response = Json(json!({ "ok": true })).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

pub fn is_authorized(headers: &HeaderMap, password: &str) -> bool {
    basic_auth_password(headers).is_some_and(|p| p == password)
        || cookie_value(headers, AUTH_COOKIE).is_some_and(|v| v == password)
}

/// Password half of `Authorization: Basic base64(user:password)`.
fn basic_auth_password(headers: &HeaderMap) -> Option<String> {
    let encoded = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (_user, password) = decoded.split_once(':')?;
    Some(password.to_string())
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
