use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, Preferences, PreferencesUpdate, TokenResponse},
        jwt::{AuthUser, JwtKeys},
    },
    errors::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

pub fn preference_routes() -> Router<AppState> {
    Router::new().route(
        "/auth/preferences",
        get(get_preferences).put(put_preferences),
    )
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Ok(Json(payload)) = payload else {
        warn!("malformed login payload");
        return Err(AppError::invalid_input("Invalid credentials payload"));
    };

    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::invalid_input("Invalid credentials payload"));
    }

    let Some(username) = state.users.verify_credentials(username, &payload.password).await else {
        warn!(username, "login rejected");
        return Err(AppError::InvalidCredentials);
    };

    let token = JwtKeys::from_ref(&state).sign(&username)?;
    info!(%username, "user logged in");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state))]
pub async fn get_preferences(
    State(state): State<AppState>,
    AuthUser(username): AuthUser,
) -> Result<Json<Preferences>, AppError> {
    state
        .users
        .preferences(&username)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found("Preferences not found"))
}

#[instrument(skip(state, payload))]
pub async fn put_preferences(
    State(state): State<AppState>,
    AuthUser(username): AuthUser,
    payload: Result<Json<PreferencesUpdate>, JsonRejection>,
) -> Result<Json<Preferences>, AppError> {
    let Json(update) = payload.map_err(|e| {
        warn!(error = %e, "invalid preferences payload");
        AppError::invalid_input("Invalid preferences")
    })?;

    let prefs = state
        .users
        .update_preferences(&username, update)
        .await
        .ok_or_else(|| AppError::not_found("Preferences not found"))?;
    info!(%username, "preferences updated");
    Ok(Json(prefs))
}
