// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest, ROLE_USER},
    state::AppState,
    store::{NewUser, USERNAME_UNIQUE},
    utils::{
        hash::{hash_password, verify_password},
        json::AppJson,
        jwt::sign_jwt,
    },
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;

    let user = state
        .users
        .create(NewUser {
            username: payload.username.clone(),
            password_hash: hashed_password,
            roles: vec![ROLE_USER.to_string()],
        })
        .await
        .map_err(|e| {
            if e.violates(USERNAME_UNIQUE) {
                AppError::Conflict(format!("Username '{}' already exists", payload.username))
            } else {
                tracing::error!("Failed to register user: {}", e);
                AppError::from(e)
            }
        })?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
///
/// Unknown usernames and wrong passwords get the same answer.
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = state
        .users
        .find_by_username(&payload.username)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::Unauthenticated("Invalid credentials".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.roles,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user_id": user.id
    })))
}
