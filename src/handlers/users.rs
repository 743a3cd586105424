// src/handlers/users.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use super::authorize_user;
use crate::{
    error::AppError,
    models::user::{ChangePasswordRequest, MeResponse, UpdateProfileRequest, User},
    policy::{Actor, Operation},
    state::AppState,
    store::USERNAME_UNIQUE,
    utils::{
        hash::{hash_password, verify_password},
        json::AppJson,
    },
};

/// Get current user's profile and statistics.
pub async fn get_me(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<impl IntoResponse, AppError> {
    let user_id = authorize_user(&state, &actor, Operation::ListOwn)?;

    let user = load_user(&state, user_id).await?;
    let recipes_count = state.recipes.find_owned_by(user_id).await?.len();
    let ingredients_count = state.ingredients.find_owned_by(user_id).await?.len();

    Ok(Json(MeResponse {
        id: user.id,
        username: user.username,
        roles: user.roles,
        created_at: user.created_at,
        recipes_count,
        ingredients_count,
    }))
}

async fn load_user(state: &AppState, user_id: i64) -> Result<User, AppError> {
    state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))
}

/// Edit the current user's profile.
/// The current password must be supplied again.
pub async fn update_me(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = authorize_user(&state, &actor, Operation::ListOwn)?;
    payload.validate()?;

    let user = load_user(&state, user_id).await?;
    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::Unauthenticated("Password is incorrect".to_string()));
    }

    let updated = state
        .users
        .update_username(user_id, &payload.username)
        .await
        .map_err(|e| {
            if e.violates(USERNAME_UNIQUE) {
                AppError::Conflict("Username already exists".to_string())
            } else {
                tracing::error!("Failed to update profile: {}", e);
                AppError::from(e)
            }
        })?;

    tracing::info!(user_id, "Profile updated");

    Ok(Json(updated))
}

/// Change the current user's password.
/// The current password must be supplied again.
pub async fn change_password(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = authorize_user(&state, &actor, Operation::ListOwn)?;
    payload.validate()?;

    let user = load_user(&state, user_id).await?;

    if !verify_password(&payload.current_password, &user.password)? {
        return Err(AppError::Unauthenticated(
            "Current password is incorrect".to_string(),
        ));
    }

    let hashed = hash_password(&payload.new_password)?;
    state.users.update_password(user_id, &hashed).await?;

    tracing::info!(user_id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}
