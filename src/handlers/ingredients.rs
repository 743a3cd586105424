// src/handlers/ingredients.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use super::authorize_user;
use crate::{
    error::AppError,
    models::{
        ListParams,
        ingredient::{Ingredient, IngredientRequest},
    },
    policy::{Actor, Operation, Resource},
    state::AppState,
    utils::json::AppJson,
};

/// Loads an ingredient and checks `operation` against it.
async fn load_authorized(
    state: &AppState,
    actor: &Actor,
    id: i64,
    operation: Operation,
) -> Result<Ingredient, AppError> {
    let ingredient = state
        .ingredients
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Ingredient not found".to_string()))?;

    state
        .policy
        .authorize(actor, Resource::Ingredient(&ingredient), operation)
        .into_result()?;

    Ok(ingredient)
}

/// List the current user's ingredients.
pub async fn list_my_ingredients(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id = authorize_user(&state, &actor, Operation::ListOwn)?;

    let ingredients = state.ingredients.find_owned_by(owner_id).await?;

    Ok(Json(params.paginate(ingredients)))
}

/// Create an ingredient owned by the current user.
pub async fn create_ingredient(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(payload): AppJson<IngredientRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let owner_id = authorize_user(&state, &actor, Operation::Create)?;

    let ingredient = state
        .ingredients
        .create(owner_id, &payload)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create ingredient: {}", e);
            AppError::from(e)
        })?;

    Ok((StatusCode::CREATED, Json(ingredient)))
}

/// Get a single ingredient. Owner only.
pub async fn get_ingredient(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let ingredient = load_authorized(&state, &actor, id, Operation::ReadOne).await?;
    Ok(Json(ingredient))
}

/// Replace an ingredient's name and price. Owner only.
pub async fn update_ingredient(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<IngredientRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    load_authorized(&state, &actor, id, Operation::Edit).await?;

    let ingredient = state.ingredients.update(id, &payload).await?;

    Ok(Json(ingredient))
}

/// Delete an ingredient. Recipes using it simply lose the reference.
pub async fn delete_ingredient(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    load_authorized(&state, &actor, id, Operation::Delete).await?;

    state.ingredients.delete(id).await.map_err(|e| {
        tracing::error!("Failed to delete ingredient: {}", e);
        AppError::from(e)
    })?;

    Ok(StatusCode::NO_CONTENT)
}
