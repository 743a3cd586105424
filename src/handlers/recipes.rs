// src/handlers/recipes.rs

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
        mark::MarkRequest,
        recipe::{MAX_DESCRIPTION_LEN, Recipe, RecipeDetail, RecipeRequest},
    },
    policy::{Actor, Operation, Resource},
    state::AppState,
    store::{RECIPE_NAME_UNIQUE, StoreError},
    utils::{html::clean_html, json::AppJson},
};

async fn load_recipe(state: &AppState, id: i64) -> Result<Recipe, AppError> {
    state
        .recipes
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Recipe not found".to_string()))
}

/// Loads a recipe and checks `operation` against it.
async fn load_authorized(
    state: &AppState,
    actor: &Actor,
    id: i64,
    operation: Operation,
) -> Result<Recipe, AppError> {
    let recipe = load_recipe(state, id).await?;

    state
        .policy
        .authorize(actor, Resource::Recipe(&recipe), operation)
        .into_result()?;

    Ok(recipe)
}

/// Validates the submitted payload, then sanitizes the description.
/// Markup that survives sanitizing must still fit the description limits.
fn prepare(payload: RecipeRequest) -> Result<RecipeRequest, AppError> {
    payload.validate()?;

    let description = clean_html(&payload.description);
    if description != payload.description {
        let length = description.chars().count();
        if description.trim().is_empty() || length > MAX_DESCRIPTION_LEN {
            return Err(AppError::InvalidValue(format!(
                "Description must keep 1 to {} chars once markup is sanitized",
                MAX_DESCRIPTION_LEN
            )));
        }
    }

    Ok(RecipeRequest {
        description,
        ..payload
    })
}

/// Recipes may only reference the owner's own ingredients.
async fn check_ingredients(
    state: &AppState,
    owner_id: i64,
    payload: &RecipeRequest,
) -> Result<(), AppError> {
    let ids = payload.ingredient_ids();
    if ids.is_empty() {
        return Ok(());
    }

    let found = state.ingredients.find_by_ids(&ids).await?;
    let owned = found.iter().filter(|i| i.user_id == owner_id).count();
    if owned != ids.len() {
        return Err(AppError::InvalidValue(
            "Recipes can only use your own ingredients".to_string(),
        ));
    }
    Ok(())
}

fn name_conflict(name: &str) -> impl FnOnce(StoreError) -> AppError + '_ {
    move |e| {
        if e.violates(RECIPE_NAME_UNIQUE) {
            AppError::DuplicateName(name.to_string())
        } else {
            tracing::error!("Failed to save recipe: {}", e);
            AppError::from(e)
        }
    }
}

/// List the current user's recipes.
pub async fn list_my_recipes(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id = authorize_user(&state, &actor, Operation::ListOwn)?;

    let recipes = state.recipes.find_owned_by(owner_id).await?;

    Ok(Json(params.paginate(recipes)))
}

/// List public recipes of every user. No login needed.
pub async fn list_community_recipes(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    state
        .policy
        .authorize(&actor, Resource::Collection, Operation::ListPublic)
        .into_result()?;

    let recipes = state.recipes.find_public().await?;

    Ok(Json(params.paginate(recipes)))
}

/// Create a recipe owned by the current user.
pub async fn create_recipe(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(payload): AppJson<RecipeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = prepare(payload)?;
    let owner_id = authorize_user(&state, &actor, Operation::Create)?;
    check_ingredients(&state, owner_id, &payload).await?;

    let recipe = state
        .recipes
        .create(owner_id, &payload)
        .await
        .map_err(name_conflict(&payload.name))?;

    tracing::info!(recipe_id = recipe.id, owner_id, "Recipe created");

    Ok((StatusCode::CREATED, Json(recipe)))
}

/// Get a single recipe with its marks summary.
/// Visible to its owner, or to any signed-in user once public.
pub async fn get_recipe(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = load_authorized(&state, &actor, id, Operation::ReadOne).await?;

    let (marks, my_mark) = state.rating.summary(&actor, &recipe).await?;

    Ok(Json(RecipeDetail {
        recipe,
        marks,
        my_mark,
    }))
}

/// Replace a recipe. Owner only, whatever the public flag.
pub async fn update_recipe(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<RecipeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = prepare(payload)?;
    let recipe = load_authorized(&state, &actor, id, Operation::Edit).await?;
    check_ingredients(&state, recipe.user_id, &payload).await?;

    let updated = state
        .recipes
        .update(id, &payload)
        .await
        .map_err(name_conflict(&payload.name))?;

    Ok(Json(updated))
}

/// Delete a recipe and its marks. Owner only.
pub async fn delete_recipe(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    load_authorized(&state, &actor, id, Operation::Delete).await?;

    state.recipes.delete(id).await.map_err(|e| {
        tracing::error!("Failed to delete recipe: {}", e);
        AppError::from(e)
    })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Mark a recipe. One mark per user and recipe.
pub async fn mark_recipe(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<MarkRequest>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = load_recipe(&state, id).await?;

    let mark = state.rating.submit_mark(&actor, &recipe, payload.mark).await?;

    Ok((StatusCode::CREATED, Json(mark)))
}
