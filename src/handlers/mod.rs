// src/handlers/mod.rs

pub mod auth;
pub mod ingredients;
pub mod recipes;
pub mod users;

use crate::{
    error::AppError,
    policy::{Actor, Operation, Resource},
    state::AppState,
};

/// Runs a collection-level check (`ListOwn`, `Create`) and returns the
/// acting user's id.
pub(crate) fn authorize_user(
    state: &AppState,
    actor: &Actor,
    operation: Operation,
) -> Result<i64, AppError> {
    state
        .policy
        .authorize(actor, Resource::Collection, operation)
        .into_result()?;
    actor
        .user_id()
        .ok_or_else(|| AppError::Unauthenticated("Authentication required".to_string()))
}
