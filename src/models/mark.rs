// src/models/mark.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lowest accepted mark value.
pub const MIN_MARK: i64 = 1;
/// Highest accepted mark value.
pub const MAX_MARK: i64 = 5;

/// Represents the 'marks' table in the database.
/// (user_id, recipe_id) is unique.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Mark {
    pub id: i64,
    pub user_id: i64,
    pub recipe_id: i64,
    pub mark: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A mark that has passed validation and authorization but is not stored yet.
#[derive(Debug, Clone)]
pub struct NewMark {
    pub user_id: i64,
    pub recipe_id: i64,
    pub mark: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for submitting a mark.
/// Range checking happens in the rating service so every caller gets it.
#[derive(Debug, Deserialize)]
pub struct MarkRequest {
    pub mark: i64,
}

/// Aggregated marks of a single recipe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, FromRow)]
pub struct MarkStats {
    pub average: Option<f64>,
    pub count: i64,
}
