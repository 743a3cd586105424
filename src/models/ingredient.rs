// src/models/ingredient.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'ingredients' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub price: Option<f64>,

    /// Owner. Always the user who created the ingredient.
    pub user_id: i64,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating or replacing an ingredient.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IngredientRequest {
    #[validate(
        length(min = 2, max = 50, message = "Name length must be between 2 and 50 chars"),
        custom(function = super::not_blank)
    )]
    pub name: String,

    #[validate(range(min = 0.0, max = 1000.0, message = "Price must be between 0 and 1000"))]
    pub price: Option<f64>,
}
