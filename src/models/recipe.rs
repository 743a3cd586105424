// src/models/recipe.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::mark::{Mark, MarkStats};

/// Represents the 'recipes' table joined with its ingredient references.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,

    /// Unique across all recipes.
    pub name: String,

    pub description: String,

    /// Preparation time in minutes.
    pub time: Option<i32>,

    /// Number of servings.
    pub quantity: Option<i32>,

    pub difficulty: Option<i32>,
    pub price: Option<f64>,
    pub is_favorite: bool,
    pub is_public: bool,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,

    /// Referenced ingredient ids, sorted and free of duplicates.
    pub ingredients: Vec<i64>,

    /// Owner. Set once at creation.
    pub user_id: i64,
}

/// Longest accepted description, counted in chars.
pub const MAX_DESCRIPTION_LEN: usize = 255;

/// DTO for creating or replacing a recipe.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecipeRequest {
    #[validate(
        length(min = 2, max = 50, message = "Name length must be between 2 and 50 chars"),
        custom(function = super::not_blank)
    )]
    pub name: String,

    #[validate(
        length(min = 1, max = 255, message = "Description must be at most 255 chars"),
        custom(function = super::not_blank)
    )]
    pub description: String,

    #[validate(range(min = 1, max = 1440, message = "Time must be between 1 and 1440 minutes"))]
    pub time: Option<i32>,

    #[validate(range(min = 1, max = 50, message = "Quantity must be between 1 and 50"))]
    pub quantity: Option<i32>,

    #[validate(range(min = 1, max = 5, message = "Difficulty must be between 1 and 5"))]
    pub difficulty: Option<i32>,

    #[validate(range(min = 0.0, max = 1000.0, message = "Price must be between 0 and 1000"))]
    pub price: Option<f64>,

    pub is_favorite: bool,

    #[serde(default)]
    pub is_public: bool,

    #[serde(default)]
    pub ingredients: Vec<i64>,
}

impl RecipeRequest {
    /// Ingredient ids with duplicates collapsed.
    pub fn ingredient_ids(&self) -> Vec<i64> {
        self.ingredients
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// A recipe together with its marks summary, as returned by the detail view.
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub marks: MarkStats,

    /// The requesting user's own mark, if they already rated the recipe.
    pub my_mark: Option<Mark>,
}
