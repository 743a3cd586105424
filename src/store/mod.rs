// src/store/mod.rs

//! Persistence seams.
//!
//! Stores perform no authorization. Handlers and services run the access
//! policy first and only then call in here. Uniqueness (recipe names,
//! usernames, one mark per user and recipe) is enforced by the backend itself
//! and reported as [`StoreError::UniqueViolation`] carrying the constraint name.

use async_trait::async_trait;

use crate::models::{
    ingredient::{Ingredient, IngredientRequest},
    mark::{Mark, MarkStats, NewMark},
    recipe::{Recipe, RecipeRequest},
    user::User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const USERNAME_UNIQUE: &str = "users_username_key";
pub const RECIPE_NAME_UNIQUE: &str = "recipes_name_key";
pub const MARK_UNIQUE: &str = "marks_user_id_recipe_id_key";

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No row matched the given id.
    NotFound,
    /// A unique constraint rejected the write.
    UniqueViolation(String),
    /// Anything else the backend reported.
    Backend(String),
}

impl StoreError {
    pub fn violates(&self, constraint: &str) -> bool {
        matches!(self, StoreError::UniqueViolation(name) if name == constraint)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "row not found"),
            StoreError::UniqueViolation(name) => write!(f, "unique constraint {} violated", name),
            StoreError::Backend(msg) => write!(f, "storage backend error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::UniqueViolation(db.constraint().unwrap_or_default().to_string())
            }
            // A dangling reference means the parent row is gone.
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => StoreError::NotFound,
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Fields of a user that is about to be registered.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub roles: Vec<String>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with a `USERNAME_UNIQUE` violation when the name is taken.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), StoreError>;

    /// Renames a user. Same `USERNAME_UNIQUE` rule as `create`.
    async fn update_username(&self, id: i64, username: &str) -> Result<User, StoreError>;
}

#[async_trait]
pub trait IngredientStore: Send + Sync {
    async fn create(&self, owner_id: i64, input: &IngredientRequest) -> Result<Ingredient, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Ingredient>, StoreError>;

    /// Returns the ingredients among `ids` that exist, in id order.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Ingredient>, StoreError>;

    async fn find_owned_by(&self, owner_id: i64) -> Result<Vec<Ingredient>, StoreError>;

    async fn update(&self, id: i64, input: &IngredientRequest) -> Result<Ingredient, StoreError>;

    /// Also drops the ingredient from every recipe referencing it.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Fails with a `RECIPE_NAME_UNIQUE` violation when the name is taken.
    async fn create(&self, owner_id: i64, input: &RecipeRequest) -> Result<Recipe, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Recipe>, StoreError>;

    async fn find_owned_by(&self, owner_id: i64) -> Result<Vec<Recipe>, StoreError>;

    /// Public recipes of every owner.
    async fn find_public(&self) -> Result<Vec<Recipe>, StoreError>;

    /// Replaces every editable field and refreshes `updated_at`.
    /// Owner and creation time are left untouched.
    async fn update(&self, id: i64, input: &RecipeRequest) -> Result<Recipe, StoreError>;

    /// Also removes the marks given to the recipe.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

#[async_trait]
pub trait MarkStore: Send + Sync {
    /// Atomic insert. A second mark for the same (user, recipe) pair fails
    /// with a `MARK_UNIQUE` violation, even under concurrent callers.
    async fn create(&self, mark: NewMark) -> Result<Mark, StoreError>;

    async fn find_for(&self, user_id: i64, recipe_id: i64) -> Result<Option<Mark>, StoreError>;

    async fn stats_for(&self, recipe_id: i64) -> Result<MarkStats, StoreError>;
}
