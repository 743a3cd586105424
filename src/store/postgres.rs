// src/store/postgres.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};

use super::{IngredientStore, MarkStore, NewUser, RecipeStore, StoreError, UserStore};
use crate::models::{
    ingredient::{Ingredient, IngredientRequest},
    mark::{Mark, MarkStats, NewMark},
    recipe::{Recipe, RecipeRequest},
    user::User,
};

/// Recipe columns plus the aggregated ingredient ids.
/// Every query using it must `GROUP BY r.id`.
const RECIPE_SELECT: &str = r#"
    SELECT
        r.id, r.name, r.description, r."time", r.quantity, r.difficulty, r.price,
        r.is_favorite, r.is_public, r.created_at, r.updated_at, r.user_id,
        COALESCE(
            ARRAY_AGG(ri.ingredient_id ORDER BY ri.ingredient_id)
                FILTER (WHERE ri.ingredient_id IS NOT NULL),
            '{}'
        ) AS ingredients
    FROM recipes r
    LEFT JOIN recipe_ingredients ri ON ri.recipe_id = r.id
"#;

/// Postgres-backed store. Uniqueness and referential integrity come from the
/// schema in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn fetch_recipe<'e, E>(executor: E, id: i64) -> Result<Option<Recipe>, StoreError>
where
    E: PgExecutor<'e>,
{
    let query = format!("{RECIPE_SELECT} WHERE r.id = $1 GROUP BY r.id");
    let recipe = sqlx::query_as::<_, Recipe>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(recipe)
}

async fn replace_ingredients(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    ingredient_ids: &[i64],
) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

    if !ingredient_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(recipe_id)
        .bind(ingredient_ids)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, roles)
            VALUES ($1, $2, $3)
            RETURNING id, username, password, roles, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.roles)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, roles, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, roles, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_username(&self, id: i64, username: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET username = $1 WHERE id = $2
            RETURNING id, username, password, roles, created_at
            "#,
        )
        .bind(username)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl IngredientStore for PgStore {
    async fn create(&self, owner_id: i64, input: &IngredientRequest) -> Result<Ingredient, StoreError> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            r#"
            INSERT INTO ingredients (name, price, user_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, price, user_id, created_at
            "#,
        )
        .bind(&input.name)
        .bind(input.price)
        .bind(owner_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(ingredient)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Ingredient>, StoreError> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, price, user_id, created_at FROM ingredients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ingredient)
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Ingredient>, StoreError> {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT id, name, price, user_id, created_at
            FROM ingredients
            WHERE id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(ingredients)
    }

    async fn find_owned_by(&self, owner_id: i64) -> Result<Vec<Ingredient>, StoreError> {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT id, name, price, user_id, created_at
            FROM ingredients
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ingredients)
    }

    async fn update(&self, id: i64, input: &IngredientRequest) -> Result<Ingredient, StoreError> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            r#"
            UPDATE ingredients SET name = $1, price = $2
            WHERE id = $3
            RETURNING id, name, price, user_id, created_at
            "#,
        )
        .bind(&input.name)
        .bind(input.price)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        Ok(ingredient)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        // recipe_ingredients rows go away through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl RecipeStore for PgStore {
    async fn create(&self, owner_id: i64, input: &RecipeRequest) -> Result<Recipe, StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO recipes
                (name, description, "time", quantity, difficulty, price,
                 is_favorite, is_public, created_at, updated_at, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.time)
        .bind(input.quantity)
        .bind(input.difficulty)
        .bind(input.price)
        .bind(input.is_favorite)
        .bind(input.is_public)
        .bind(now)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        replace_ingredients(&mut tx, id, &input.ingredient_ids()).await?;
        let recipe = fetch_recipe(&mut *tx, id).await?.ok_or(StoreError::NotFound)?;
        tx.commit().await?;

        Ok(recipe)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Recipe>, StoreError> {
        fetch_recipe(&self.pool, id).await
    }

    async fn find_owned_by(&self, owner_id: i64) -> Result<Vec<Recipe>, StoreError> {
        let query = format!("{RECIPE_SELECT} WHERE r.user_id = $1 GROUP BY r.id ORDER BY r.id");
        let recipes = sqlx::query_as::<_, Recipe>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(recipes)
    }

    async fn find_public(&self) -> Result<Vec<Recipe>, StoreError> {
        let query = format!("{RECIPE_SELECT} WHERE r.is_public GROUP BY r.id ORDER BY r.id");
        let recipes = sqlx::query_as::<_, Recipe>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(recipes)
    }

    async fn update(&self, id: i64, input: &RecipeRequest) -> Result<Recipe, StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE recipes SET
                name = $1, description = $2, "time" = $3, quantity = $4,
                difficulty = $5, price = $6, is_favorite = $7, is_public = $8,
                updated_at = $9
            WHERE id = $10
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.time)
        .bind(input.quantity)
        .bind(input.difficulty)
        .bind(input.price)
        .bind(input.is_favorite)
        .bind(input.is_public)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        replace_ingredients(&mut tx, id, &input.ingredient_ids()).await?;
        let recipe = fetch_recipe(&mut *tx, id).await?.ok_or(StoreError::NotFound)?;
        tx.commit().await?;

        Ok(recipe)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        // Marks and ingredient references cascade.
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl MarkStore for PgStore {
    async fn create(&self, mark: NewMark) -> Result<Mark, StoreError> {
        // Single statement guarded by UNIQUE (user_id, recipe_id).
        let stored = sqlx::query_as::<_, Mark>(
            r#"
            INSERT INTO marks (user_id, recipe_id, mark, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, recipe_id, mark, created_at
            "#,
        )
        .bind(mark.user_id)
        .bind(mark.recipe_id)
        .bind(mark.mark)
        .bind(mark.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn find_for(&self, user_id: i64, recipe_id: i64) -> Result<Option<Mark>, StoreError> {
        let mark = sqlx::query_as::<_, Mark>(
            r#"
            SELECT id, user_id, recipe_id, mark, created_at
            FROM marks
            WHERE user_id = $1 AND recipe_id = $2
            "#,
        )
        .bind(user_id)
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(mark)
    }

    async fn stats_for(&self, recipe_id: i64) -> Result<MarkStats, StoreError> {
        let stats = sqlx::query_as::<_, MarkStats>(
            r#"
            SELECT AVG(mark)::DOUBLE PRECISION AS average, COUNT(*) AS count
            FROM marks
            WHERE recipe_id = $1
            "#,
        )
        .bind(recipe_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
