// src/store/memory.rs

//! Process-local backend used when no database is configured, and by tests.
//!
//! All tables live behind one `RwLock`, so every check-then-write below runs
//! atomically with respect to other callers.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    IngredientStore, MARK_UNIQUE, MarkStore, NewUser, RECIPE_NAME_UNIQUE, RecipeStore, StoreError,
    USERNAME_UNIQUE, UserStore,
};
use crate::models::{
    ingredient::{Ingredient, IngredientRequest},
    mark::{Mark, MarkStats, NewMark},
    recipe::{Recipe, RecipeRequest},
    user::User,
};

struct Table<T> {
    last_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            last_id: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Default)]
struct Tables {
    users: Table<User>,
    ingredients: Table<Ingredient>,
    recipes: Table<Recipe>,
    marks: Table<Mark>,
}

impl Tables {
    fn recipe_name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.recipes
            .rows
            .values()
            .any(|r| r.name == name && Some(r.id) != except)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn apply_recipe(recipe: &mut Recipe, input: &RecipeRequest) {
    recipe.name = input.name.clone();
    recipe.description = input.description.clone();
    recipe.time = input.time;
    recipe.quantity = input.quantity;
    recipe.difficulty = input.difficulty;
    recipe.price = input.price;
    recipe.is_favorite = input.is_favorite;
    recipe.is_public = input.is_public;
    recipe.ingredients = input.ingredient_ids();
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.rows.values().any(|u| u.username == user.username) {
            return Err(StoreError::UniqueViolation(USERNAME_UNIQUE.to_string()));
        }
        let id = tables.users.next_id();
        let created = User {
            id,
            username: user.username,
            password: user.password_hash,
            roles: user.roles,
            created_at: Utc::now(),
        };
        tables.users.rows.insert(id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.rows.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .rows
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let user = tables.users.rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.password = password_hash.to_string();
        Ok(())
    }

    async fn update_username(&self, id: i64, username: &str) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .rows
            .values()
            .any(|u| u.username == username && u.id != id)
        {
            return Err(StoreError::UniqueViolation(USERNAME_UNIQUE.to_string()));
        }
        let user = tables.users.rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.username = username.to_string();
        Ok(user.clone())
    }
}

#[async_trait]
impl IngredientStore for MemoryStore {
    async fn create(&self, owner_id: i64, input: &IngredientRequest) -> Result<Ingredient, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.rows.contains_key(&owner_id) {
            return Err(StoreError::NotFound);
        }
        let id = tables.ingredients.next_id();
        let ingredient = Ingredient {
            id,
            name: input.name.clone(),
            price: input.price,
            user_id: owner_id,
            created_at: Utc::now(),
        };
        tables.ingredients.rows.insert(id, ingredient.clone());
        Ok(ingredient)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Ingredient>, StoreError> {
        Ok(self.tables.read().await.ingredients.rows.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Ingredient>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .ingredients
            .rows
            .values()
            .filter(|i| ids.contains(&i.id))
            .cloned()
            .collect())
    }

    async fn find_owned_by(&self, owner_id: i64) -> Result<Vec<Ingredient>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .ingredients
            .rows
            .values()
            .filter(|i| i.user_id == owner_id)
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, input: &IngredientRequest) -> Result<Ingredient, StoreError> {
        let mut tables = self.tables.write().await;
        let ingredient = tables.ingredients.rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        ingredient.name = input.name.clone();
        ingredient.price = input.price;
        Ok(ingredient.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.ingredients.rows.remove(&id).ok_or(StoreError::NotFound)?;
        for recipe in tables.recipes.rows.values_mut() {
            recipe.ingredients.retain(|ingredient_id| *ingredient_id != id);
        }
        Ok(())
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn create(&self, owner_id: i64, input: &RecipeRequest) -> Result<Recipe, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.rows.contains_key(&owner_id) {
            return Err(StoreError::NotFound);
        }
        if tables.recipe_name_taken(&input.name, None) {
            return Err(StoreError::UniqueViolation(RECIPE_NAME_UNIQUE.to_string()));
        }
        let now = Utc::now();
        let id = tables.recipes.next_id();
        let mut recipe = Recipe {
            id,
            name: String::new(),
            description: String::new(),
            time: None,
            quantity: None,
            difficulty: None,
            price: None,
            is_favorite: false,
            is_public: false,
            created_at: now,
            updated_at: now,
            ingredients: Vec::new(),
            user_id: owner_id,
        };
        apply_recipe(&mut recipe, input);
        tables.recipes.rows.insert(id, recipe.clone());
        Ok(recipe)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Recipe>, StoreError> {
        Ok(self.tables.read().await.recipes.rows.get(&id).cloned())
    }

    async fn find_owned_by(&self, owner_id: i64) -> Result<Vec<Recipe>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .recipes
            .rows
            .values()
            .filter(|r| r.user_id == owner_id)
            .cloned()
            .collect())
    }

    async fn find_public(&self) -> Result<Vec<Recipe>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .recipes
            .rows
            .values()
            .filter(|r| r.is_public)
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, input: &RecipeRequest) -> Result<Recipe, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.recipes.rows.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        if tables.recipe_name_taken(&input.name, Some(id)) {
            return Err(StoreError::UniqueViolation(RECIPE_NAME_UNIQUE.to_string()));
        }
        let recipe = tables.recipes.rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        apply_recipe(recipe, input);
        recipe.updated_at = Utc::now();
        Ok(recipe.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.recipes.rows.remove(&id).ok_or(StoreError::NotFound)?;
        tables.marks.rows.retain(|_, mark| mark.recipe_id != id);
        Ok(())
    }
}

#[async_trait]
impl MarkStore for MemoryStore {
    async fn create(&self, mark: NewMark) -> Result<Mark, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.rows.contains_key(&mark.user_id)
            || !tables.recipes.rows.contains_key(&mark.recipe_id)
        {
            return Err(StoreError::NotFound);
        }
        let duplicate = tables
            .marks
            .rows
            .values()
            .any(|m| m.user_id == mark.user_id && m.recipe_id == mark.recipe_id);
        if duplicate {
            return Err(StoreError::UniqueViolation(MARK_UNIQUE.to_string()));
        }
        let id = tables.marks.next_id();
        let stored = Mark {
            id,
            user_id: mark.user_id,
            recipe_id: mark.recipe_id,
            mark: mark.mark,
            created_at: mark.created_at,
        };
        tables.marks.rows.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_for(&self, user_id: i64, recipe_id: i64) -> Result<Option<Mark>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .marks
            .rows
            .values()
            .find(|m| m.user_id == user_id && m.recipe_id == recipe_id)
            .cloned())
    }

    async fn stats_for(&self, recipe_id: i64) -> Result<MarkStats, StoreError> {
        let tables = self.tables.read().await;
        let values: Vec<i32> = tables
            .marks
            .rows
            .values()
            .filter(|m| m.recipe_id == recipe_id)
            .map(|m| m.mark)
            .collect();
        if values.is_empty() {
            return Ok(MarkStats::default());
        }
        let sum: i64 = values.iter().map(|v| i64::from(*v)).sum();
        let count = values.len() as i64;
        Ok(MarkStats {
            average: Some(sum as f64 / count as f64),
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_request(name: &str, ingredients: Vec<i64>) -> RecipeRequest {
        RecipeRequest {
            name: name.to_string(),
            description: "Une recette".to_string(),
            time: None,
            quantity: None,
            difficulty: None,
            price: None,
            is_favorite: false,
            is_public: false,
            ingredients,
        }
    }

    async fn user(store: &MemoryStore, name: &str) -> User {
        UserStore::create(
            store,
            NewUser {
                username: name.to_string(),
                password_hash: "hash".to_string(),
                roles: vec!["user".to_string()],
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let store = MemoryStore::new();
        user(&store, "alice").await;
        let err = UserStore::create(
            &store,
            NewUser {
                username: "alice".to_string(),
                password_hash: "other".to_string(),
                roles: vec![],
            },
        )
        .await
        .unwrap_err();
        assert!(err.violates(USERNAME_UNIQUE));
    }

    #[tokio::test]
    async fn renaming_keeps_usernames_unique() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        user(&store, "bob").await;

        let err = store.update_username(alice.id, "bob").await.unwrap_err();
        assert!(err.violates(USERNAME_UNIQUE));

        // Keeping one's own name is not a collision
        assert_eq!(store.update_username(alice.id, "alice").await.unwrap().username, "alice");
        assert_eq!(store.update_username(alice.id, "alicia").await.unwrap().username, "alicia");
        assert_eq!(
            store.update_username(99, "carol").await.unwrap_err(),
            StoreError::NotFound
        );
    }

    #[tokio::test]
    async fn recipe_names_are_globally_unique() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;

        let tarte = RecipeStore::create(&store, alice.id, &recipe_request("Tarte", vec![]))
            .await
            .unwrap();
        let err = RecipeStore::create(&store, bob.id, &recipe_request("Tarte", vec![]))
            .await
            .unwrap_err();
        assert!(err.violates(RECIPE_NAME_UNIQUE));

        // Renaming onto itself is fine, onto another recipe is not.
        RecipeStore::update(&store, tarte.id, &recipe_request("Tarte", vec![]))
            .await
            .unwrap();
        let crumble = RecipeStore::create(&store, bob.id, &recipe_request("Crumble", vec![]))
            .await
            .unwrap();
        let err = RecipeStore::update(&store, crumble.id, &recipe_request("Tarte", vec![]))
            .await
            .unwrap_err();
        assert!(err.violates(RECIPE_NAME_UNIQUE));
    }

    #[tokio::test]
    async fn update_refreshes_timestamp_and_keeps_owner() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let created = RecipeStore::create(&store, alice.id, &recipe_request("Tarte", vec![]))
            .await
            .unwrap();

        let mut input = recipe_request("Tarte Tatin", vec![]);
        input.is_public = true;
        let updated = RecipeStore::update(&store, created.id, &input).await.unwrap();

        assert_eq!(updated.user_id, alice.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert!(updated.is_public);
        assert_eq!(updated.name, "Tarte Tatin");
    }

    #[tokio::test]
    async fn listings_filter_by_owner_and_visibility() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;

        let mut public = recipe_request("Public", vec![]);
        public.is_public = true;
        RecipeStore::create(&store, alice.id, &public).await.unwrap();
        RecipeStore::create(&store, alice.id, &recipe_request("Private", vec![]))
            .await
            .unwrap();
        RecipeStore::create(&store, bob.id, &recipe_request("Bob", vec![]))
            .await
            .unwrap();

        assert_eq!(RecipeStore::find_owned_by(&store, alice.id).await.unwrap().len(), 2);
        let listed = store.find_public().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Public");
    }

    #[tokio::test]
    async fn deleting_an_ingredient_removes_references() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let req = IngredientRequest {
            name: "Pomme".to_string(),
            price: Some(2.0),
        };
        let pomme = IngredientStore::create(&store, alice.id, &req).await.unwrap();
        let sucre = IngredientStore::create(
            &store,
            alice.id,
            &IngredientRequest {
                name: "Sucre".to_string(),
                price: None,
            },
        )
        .await
        .unwrap();
        let recipe = RecipeStore::create(
            &store,
            alice.id,
            &recipe_request("Tarte", vec![pomme.id, sucre.id, pomme.id]),
        )
        .await
        .unwrap();
        assert_eq!(recipe.ingredients, vec![pomme.id, sucre.id]);

        IngredientStore::delete(&store, pomme.id).await.unwrap();

        let recipe = RecipeStore::find_by_id(&store, recipe.id).await.unwrap().unwrap();
        assert_eq!(recipe.ingredients, vec![sucre.id]);
        assert_eq!(
            IngredientStore::delete(&store, pomme.id).await,
            Err(StoreError::NotFound)
        );
    }

    #[tokio::test]
    async fn marks_are_unique_per_pair_and_cascade_with_recipe() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let recipe = RecipeStore::create(&store, alice.id, &recipe_request("Tarte", vec![]))
            .await
            .unwrap();

        let new_mark = |value| NewMark {
            user_id: bob.id,
            recipe_id: recipe.id,
            mark: value,
            created_at: Utc::now(),
        };
        MarkStore::create(&store, new_mark(4)).await.unwrap();
        let err = MarkStore::create(&store, new_mark(2)).await.unwrap_err();
        assert!(err.violates(MARK_UNIQUE));
        assert_eq!(
            store.stats_for(recipe.id).await.unwrap(),
            MarkStats {
                average: Some(4.0),
                count: 1
            }
        );

        RecipeStore::delete(&store, recipe.id).await.unwrap();
        assert_eq!(store.stats_for(recipe.id).await.unwrap(), MarkStats::default());
    }
}
