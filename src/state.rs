use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Config;
use crate::policy::AccessPolicy;
use crate::services::rating::RatingService;
use crate::store::{IngredientStore, MarkStore, MemoryStore, PgStore, RecipeStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub ingredients: Arc<dyn IngredientStore>,
    pub recipes: Arc<dyn RecipeStore>,
    pub policy: AccessPolicy,
    pub rating: RatingService,
    pub config: Config,
}

impl AppState {
    /// Wires every store to the same backend.
    fn with_backend<S>(backend: Arc<S>, config: Config) -> Self
    where
        S: UserStore + IngredientStore + RecipeStore + MarkStore + 'static,
    {
        let policy = AccessPolicy::new(config.allow_self_rating);
        let marks: Arc<dyn MarkStore> = backend.clone();
        Self {
            users: backend.clone(),
            ingredients: backend.clone(),
            recipes: backend,
            rating: RatingService::new(policy, marks),
            policy,
            config,
        }
    }

    pub fn postgres(store: PgStore, config: Config) -> Self {
        Self::with_backend(Arc::new(store), config)
    }

    pub fn in_memory(config: Config) -> Self {
        Self::with_backend(Arc::new(MemoryStore::new()), config)
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
