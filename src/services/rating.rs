// src/services/rating.rs

use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::AppError,
    models::{
        mark::{MAX_MARK, MIN_MARK, Mark, MarkStats, NewMark},
        recipe::Recipe,
    },
    policy::{AccessPolicy, Actor, Operation, Resource},
    store::{MARK_UNIQUE, MarkStore},
};

/// Creates marks.
///
/// Holds no lock of its own: when two submissions for the same pair race past
/// the existence check, the store's unique constraint rejects the loser and the
/// violation is reported as `Conflict`.
#[derive(Clone)]
pub struct RatingService {
    policy: AccessPolicy,
    marks: Arc<dyn MarkStore>,
}

impl RatingService {
    pub fn new(policy: AccessPolicy, marks: Arc<dyn MarkStore>) -> Self {
        Self { policy, marks }
    }

    pub async fn submit_mark(&self, actor: &Actor, recipe: &Recipe, value: i64) -> Result<Mark, AppError> {
        if !(MIN_MARK..=MAX_MARK).contains(&value) {
            return Err(AppError::InvalidValue(format!(
                "Mark must be between {} and {}",
                MIN_MARK, MAX_MARK
            )));
        }
        let mark = i32::try_from(value)
            .map_err(|_| AppError::InvalidValue("Mark out of range".to_string()))?;

        let already_marked = match actor.user_id() {
            Some(user_id) => self.marks.find_for(user_id, recipe.id).await?.is_some(),
            None => false,
        };

        self.policy
            .authorize(actor, Resource::Recipe(recipe), Operation::Rate { already_marked })
            .into_result()?;

        let user_id = actor
            .user_id()
            .ok_or_else(|| AppError::Unauthenticated("Authentication required".to_string()))?;

        let new_mark = NewMark {
            user_id,
            recipe_id: recipe.id,
            mark,
            created_at: Utc::now(),
        };

        let created = self.marks.create(new_mark).await.map_err(|e| {
            if e.violates(MARK_UNIQUE) {
                AppError::Conflict("You have already marked this recipe".to_string())
            } else {
                tracing::error!("Failed to store mark: {}", e);
                AppError::from(e)
            }
        })?;

        tracing::info!(
            user_id,
            recipe_id = recipe.id,
            mark = created.mark,
            "Mark recorded"
        );

        Ok(created)
    }

    /// Average (rounded to two decimals) and count of a recipe's marks, plus
    /// the actor's own mark. Callers must have authorized the read already.
    pub async fn summary(&self, actor: &Actor, recipe: &Recipe) -> Result<(MarkStats, Option<Mark>), AppError> {
        let mut stats = self.marks.stats_for(recipe.id).await?;
        stats.average = stats.average.map(|avg| (avg * 100.0).round() / 100.0);

        let mine = match actor.user_id() {
            Some(user_id) => self.marks.find_for(user_id, recipe.id).await?,
            None => None,
        };

        Ok((stats, mine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::recipe::RecipeRequest,
        policy::DenyReason,
        store::{MemoryStore, NewUser, RecipeStore, UserStore},
    };

    struct Fixture {
        store: Arc<MemoryStore>,
        owner: i64,
        rater: i64,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let mut ids = Vec::new();
        for name in ["owner", "rater"] {
            let user = UserStore::create(
                store.as_ref(),
                NewUser {
                    username: name.to_string(),
                    password_hash: "hash".to_string(),
                    roles: vec!["user".to_string()],
                },
            )
            .await
            .unwrap();
            ids.push(user.id);
        }
        Fixture {
            store,
            owner: ids[0],
            rater: ids[1],
        }
    }

    async fn recipe(fx: &Fixture, name: &str, is_public: bool) -> Recipe {
        let req = RecipeRequest {
            name: name.to_string(),
            description: "Recette de test".to_string(),
            time: None,
            quantity: None,
            difficulty: None,
            price: None,
            is_favorite: false,
            is_public,
            ingredients: vec![],
        };
        RecipeStore::create(fx.store.as_ref(), fx.owner, &req).await.unwrap()
    }

    fn service(fx: &Fixture, allow_self_rating: bool) -> RatingService {
        RatingService::new(AccessPolicy::new(allow_self_rating), fx.store.clone())
    }

    #[tokio::test]
    async fn rejects_values_outside_one_to_five() {
        let fx = fixture().await;
        let r = recipe(&fx, "Tarte", true).await;
        let svc = service(&fx, false);

        for value in [0, 6, -1, i64::MAX] {
            let err = svc.submit_mark(&Actor::User(fx.rater), &r, value).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidValue(_)), "value {value}");
        }
        assert_eq!(fx.store.stats_for(r.id).await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn boundary_values_are_accepted() {
        let fx = fixture().await;
        let svc = service(&fx, false);

        let low = recipe(&fx, "Low", true).await;
        let high = recipe(&fx, "High", true).await;
        assert_eq!(svc.submit_mark(&Actor::User(fx.rater), &low, 1).await.unwrap().mark, 1);
        assert_eq!(svc.submit_mark(&Actor::User(fx.rater), &high, 5).await.unwrap().mark, 5);
    }

    #[tokio::test]
    async fn second_mark_conflicts_and_keeps_first() {
        let fx = fixture().await;
        let r = recipe(&fx, "Tarte", true).await;
        let svc = service(&fx, false);

        let first = svc.submit_mark(&Actor::User(fx.rater), &r, 4).await.unwrap();
        let err = svc.submit_mark(&Actor::User(fx.rater), &r, 2).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let stored = fx.store.find_for(fx.rater, r.id).await.unwrap();
        assert_eq!(stored, Some(first));
        assert_eq!(fx.store.stats_for(r.id).await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn private_recipe_cannot_be_marked_by_others() {
        let fx = fixture().await;
        let r = recipe(&fx, "Secret", false).await;
        let err = service(&fx, false)
            .submit_mark(&Actor::User(fx.rater), &r, 3)
            .await
            .unwrap_err();
        assert_eq!(err, AppError::Forbidden(DenyReason::NotVisible));
    }

    #[tokio::test]
    async fn self_rating_follows_configuration() {
        let fx = fixture().await;
        let r = recipe(&fx, "Maison", true).await;

        let err = service(&fx, false)
            .submit_mark(&Actor::User(fx.owner), &r, 5)
            .await
            .unwrap_err();
        assert_eq!(err, AppError::Forbidden(DenyReason::OwnRecipe));

        assert!(service(&fx, true)
            .submit_mark(&Actor::User(fx.owner), &r, 5)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn anonymous_cannot_mark() {
        let fx = fixture().await;
        let r = recipe(&fx, "Tarte", true).await;
        let err = service(&fx, false)
            .submit_mark(&Actor::Anonymous, &r, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn concurrent_submissions_yield_a_single_mark() {
        let fx = fixture().await;
        let r = recipe(&fx, "Tarte", true).await;
        let svc = Arc::new(service(&fx, false));

        let mut handles = Vec::new();
        for i in 0..16 {
            let svc = svc.clone();
            let r = r.clone();
            let actor = Actor::User(fx.rater);
            handles.push(tokio::spawn(async move {
                svc.submit_mark(&actor, &r, 1 + (i % 5)).await
            }));
        }

        let mut successes = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(AppError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(conflicts, 15);
        assert_eq!(fx.store.stats_for(r.id).await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn summary_rounds_average_and_reports_own_mark() {
        let fx = fixture().await;
        let r = recipe(&fx, "Tarte", true).await;
        let svc = service(&fx, true);

        svc.submit_mark(&Actor::User(fx.owner), &r, 5).await.unwrap();
        svc.submit_mark(&Actor::User(fx.rater), &r, 4).await.unwrap();

        let (stats, mine) = svc.summary(&Actor::User(fx.rater), &r).await.unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.average, Some(4.5));
        assert_eq!(mine.map(|m| m.mark), Some(4));

        let (_, anonymous) = svc.summary(&Actor::Anonymous, &r).await.unwrap();
        assert!(anonymous.is_none());
    }
}
