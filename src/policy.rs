// src/policy.rs

//! Centralized authorization.
//!
//! Every read and write path asks [`AccessPolicy::authorize`] before touching a
//! store. The policy only looks at the values it is handed, so callers must
//! resolve the actor and load the target entity first.

use serde::Serialize;

use crate::models::{ingredient::Ingredient, recipe::Recipe};

/// Who is performing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User(i64),
}

impl Actor {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Actor::User(id) => Some(*id),
            Actor::Anonymous => None,
        }
    }

    fn is(&self, owner_id: i64) -> bool {
        self.user_id() == Some(owner_id)
    }
}

/// What the actor is acting on.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    /// A listing or a not-yet-created entity.
    Collection,
    Recipe(&'a Recipe),
    Ingredient(&'a Ingredient),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListOwn,
    ListPublic,
    ReadOne,
    Edit,
    Delete,
    Create,
    /// Mark a recipe. The caller reports whether a mark already exists.
    Rate { already_marked: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    Unauthenticated,
    NotOwner,
    NotVisible,
    /// Owner tried to mark their own recipe while self-rating is disabled.
    OwnRecipe,
    AlreadyMarked,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::NotOwner => "not_owner",
            DenyReason::NotVisible => "not_visible",
            DenyReason::OwnRecipe => "own_recipe",
            DenyReason::AlreadyMarked => "already_marked",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "Authentication required",
            DenyReason::NotOwner => "Only the owner can modify this resource",
            DenyReason::NotVisible => "This resource is not visible to you",
            DenyReason::OwnRecipe => "You cannot mark your own recipe",
            DenyReason::AlreadyMarked => "You have already marked this recipe",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    /// Turns a denial into an error so handlers can use `?`.
    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy {
    /// Lets owners mark their own recipes.
    pub allow_self_rating: bool,
}

impl AccessPolicy {
    pub fn new(allow_self_rating: bool) -> Self {
        Self { allow_self_rating }
    }

    pub fn authorize(&self, actor: &Actor, resource: Resource<'_>, operation: Operation) -> Decision {
        match operation {
            Operation::ListOwn | Operation::Create => require_user(actor),
            Operation::ListPublic => Decision::Allow,
            Operation::ReadOne => read_one(actor, resource),
            Operation::Edit | Operation::Delete => match owner_of(resource) {
                Some(owner) if actor.is(owner) => Decision::Allow,
                _ => Decision::Deny(DenyReason::NotOwner),
            },
            Operation::Rate { already_marked } => self.rate(actor, resource, already_marked),
        }
    }

    fn rate(&self, actor: &Actor, resource: Resource<'_>, already_marked: bool) -> Decision {
        let Resource::Recipe(recipe) = resource else {
            return Decision::Deny(DenyReason::NotVisible);
        };
        if let Decision::Deny(reason) = read_one(actor, resource) {
            return Decision::Deny(reason);
        }
        if actor.is(recipe.user_id) && !self.allow_self_rating {
            return Decision::Deny(DenyReason::OwnRecipe);
        }
        if already_marked {
            return Decision::Deny(DenyReason::AlreadyMarked);
        }
        Decision::Allow
    }
}

fn require_user(actor: &Actor) -> Decision {
    match actor {
        Actor::User(_) => Decision::Allow,
        Actor::Anonymous => Decision::Deny(DenyReason::Unauthenticated),
    }
}

fn read_one(actor: &Actor, resource: Resource<'_>) -> Decision {
    if *actor == Actor::Anonymous {
        return Decision::Deny(DenyReason::Unauthenticated);
    }
    let visible = match resource {
        Resource::Recipe(recipe) => recipe.is_public || actor.is(recipe.user_id),
        Resource::Ingredient(ingredient) => actor.is(ingredient.user_id),
        Resource::Collection => false,
    };
    if visible {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::NotVisible)
    }
}

fn owner_of(resource: Resource<'_>) -> Option<i64> {
    match resource {
        Resource::Recipe(recipe) => Some(recipe.user_id),
        Resource::Ingredient(ingredient) => Some(ingredient.user_id),
        Resource::Collection => None,
    }
}
