// src/models/user.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("username pattern is valid"));

/// Role every registered account receives.
pub const ROLE_USER: &str = "user";

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Granted roles, e.g. ["user"].
    pub roles: Vec<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Profile data for the current user.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub roles: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub recipes_count: usize,
    pub ingredients_count: usize,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        length(
            min = 3,
            max = 50,
            message = "Username length must be between 3 and 50 characters."
        ),
        custom(function = validate_username)
    )]
    pub username: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for changing the current user's password.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, max = 128))]
    pub current_password: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub new_password: String,
}

/// DTO for editing the current user's profile.
/// The current password must be supplied again.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(
        length(
            min = 3,
            max = 50,
            message = "Username length must be between 3 and 50 characters."
        ),
        custom(function = validate_username)
    )]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

fn validate_username(username: &str) -> Result<(), validator::ValidationError> {
    if !USERNAME_RE.is_match(username) {
        return Err(validator::ValidationError::new("invalid_username"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_charset_is_restricted() {
        let ok = CreateUserRequest {
            username: "marie.curie_42".to_string(),
            password: "secret".to_string(),
        };
        assert!(ok.validate().is_ok());

        let spaced = CreateUserRequest {
            username: "marie curie".to_string(),
            password: "secret".to_string(),
        };
        assert!(spaced.validate().is_err());

        let rename = UpdateProfileRequest {
            username: "marie curie".to_string(),
            password: "secret".to_string(),
        };
        assert!(rename.validate().is_err());
    }
}
