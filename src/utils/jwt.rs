// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError, policy::Actor};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// User's roles (e.g., ["user"]).
    pub roles: Vec<String>,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Signs a new JWT for the user.
pub fn sign_jwt(
    id: i64,
    roles: &[String],
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs();
    let expiration = usize::try_from(now.saturating_add(expiration_seconds))
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let claims = Claims {
        sub: id.to_string(),
        roles: roles.to_vec(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthenticated("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Resolves the acting user from the `Authorization: Bearer <token>` header.
///
/// No header yields `Actor::Anonymous`; what an anonymous actor may do is the
/// access policy's call. A header that is present but malformed or carries a
/// bad token is rejected with 401.
impl<S> FromRequestParts<S> for Actor
where
    Config: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(Actor::Anonymous);
        };

        let token = value
            .to_str()
            .ok()
            .and_then(|header| header.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthenticated("Malformed Authorization header".to_string()))?;

        let config = Config::from_ref(state);
        let claims = verify_jwt(token, &config.jwt_secret)?;
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::Unauthenticated("Invalid token subject".to_string()))?;

        Ok(Actor::User(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_token_round_trips_claims() {
        let roles = vec!["user".to_string()];
        let token = sign_jwt(42, &roles, "secret", 60).unwrap();
        let claims = verify_jwt(&token, "secret").unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.roles, roles);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = sign_jwt(42, &[], "secret", 60).unwrap();
        assert!(matches!(
            verify_jwt(&token, "other"),
            Err(AppError::Unauthenticated(_))
        ));
    }
}
