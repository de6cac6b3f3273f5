//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs issued by the account service with claims
//! `{ id, exp }`. This backend only verifies them and loads the user.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use wear_with_pride_core::UserId;

use crate::db::RepositoryError;
use crate::models::User;
use crate::store::UserStore;

/// Authentication and authorization failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token")]
    InvalidToken,

    /// Token is valid but names no existing user.
    #[error("user not found")]
    UnknownUser,

    #[error("account is blocked")]
    Blocked,

    #[error("admin access required")]
    NotAdmin,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: UserId,
    pub exp: usize,
}

/// Verifies bearer tokens and resolves them to users.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Decode and validate a token.
    ///
    /// # Errors
    ///
    /// Returns `TokenExpired` or `InvalidToken`.
    pub fn claims(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }

    /// Resolve a token to an active user.
    ///
    /// # Errors
    ///
    /// Returns `UnknownUser` when the token's user does not exist and
    /// `Blocked` when the account is blocked.
    pub async fn authenticate<S>(&self, users: &S, token: &str) -> Result<User, AuthError>
    where
        S: UserStore + ?Sized,
    {
        let claims = self.claims(token)?;
        let user = users.user(claims.id).await?.ok_or(AuthError::UnknownUser)?;
        if user.is_blocked() {
            return Err(AuthError::Blocked);
        }
        Ok(user)
    }
}
