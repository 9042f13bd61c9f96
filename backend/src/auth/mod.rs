//! Authenticated-user extraction
//!
//! Authentication itself is an external collaborator: the auth provider
//! issues tokens and this backend only verifies them, reading the opaque
//! uid from the `sub` claim. There is no hidden ambient user state; the
//! uid is threaded explicitly into every store-facing call.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::FromRef,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Claims we consume from externally-issued tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Opaque user identifier assigned by the auth provider
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Pre-computed token verifier.
///
/// The decoding key is derived once at startup and shared via `AppState`.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding: Arc<DecodingKey>,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }

    /// Verify a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::default();
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| ApiError::NotAuthenticated(format!("Invalid token: {e}")))?;
        Ok(data.claims)
    }
}

/// Authenticated user extracted from the Authorization header
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ApiError::NotAuthenticated("Missing authorization header".to_string())
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::NotAuthenticated("Invalid authorization format".to_string())
        })?;

        let claims = app_state.jwt().verify(token)?;

        if claims.sub.is_empty() {
            return Err(ApiError::NotAuthenticated("Empty uid in token".to_string()));
        }

        Ok(AuthUser { uid: claims.sub })
    }
}
