use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::jwt::{Claims, JwtKeys, TokenKind};
use crate::auth::repo;
use crate::error::ApiError;
use crate::state::AppState;

/// Resolves the acting user from a bearer access token. Rejects refresh
/// tokens and anything on the revocation list, so every protected handler
/// gets an identity that is valid right now.
pub struct AuthUser(pub Uuid);

/// Verified claims of whatever bearer token was presented, without the
/// revocation check. Used by logout, which must stay idempotent even when
/// the token has already been revoked.
pub struct BearerToken(pub Claims);

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized("Missing Authorization header"))?;
    strip_bearer(header).ok_or(ApiError::Unauthorized("Invalid Authorization header"))
}

fn strip_bearer(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

#[async_trait]
impl FromRequestParts<AppState> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::Unauthorized("Invalid or expired token")
        })?;
        Ok(BearerToken(claims))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(claims) = BearerToken::from_request_parts(parts, state).await?;

        if claims.kind != TokenKind::Access {
            return Err(ApiError::Unauthorized("Access token required"));
        }

        if repo::is_token_revoked(&state.db, claims.jti).await? {
            warn!(user_id = %claims.sub, "revoked token presented");
            return Err(ApiError::Unauthorized("Invalid or expired token"));
        }

        Ok(AuthUser(claims.sub))
    }
}
