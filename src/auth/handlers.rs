use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
        extractors::{AuthUser, BearerToken},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::{self, User},
    },
    error::{is_unique_violation, ApiError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.validate()?;

    // Cheap pre-check; the unique constraint below is the real gate.
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered"));
    }

    let hash = hash_password(&payload.password)?;
    let keys = JwtKeys::from_ref(&state);

    // User insert and token minting commit together: a signing failure
    // drops the transaction and rolls the new user back.
    let mut tx = state.db.begin().await?;
    let user = match User::insert(&mut *tx, payload.name.trim(), &payload.email, &hash).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %payload.email, "email already registered");
            return Err(ApiError::Conflict("Email already registered"));
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(e.into());
        }
    };
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    tx.commit().await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::new(
            access_token,
            refresh_token,
            keys.access_ttl_secs(),
            user,
        )),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.validate()?;

    // Unknown email and wrong password take the same exit so callers
    // cannot probe which addresses are registered.
    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(user) => user,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::Unauthorized("Invalid credentials"));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse::new(
        access_token,
        refresh_token,
        keys.access_ttl_secs(),
        user,
    )))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token"))?;

    if repo::is_token_revoked(&state.db, claims.jti).await? {
        warn!(user_id = %claims.sub, "revoked refresh token presented");
        return Err(ApiError::Unauthorized("Invalid or expired token"));
    }

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized("Invalid or expired token"))?;

    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;

    // Refresh tokens are single use. The old one dies only after its
    // replacement has been signed, so a signing failure leaves the
    // session with a still-usable refresh token.
    repo::revoke_token(&state.db, claims.jti, claims.expires_at()).await?;

    info!(user_id = %user.id, "token refreshed");
    Ok(Json(AuthResponse::new(
        access_token,
        refresh_token,
        keys.access_ttl_secs(),
        user,
    )))
}

#[instrument(skip(state, claims))]
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(claims): BearerToken,
) -> Result<StatusCode, ApiError> {
    repo::revoke_token(&state.db, claims.jti, claims.expires_at()).await?;
    info!(user_id = %claims.sub, "user logged out");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %user_id, "token for unknown user");
            ApiError::Unauthorized("User not found")
        })?;
    Ok(Json(user.into()))
}
