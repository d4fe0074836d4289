use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    products::{dto::ProductBody, repo::Product},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route(
            "/products/:id",
            axum::routing::put(update_product).delete(delete_product),
        )
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = Product::list_by_owner(&state.db, user_id).await?;
    Ok(Json(products))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ProductBody>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    payload.validate()?;
    let product = Product::insert(
        &state.db,
        user_id,
        payload.name.trim(),
        payload.description.trim(),
        payload.amount,
    )
    .await?;
    info!(product_id = product.id, user_id = %user_id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    let product = Product::find_owned(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("Product"))?;
    Ok(Json(product))
}

#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<ProductBody>,
) -> Result<Json<Product>, ApiError> {
    // Existence and ownership gate first; field validation only runs
    // against a row the caller is allowed to touch.
    if Product::find_owned(&state.db, user_id, id).await?.is_none() {
        return Err(ApiError::NotFound("Product"));
    }
    payload.validate()?;
    let product = Product::update_owned(
        &state.db,
        user_id,
        id,
        payload.name.trim(),
        payload.description.trim(),
        payload.amount,
    )
    .await?
    .ok_or(ApiError::NotFound("Product"))?;
    info!(product_id = product.id, user_id = %user_id, "product updated");
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !Product::delete_owned(&state.db, user_id, id).await? {
        return Err(ApiError::NotFound("Product"));
    }
    info!(product_id = id, user_id = %user_id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}
