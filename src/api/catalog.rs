use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::domain::aggregates::{Banner, Category, Product, ProductFilter};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/:id", get(get_product))
        .route("/api/v1/categories", get(list_categories))
        .route("/api/v1/banners", get(list_banners))
}

async fn list_products(State(s): State<AppState>, Query(filter): Query<ProductFilter>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(s.catalog.list_products(&filter).await?))
}

async fn get_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Product>, ApiError> {
    s.catalog.get_product(id).await?.map(Json).ok_or_else(|| ApiError::not_found("product"))
}

async fn list_categories(State(s): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(s.catalog.list_categories().await?))
}

async fn list_banners(State(s): State<AppState>) -> Result<Json<Vec<Banner>>, ApiError> {
    Ok(Json(s.catalog.list_banners(true).await?))
}
