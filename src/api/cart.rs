use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::cart::CartStore;
use crate::domain::aggregates::CartLineItem;
use crate::domain::value_objects::Price;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/cart/:session", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/api/v1/cart/:session/items/:product_id", put(update_item).delete(remove_item))
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub session: String,
    pub items: Vec<CartLineItem>,
    pub total_items: u64,
    pub total_price: Price,
    pub total_price_display: String,
}

impl CartView {
    fn of(session: &str, store: &CartStore) -> Self {
        let total_price = store.total_price();
        Self {
            session: session.to_string(),
            items: store.items().to_vec(),
            total_items: store.total_items(),
            total_price,
            total_price_display: total_price.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddToCart {
    product_id: Uuid,
    #[serde(default = "one")]
    quantity: u32,
}

fn one() -> u32 { 1 }

#[derive(Debug, Deserialize)]
struct SetQuantity {
    quantity: i64,
}

async fn get_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<Json<CartView>, ApiError> {
    let store = s.carts.session(&session).await?;
    let store = store.lock().await;
    Ok(Json(CartView::of(&session, &store)))
}

async fn add_to_cart(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(body): Json<AddToCart>,
) -> Result<Json<CartView>, ApiError> {
    if body.quantity == 0 {
        return Err(ApiError::bad_request("quantity must be at least 1"));
    }
    let store = s.carts.session(&session).await?;
    let product = s.catalog.get_product(body.product_id).await?.ok_or_else(|| ApiError::not_found("product"))?;
    if !product.is_in_stock() {
        return Err(out_of_stock(format!("{} is out of stock", product.name)));
    }

    let mut store = store.lock().await;
    let in_cart = store.cart().get(product.id).map_or(0, |line| u64::from(line.quantity));
    let wanted = in_cart + u64::from(body.quantity);
    if wanted > u64::from(product.stock) {
        return Err(out_of_stock(format!("only {} of {} in stock, {} already in cart", product.stock, product.name, in_cart)));
    }
    store.add_item(product.to_cart_item()).await;
    if body.quantity > 1 {
        store.update_quantity(product.id, i64::try_from(wanted).unwrap_or(i64::MAX)).await;
    }
    tracing::debug!(session, product_id = %product.id, quantity = body.quantity, "added to cart");
    Ok(Json(CartView::of(&session, &store)))
}

fn out_of_stock(message: String) -> ApiError { ApiError::new(StatusCode::CONFLICT, "out_of_stock", message) }

async fn update_item(
    State(s): State<AppState>,
    Path((session, product_id)): Path<(String, Uuid)>,
    Json(body): Json<SetQuantity>,
) -> Result<Json<CartView>, ApiError> {
    let store = s.carts.session(&session).await?;
    let mut store = store.lock().await;
    store.update_quantity(product_id, body.quantity).await;
    Ok(Json(CartView::of(&session, &store)))
}

async fn remove_item(
    State(s): State<AppState>,
    Path((session, product_id)): Path<(String, Uuid)>,
) -> Result<Json<CartView>, ApiError> {
    let store = s.carts.session(&session).await?;
    let mut store = store.lock().await;
    store.remove_item(product_id).await;
    Ok(Json(CartView::of(&session, &store)))
}

async fn clear_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<Json<CartView>, ApiError> {
    let store = s.carts.session(&session).await?;
    let mut store = store.lock().await;
    store.clear_cart().await;
    Ok(Json(CartView::of(&session, &store)))
}
