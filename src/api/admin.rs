//! Back-office routes: catalog maintenance, bulk edits, orders and reports.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;
use validator::Validate;

use super::{ApiError, AppState};
use crate::domain::aggregates::{
    Banner, BulkCommitError, Category, NewBanner, NewCategory, NewProduct, OrderDetail, OrderHeader, OrderStatus, PriceEdit, Product,
    ProductFilter, StockEdit,
};
use crate::domain::events::{OrderEvent, ProductEvent};
use crate::reports::{CustomerSummary, SalesReport};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/products", post(create_product))
        .route("/api/v1/admin/products/bulk-stock", post(bulk_stock))
        .route("/api/v1/admin/products/bulk-price", post(bulk_price))
        .route("/api/v1/admin/products/:id", put(update_product).delete(delete_product))
        .route("/api/v1/admin/categories", post(create_category))
        .route("/api/v1/admin/categories/:id", delete(delete_category))
        .route("/api/v1/admin/banners", get(list_banners).post(create_banner))
        .route("/api/v1/admin/banners/:id", delete(delete_banner))
        .route("/api/v1/admin/banners/:id/toggle", post(toggle_banner))
        .route("/api/v1/admin/orders", get(list_orders))
        .route("/api/v1/admin/orders/:id", get(get_order))
        .route("/api/v1/admin/orders/:id/status", put(update_order_status))
        .route("/api/v1/admin/reports/sales", get(sales_report))
        .route("/api/v1/admin/customers", get(list_customers))
}

async fn create_product(State(s): State<AppState>, Json(body): Json<NewProduct>) -> Result<(StatusCode, Json<Product>), ApiError> {
    body.validate()?;
    let product = s.catalog.create_product(body).await?;
    tracing::info!(product_id = %product.id, name = %product.name, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<NewProduct>,
) -> Result<Json<Product>, ApiError> {
    body.validate()?;
    let before = s.catalog.get_product(id).await?.ok_or_else(|| ApiError::not_found("product"))?;
    let after = s.catalog.update_product(id, body).await?.ok_or_else(|| ApiError::not_found("product"))?;
    if before.stock != after.stock {
        s.events.publish(ProductEvent::StockChanged { product_id: id, stock: after.stock }).await;
    }
    if before.price != after.price {
        s.events.publish(ProductEvent::PriceChanged { product_id: id, price: after.price.amount() }).await;
    }
    Ok(Json(after))
}

async fn delete_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    if !s.catalog.delete_product(id).await? {
        return Err(ApiError::not_found("product"));
    }
    tracing::info!(product_id = %id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct StockUpdate {
    product_id: Uuid,
    stock: i64,
}

#[derive(Debug, Deserialize)]
struct PriceUpdate {
    product_id: Uuid,
    price: Decimal,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct BulkOutcome {
    updated: usize,
    unchanged: usize,
}

impl BulkOutcome {
    /// A product listed twice in one request counts once.
    fn new(requested: impl Iterator<Item = Uuid>, updated: usize) -> Self {
        let distinct = requested.collect::<HashSet<_>>().len();
        Self { updated, unchanged: distinct.saturating_sub(updated) }
    }
}

/// Changes written before the commit finished or stopped.
fn applied<E: std::error::Error + 'static>(result: &Result<usize, BulkCommitError<E>>) -> usize {
    match result {
        Ok(updated) => *updated,
        Err(e) => e.applied,
    }
}

async fn bulk_stock(State(s): State<AppState>, Json(updates): Json<Vec<StockUpdate>>) -> Result<Json<BulkOutcome>, ApiError> {
    let products = s.catalog.list_products(&ProductFilter::default()).await?;
    let mut edit = StockEdit::new(products.iter().map(|p| (p.id, p.stock)));
    if let Some(unknown) = updates.iter().find(|u| !edit.knows(u.product_id)) {
        return Err(ApiError::not_found(&format!("product {}", unknown.product_id)));
    }
    for update in &updates {
        edit.set_stock(update.product_id, update.stock);
    }

    let changes: Vec<(Uuid, u32)> = edit.changes().collect();
    let catalog = &s.catalog;
    let result = edit.commit(move |id, stock| catalog.set_stock(id, stock)).await;
    for (product_id, stock) in changes.into_iter().take(applied(&result)) {
        s.events.publish(ProductEvent::StockChanged { product_id, stock }).await;
    }
    let updated = result?;
    tracing::info!(updated, requested = updates.len(), "bulk stock update");
    Ok(Json(BulkOutcome::new(updates.iter().map(|u| u.product_id), updated)))
}

async fn bulk_price(State(s): State<AppState>, Json(updates): Json<Vec<PriceUpdate>>) -> Result<Json<BulkOutcome>, ApiError> {
    let products = s.catalog.list_products(&ProductFilter::default()).await?;
    let mut edit = PriceEdit::new(products.iter().map(|p| (p.id, p.price)));
    if let Some(unknown) = updates.iter().find(|u| !edit.knows(u.product_id)) {
        return Err(ApiError::not_found(&format!("product {}", unknown.product_id)));
    }
    for update in &updates {
        edit.set_price(update.product_id, update.price);
    }

    let changes: Vec<_> = edit.changes().collect();
    let catalog = &s.catalog;
    let result = edit.commit(move |id, price| catalog.set_price(id, price)).await;
    for (product_id, price) in changes.into_iter().take(applied(&result)) {
        s.events.publish(ProductEvent::PriceChanged { product_id, price: price.amount() }).await;
    }
    let updated = result?;
    tracing::info!(updated, requested = updates.len(), "bulk price update");
    Ok(Json(BulkOutcome::new(updates.iter().map(|u| u.product_id), updated)))
}

async fn create_category(State(s): State<AppState>, Json(body): Json<NewCategory>) -> Result<(StatusCode, Json<Category>), ApiError> {
    body.validate()?;
    Ok((StatusCode::CREATED, Json(s.catalog.create_category(body).await?)))
}

async fn delete_category(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    s.catalog.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_banners(State(s): State<AppState>) -> Result<Json<Vec<Banner>>, ApiError> {
    Ok(Json(s.catalog.list_banners(false).await?))
}

async fn create_banner(State(s): State<AppState>, Json(body): Json<NewBanner>) -> Result<(StatusCode, Json<Banner>), ApiError> {
    body.validate()?;
    Ok((StatusCode::CREATED, Json(s.catalog.create_banner(body).await?)))
}

async fn toggle_banner(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Banner>, ApiError> {
    s.catalog.toggle_banner(id).await?.map(Json).ok_or_else(|| ApiError::not_found("banner"))
}

async fn delete_banner(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    if !s.catalog.delete_banner(id).await? {
        return Err(ApiError::not_found("banner"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct OrderQuery {
    status: Option<String>,
}

async fn list_orders(State(s): State<AppState>, Query(q): Query<OrderQuery>) -> Result<Json<Vec<OrderHeader>>, ApiError> {
    let status = q.status.as_deref().filter(|st| !st.is_empty()).map(str::parse::<OrderStatus>).transpose()?;
    Ok(Json(s.orders.list_orders(status).await?))
}

async fn get_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<OrderDetail>, ApiError> {
    let order = s.orders.get_order(id).await?.ok_or_else(|| ApiError::not_found("order"))?;
    let items = s.orders.order_items(id).await?;
    Ok(Json(OrderDetail { reference: order.reference(), order, items }))
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: String,
}

async fn update_order_status(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<OrderHeader>, ApiError> {
    let requested: OrderStatus = body.status.parse()?;
    let order = s.orders.get_order(id).await?.ok_or_else(|| ApiError::not_found("order"))?;
    let next = order.status.transition_to(requested)?;
    if next == order.status {
        return Ok(Json(order));
    }
    let updated = s.orders.update_order_status(id, next).await?.ok_or_else(|| ApiError::not_found("order"))?;
    tracing::info!(order_id = %id, from = %order.status, to = %next, "order status changed");
    s.events.publish(OrderEvent::StatusChanged { order_id: id, from: order.status, to: next }).await;
    Ok(Json(updated))
}

async fn sales_report(State(s): State<AppState>) -> Result<Json<SalesReport>, ApiError> {
    let now = Utc::now();
    let orders = s.orders.orders_since(SalesReport::window_start(now)).await?;
    Ok(Json(SalesReport::from_orders(&orders, now)))
}

#[derive(Debug, Deserialize)]
struct CustomerQuery {
    search: Option<String>,
}

async fn list_customers(State(s): State<AppState>, Query(q): Query<CustomerQuery>) -> Result<Json<Vec<CustomerSummary>>, ApiError> {
    let orders = s.orders.list_orders(None).await?;
    let mut customers = CustomerSummary::from_orders(&orders);
    if let Some(search) = q.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        customers.retain(|c| c.matches(search));
    }
    Ok(Json(customers))
}
