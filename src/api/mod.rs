//! HTTP surface: storefront routes under `/api/v1`, back-office under `/api/v1/admin`.

mod admin;
mod cart;
mod catalog;
mod checkout;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use validator::ValidationErrors;

use crate::cart::{SessionCarts, SessionError};
use crate::checkout::{CheckoutError, CheckoutPipeline};
use crate::domain::aggregates::{BulkCommitError, StatusError};
use crate::events::EventPublisher;
use crate::store::{CatalogStore, OrderStore, StoreError};

pub use cart::CartView;

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub carts: Arc<SessionCarts>,
    pub checkout: Arc<CheckoutPipeline>,
    pub events: EventPublisher,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(catalog::routes())
        .merge(cart::routes())
        .merge(checkout::routes())
        .merge(admin::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(s): State<AppState>) -> impl IntoResponse {
    match s.orders.ping().await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"status": "healthy", "service": "toserba-storefront"}))),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(serde_json::json!({"status": "degraded", "service": "toserba-storefront"})))
        }
    }
}

/// Error response rendered as `{"error": {"code", "message"}}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into() }
    }

    pub fn not_found(what: &str) -> Self { Self::new(StatusCode::NOT_FOUND, "not_found", format!("{what} not found")) }
    pub fn bad_request(message: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, "bad_request", message) }
    pub fn conflict(message: impl Into<String>) -> Self { Self::new(StatusCode::CONFLICT, "conflict", message) }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn code(&self) -> &str { self.code }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorEnvelope { error: ErrorBody { code: self.code, message: &self.message } };
        (self.status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => Self::not_found(what),
            StoreError::Conflict(message) => Self::conflict(message),
            StoreError::OutOfRange(message) => Self::bad_request(message),
            StoreError::Unavailable(message) => {
                tracing::error!(%message, "store unavailable");
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "unavailable", "store unavailable")
            }
            StoreError::Database(e) => {
                tracing::error!(error = %e, "database query failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "database query failed")
            }
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(e: CheckoutError) -> Self {
        let message = e.user_message();
        match e {
            CheckoutError::Invalid(_) => Self::new(StatusCode::BAD_REQUEST, "validation_error", message),
            CheckoutError::EmptyCart => Self::new(StatusCode::BAD_REQUEST, "empty_cart", message),
            CheckoutError::OrderNotSaved(_) => Self::new(StatusCode::SERVICE_UNAVAILABLE, "order_not_saved", message),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(e: ValidationErrors) -> Self { Self::new(StatusCode::BAD_REQUEST, "validation_error", e.to_string()) }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self { Self::bad_request(e.to_string()) }
}

impl From<StatusError> for ApiError {
    fn from(e: StatusError) -> Self {
        match e {
            StatusError::Unknown(_) => Self::bad_request(e.to_string()),
            StatusError::Terminal { .. } => Self::conflict(e.to_string()),
        }
    }
}

impl From<BulkCommitError<StoreError>> for ApiError {
    fn from(e: BulkCommitError<StoreError>) -> Self {
        tracing::error!(applied = e.applied, product_id = %e.product_id, error = %e.source, "bulk update stopped");
        let message = format!("bulk update stopped after {} change(s) at product {}", e.applied, e.product_id);
        let inner = Self::from(e.source);
        Self { message, ..inner }
    }
}
