use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use super::{ApiError, AppState};
use crate::checkout::{Receipt, RedirectHandoff, ShippingDetails};
use crate::domain::events::OrderEvent;

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/api/v1/checkout/:session", post(checkout))
}

/// Submits the session cart. The client opens `whatsapp_url` from the receipt.
async fn checkout(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(mut details): Json<ShippingDetails>,
) -> Result<(StatusCode, Json<Receipt>), ApiError> {
    let store = s.carts.session(&session).await?;
    let receipt = {
        let mut store = store.lock().await;
        let handoff = RedirectHandoff::new();
        s.checkout.submit(&mut store, &mut details, &handoff).await?
    };
    drop(store);
    s.carts.end(&session).await;

    s.events
        .publish(OrderEvent::Placed {
            order_id: receipt.order.id,
            total: receipt.order.total_amount.amount(),
            line_items: receipt.line_items,
            line_items_persisted: receipt.line_items_persisted,
        })
        .await;
    Ok((StatusCode::CREATED, Json(receipt)))
}
