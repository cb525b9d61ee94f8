//! Order submission pipeline.
//!
//! Turns a session cart plus shipping details into a stored order and a
//! WhatsApp hand-off, in this order:
//!
//! 1. persist the order header (failure aborts, cart kept),
//! 2. persist the line items (failure is logged, checkout continues),
//! 3. compose the order message,
//! 4. open the WhatsApp link,
//! 5. clear the cart and the shipping form.

pub mod handoff;
pub mod message;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationErrors};

use crate::cart::CartStore;
use crate::domain::aggregates::{NewOrder, NewOrderItem, OrderHeader, OrderStatus};
use crate::domain::not_blank;
use crate::domain::value_objects::OrderRef;
use crate::store::{OrderStore, StoreError};

pub use handoff::{Handoff, RedirectHandoff, WhatsAppLink};
pub use message::Recipient;

/// The checkout form. Missing fields deserialize blank and fail validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(default)]
pub struct ShippingDetails {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[validate(custom = "not_blank")]
    pub address: String,
    pub phone: Option<String>,
}

impl ShippingDetails {
    pub fn new(name: impl Into<String>, address: impl Into<String>, phone: Option<&str>) -> Self {
        Self { name: name.into(), address: address.into(), phone: phone.map(Into::into) }
    }

    fn phone(&self) -> Option<&str> { self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) }

    fn recipient(&self) -> Recipient<'_> {
        Recipient { name: self.name.trim(), address: self.address.trim(), phone: self.phone() }
    }

    pub fn reset(&mut self) { *self = Self::default(); }
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("shipping details are incomplete: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error("cart is empty")]
    EmptyCart,
    #[error("order could not be saved: {0}")]
    OrderNotSaved(#[source] StoreError),
}

impl CheckoutError {
    /// Message shown to the shopper.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "Mohon lengkapi nama dan alamat pengiriman",
            Self::EmptyCart => "Keranjang belanja kosong",
            Self::OrderNotSaved(_) => "Terjadi kesalahan saat memproses pesanan",
        }
    }

    /// Whether resubmitting the same checkout can succeed.
    pub fn is_retryable(&self) -> bool { matches!(self, Self::OrderNotSaved(_)) }
}

#[derive(Clone, Debug, Serialize)]
pub struct Receipt {
    pub order: OrderHeader,
    pub reference: OrderRef,
    pub message: String,
    pub whatsapp_url: String,
    pub line_items: usize,
    /// False when the header was stored but its line items were not.
    pub line_items_persisted: bool,
}

pub struct CheckoutPipeline {
    orders: Arc<dyn OrderStore>,
    link: WhatsAppLink,
}

impl CheckoutPipeline {
    pub fn new(orders: Arc<dyn OrderStore>, link: WhatsAppLink) -> Self { Self { orders, link } }

    pub fn link(&self) -> &WhatsAppLink { &self.link }

    #[tracing::instrument(skip_all, fields(cart = %cart.key()))]
    pub async fn submit(
        &self,
        cart: &mut CartStore,
        details: &mut ShippingDetails,
        handoff: &dyn Handoff,
    ) -> Result<Receipt, CheckoutError> {
        details.validate()?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let snapshot = cart.snapshot();
        let total = snapshot.total_price();
        let recipient = details.recipient();

        let order = self
            .orders
            .insert_order(NewOrder {
                customer_name: recipient.name.to_string(),
                customer_address: recipient.address.to_string(),
                customer_phone: recipient.phone.map(str::to_string),
                total_amount: total,
                status: OrderStatus::Pending,
                whatsapp_sent: true,
                notes: None,
            })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "order header not saved; cart kept");
                CheckoutError::OrderNotSaved(e)
            })?;
        let reference = order.reference();
        tracing::info!(order_id = %order.id, %reference, total = %total.amount(), "order saved");

        let items = NewOrderItem::from_snapshot(order.id, &snapshot);
        let line_items = items.len();
        let line_items_persisted = match self.orders.insert_order_items(items).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "order items not saved; continuing to hand-off");
                false
            }
        };

        let message = message::compose(&reference, &snapshot, total, recipient);
        let whatsapp_url = self.link.url_for(&message);
        handoff.open(&whatsapp_url);
        tracing::info!(order_id = %order.id, "handed off to whatsapp");

        cart.clear_cart().await;
        details.reset();

        Ok(Receipt { order, reference, message, whatsapp_url, line_items, line_items_persisted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::MemoryCartStorage;
    use crate::domain::aggregates::{NewCartItem, OrderLineItem};
    use crate::domain::value_objects::Price;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use uuid::Uuid;

    /// Memory store that counts writes and fails them on request.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_header: AtomicBool,
        fail_items: AtomicBool,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl OrderStore for FlakyStore {
        async fn insert_order(&self, order: NewOrder) -> Result<OrderHeader, StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_header.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("orders table offline".into()));
            }
            self.inner.insert_order(order).await
        }
        async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_items.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("order_items table offline".into()));
            }
            self.inner.insert_order_items(items).await
        }
        async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<OrderHeader>, StoreError> {
            self.inner.list_orders(status).await
        }
        async fn get_order(&self, id: Uuid) -> Result<Option<OrderHeader>, StoreError> { self.inner.get_order(id).await }
        async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderLineItem>, StoreError> {
            self.inner.order_items(order_id).await
        }
        async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<Option<OrderHeader>, StoreError> {
            self.inner.update_order_status(id, status).await
        }
        async fn orders_since(&self, since: DateTime<Utc>) -> Result<Vec<OrderHeader>, StoreError> {
            self.inner.orders_since(since).await
        }
    }

    async fn cart_with(products: &[(&str, i64)]) -> CartStore {
        let mut cart = CartStore::open(Arc::new(MemoryCartStorage::new()), "cart:test").await;
        for (name, price) in products {
            cart.add_item(NewCartItem { product_id: Uuid::new_v4(), name: (*name).into(), price: Price::from(*price), image_url: None }).await;
        }
        cart
    }

    fn pipeline(store: &Arc<FlakyStore>) -> CheckoutPipeline {
        CheckoutPipeline::new(store.clone(), WhatsAppLink::default())
    }

    #[tokio::test]
    async fn test_checkout_persists_and_hands_off() {
        let store = Arc::new(FlakyStore::default());
        let mut cart = cart_with(&[("Kopi Kapal Api", 5), ("Gula Pasir", 10)]).await;
        let mut details = ShippingDetails::new("Ani", "Jl. X", None);
        let handoff = RedirectHandoff::new();

        let receipt = pipeline(&store).submit(&mut cart, &mut details, &handoff).await.unwrap();

        assert_eq!(receipt.order.total_amount, Price::from(15));
        assert_eq!(receipt.order.status, OrderStatus::Pending);
        assert!(receipt.order.whatsapp_sent);
        assert!(receipt.line_items_persisted);
        let items = store.order_items(receipt.order.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.quantity == 1));
        assert_eq!(items.iter().map(|i| i.line_total()).sum::<Price>(), Price::from(15));

        assert!(receipt.message.contains("Kopi Kapal Api") && receipt.message.contains("Gula Pasir"));
        assert!(receipt.message.contains("Jumlah: 1"));
        assert!(receipt.message.contains("*Total: Rp 15.000*"));
        assert!(receipt.message.contains(&format!("Order ID: {}", receipt.reference)));
        assert_eq!(handoff.target(), Some(receipt.whatsapp_url.as_str()));
        assert!(receipt.whatsapp_url.starts_with("https://wa.me/6281239602221?text=Halo%2C%20saya"));

        assert!(cart.is_empty());
        assert_eq!(details, ShippingDetails::default());
    }

    #[tokio::test]
    async fn test_blank_name_stops_before_any_write() {
        let store = Arc::new(FlakyStore::default());
        let mut cart = cart_with(&[("Sabun", 3)]).await;
        let before = cart.cart().clone();
        let mut details = ShippingDetails::new("   ", "Jl. X", Some("0812"));
        let handoff = RedirectHandoff::new();

        let err = pipeline(&store).submit(&mut cart, &mut details, &handoff).await.unwrap_err();

        assert!(matches!(err, CheckoutError::Invalid(_)));
        assert_eq!(err.user_message(), "Mohon lengkapi nama dan alamat pengiriman");
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert_eq!(cart.cart(), &before);
        assert_eq!(details.address, "Jl. X");
        assert_eq!(handoff.target(), None);
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let store = Arc::new(FlakyStore::default());
        let mut cart = cart_with(&[]).await;
        let mut details = ShippingDetails::new("Ani", "Jl. X", None);
        let err = pipeline(&store).submit(&mut cart, &mut details, &RedirectHandoff::new()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
        assert!(!err.is_retryable());
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_header_failure_keeps_cart_and_skips_handoff() {
        let store = Arc::new(FlakyStore::default());
        store.fail_header.store(true, Ordering::SeqCst);
        let mut cart = cart_with(&[("Susu", 8)]).await;
        let mut details = ShippingDetails::new("Ani", "Jl. X", None);
        let handoff = RedirectHandoff::new();

        let err = pipeline(&store).submit(&mut cart, &mut details, &handoff).await.unwrap_err();

        assert!(matches!(err, CheckoutError::OrderNotSaved(_)));
        assert!(err.is_retryable());
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        assert!(!cart.is_empty());
        assert_eq!(details.name, "Ani");
        assert_eq!(handoff.target(), None);

        store.fail_header.store(false, Ordering::SeqCst);
        let receipt = pipeline(&store).submit(&mut cart, &mut details, &handoff).await.unwrap();
        assert_eq!(receipt.order.total_amount, Price::from(8));
    }

    #[tokio::test]
    async fn test_item_failure_still_hands_off() {
        let store = Arc::new(FlakyStore::default());
        store.fail_items.store(true, Ordering::SeqCst);
        let mut cart = cart_with(&[("Mie", 3), ("Telur", 2)]).await;
        let mut details = ShippingDetails::new(" Ani ", " Jl. X ", Some("  "));
        let handoff = RedirectHandoff::new();

        let receipt = pipeline(&store).submit(&mut cart, &mut details, &handoff).await.unwrap();

        assert!(!receipt.line_items_persisted);
        assert_eq!(receipt.line_items, 2);
        assert!(store.order_items(receipt.order.id).await.unwrap().is_empty());
        assert_eq!(receipt.order.customer_name, "Ani");
        assert_eq!(receipt.order.customer_phone, None);
        assert!(handoff.target().is_some());
        assert!(cart.is_empty());
    }
}
