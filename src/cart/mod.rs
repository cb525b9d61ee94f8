//! Session cart state container.
//!
//! A [`CartStore`] wraps the [`Cart`] aggregate for one shopping session. It is
//! opened from an injected [`CartStorage`], writes itself back after every
//! mutation, and publishes a [`CartSummary`] to subscribers (badge counts).

pub mod sessions;
pub mod storage;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, CartLineItem, CartSnapshot, NewCartItem};
use crate::domain::value_objects::Price;

pub use sessions::{SessionCarts, SessionError};
pub use storage::{CartStorage, FileCartStorage, MemoryCartStorage, StorageError};

const FORMAT_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub total_items: u64,
    pub total_price: Price,
}

impl CartSummary {
    fn of(cart: &Cart) -> Self { Self { total_items: cart.total_items(), total_price: cart.total_price() } }
}

#[derive(Serialize, Deserialize)]
struct PersistedCart {
    version: u32,
    items: Vec<CartLineItem>,
}

pub struct CartStore {
    key: String,
    cart: Cart,
    storage: Arc<dyn CartStorage>,
    summary: watch::Sender<CartSummary>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore").field("key", &self.key).field("cart", &self.cart).finish_non_exhaustive()
    }
}

impl CartStore {
    /// Restores the cart stored under `key`. Missing or unreadable records
    /// start an empty cart.
    pub async fn open(storage: Arc<dyn CartStorage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let cart = match storage.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<PersistedCart>(&raw) {
                Ok(saved) => Cart::from_items(saved.items),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "discarding unreadable cart record");
                    Cart::new()
                }
            },
            Ok(None) => Cart::new(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cart storage unavailable; starting empty");
                Cart::new()
            }
        };
        let (summary, _) = watch::channel(CartSummary::of(&cart));
        Self { key, cart, storage, summary }
    }

    pub fn key(&self) -> &str { &self.key }
    pub fn cart(&self) -> &Cart { &self.cart }
    pub fn items(&self) -> &[CartLineItem] { self.cart.items() }
    pub fn is_empty(&self) -> bool { self.cart.is_empty() }
    pub fn snapshot(&self) -> CartSnapshot { self.cart.snapshot() }
    pub fn total_items(&self) -> u64 { self.cart.total_items() }
    pub fn total_price(&self) -> Price { self.cart.total_price() }
    pub fn summary(&self) -> CartSummary { CartSummary::of(&self.cart) }

    pub fn subscribe(&self) -> watch::Receiver<CartSummary> { self.summary.subscribe() }

    pub async fn add_item(&mut self, product: NewCartItem) {
        self.cart.add_item(product);
        self.commit().await;
    }

    pub async fn update_quantity(&mut self, product_id: Uuid, quantity: i64) {
        if self.cart.update_quantity(product_id, quantity) {
            self.commit().await;
        }
    }

    pub async fn remove_item(&mut self, product_id: Uuid) {
        if self.cart.remove_item(product_id) {
            self.commit().await;
        }
    }

    pub async fn clear_cart(&mut self) {
        self.cart.clear();
        self.commit().await;
    }

    /// Ends the session's use of this store, returning what was in the cart.
    pub fn close(self) -> Cart { self.cart }

    async fn commit(&mut self) {
        self.summary.send_replace(CartSummary::of(&self.cart));
        if self.cart.is_empty() {
            if let Err(e) = self.storage.remove(&self.key).await {
                tracing::warn!(key = %self.key, error = %e, "failed to drop empty cart record");
            }
            return;
        }
        let record = PersistedCart { version: FORMAT_VERSION, items: self.cart.items().to_vec() };
        let raw = match serde_json::to_string(&record) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(key = %self.key, error = %e, "failed to encode cart");
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.key, raw).await {
            tracing::warn!(key = %self.key, error = %e, "failed to persist cart");
        }
    }
}
