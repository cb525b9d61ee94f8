//! One cart store per shopping session.
//!
//! Stores are opened lazily and evicted once idle or when the map is full.
//! Every mutation is already persisted, so an evicted session reopens from
//! its storage record on the next request.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{CartStorage, CartStore};
use crate::domain::aggregates::Cart;

const MAX_SESSION_LEN: usize = 64;
pub const DEFAULT_MAX_OPEN: usize = 1024;
pub const DEFAULT_IDLE: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session id must be 1-64 characters of letters, digits, '-' or '_'")]
    InvalidId,
}

struct OpenCart {
    store: Arc<Mutex<CartStore>>,
    touched: Instant,
}

impl OpenCart {
    /// Held by a request right now.
    fn in_use(&self) -> bool { Arc::strong_count(&self.store) > 1 }
}

/// Lazily opened cart stores, each behind its own lock so sessions never
/// wait on each other.
pub struct SessionCarts {
    storage: Arc<dyn CartStorage>,
    open: Mutex<HashMap<String, OpenCart>>,
    max_open: usize,
    idle: Duration,
}

impl SessionCarts {
    pub fn new(storage: Arc<dyn CartStorage>) -> Self { Self::with_limits(storage, DEFAULT_MAX_OPEN, DEFAULT_IDLE) }

    /// `max_open` is a soft cap: stores held by in-flight requests are never evicted.
    pub fn with_limits(storage: Arc<dyn CartStorage>, max_open: usize, idle: Duration) -> Self {
        Self { storage, open: Mutex::new(HashMap::new()), max_open: max_open.max(1), idle }
    }

    pub fn validate_id(session: &str) -> Result<(), SessionError> {
        let valid = !session.is_empty()
            && session.len() <= MAX_SESSION_LEN
            && session.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid { Ok(()) } else { Err(SessionError::InvalidId) }
    }

    pub async fn session(&self, session: &str) -> Result<Arc<Mutex<CartStore>>, SessionError> {
        Self::validate_id(session)?;
        let now = Instant::now();
        let mut open = self.open.lock().await;
        if let Some(entry) = open.get_mut(session) {
            entry.touched = now;
            return Ok(entry.store.clone());
        }
        self.evict(&mut open, now);
        let store = CartStore::open(self.storage.clone(), format!("cart:{session}")).await;
        tracing::debug!(session, items = store.total_items(), "opened cart session");
        let store = Arc::new(Mutex::new(store));
        open.insert(session.to_string(), OpenCart { store: store.clone(), touched: now });
        Ok(store)
    }

    /// Drops the in-memory store for `session`. Its persisted record stays.
    pub async fn end(&self, session: &str) -> Option<Cart> {
        let entry = self.open.lock().await.remove(session)?;
        let cart = entry.store.lock().await.cart().clone();
        tracing::debug!(session, "ended cart session");
        Some(cart)
    }

    pub async fn open_sessions(&self) -> usize { self.open.lock().await.len() }

    /// Drops idle stores, then the least recently touched ones until a new store fits.
    fn evict(&self, open: &mut HashMap<String, OpenCart>, now: Instant) {
        let before = open.len();
        open.retain(|_, entry| entry.in_use() || now.duration_since(entry.touched) < self.idle);
        while open.len() >= self.max_open {
            let oldest = open
                .iter()
                .filter(|(_, entry)| !entry.in_use())
                .min_by_key(|(_, entry)| entry.touched)
                .map(|(session, _)| session.clone());
            let Some(oldest) = oldest else { break };
            open.remove(&oldest);
        }
        let evicted = before - open.len();
        if evicted > 0 {
            tracing::debug!(evicted, open = open.len(), "evicted cart sessions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::MemoryCartStorage;
    use crate::domain::aggregates::NewCartItem;
    use crate::domain::value_objects::Price;
    use uuid::Uuid;

    #[test]
    fn test_session_ids() {
        assert!(SessionCarts::validate_id("abc-123_X").is_ok());
        assert_eq!(SessionCarts::validate_id(""), Err(SessionError::InvalidId));
        assert_eq!(SessionCarts::validate_id("../etc"), Err(SessionError::InvalidId));
        assert_eq!(SessionCarts::validate_id(&"a".repeat(65)), Err(SessionError::InvalidId));
    }

    #[tokio::test]
    async fn test_sessions_are_independent_and_restorable() {
        let carts = SessionCarts::new(Arc::new(MemoryCartStorage::new()));
        let item = NewCartItem { product_id: Uuid::new_v4(), name: "Garam".into(), price: Price::from(2), image_url: None };
        carts.session("a").await.unwrap().lock().await.add_item(item).await;
        assert!(carts.session("b").await.unwrap().lock().await.is_empty());
        assert_eq!(carts.open_sessions().await, 2);

        let ended = carts.end("a").await.unwrap();
        assert_eq!(ended.total_items(), 1);
        assert_eq!(carts.session("a").await.unwrap().lock().await.total_items(), 1);
    }

    #[tokio::test]
    async fn test_open_sessions_stay_bounded() {
        let storage = Arc::new(MemoryCartStorage::new());
        let carts = SessionCarts::with_limits(storage.clone(), 8, DEFAULT_IDLE);
        let item = NewCartItem { product_id: Uuid::new_v4(), name: "Garam".into(), price: Price::from(2), image_url: None };
        carts.session("first").await.unwrap().lock().await.add_item(item).await;
        for i in 0..200 {
            carts.session(&format!("s{i}")).await.unwrap();
        }
        assert!(carts.open_sessions().await <= 8);
        // Evicted sessions come back from storage.
        assert_eq!(carts.session("first").await.unwrap().lock().await.total_items(), 1);
        assert_eq!(storage.record_count().await, 1);
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted_but_held_ones_stay() {
        let carts = SessionCarts::with_limits(Arc::new(MemoryCartStorage::new()), 100, Duration::ZERO);
        let held = carts.session("held").await.unwrap();
        carts.session("a").await.unwrap();
        carts.session("b").await.unwrap();
        assert_eq!(carts.open_sessions().await, 2);
        assert!(Arc::ptr_eq(&held, &carts.session("held").await.unwrap()));
    }
}
