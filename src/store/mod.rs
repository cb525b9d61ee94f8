//! Persistence seams for orders and the catalog.
//!
//! The checkout pipeline and the HTTP layer only see these traits; the
//! service runs on [`PgStore`], tests and local runs on [`MemoryStore`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::aggregates::{
    Banner, Category, NewBanner, NewCategory, NewOrder, NewOrderItem, NewProduct, OrderHeader, OrderLineItem,
    OrderStatus, Product, ProductFilter,
};
use crate::domain::value_objects::Price;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("value out of range for storage: {0}")]
    OutOfRange(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Cheap liveness probe for the health endpoint.
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
    /// Inserts one order header and returns it as stored.
    async fn insert_order(&self, order: NewOrder) -> StoreResult<OrderHeader>;
    /// Inserts all line items in a single write.
    async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> StoreResult<()>;
    async fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<OrderHeader>>;
    async fn get_order(&self, id: Uuid) -> StoreResult<Option<OrderHeader>>;
    async fn order_items(&self, order_id: Uuid) -> StoreResult<Vec<OrderLineItem>>;
    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Option<OrderHeader>>;
    async fn orders_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<OrderHeader>>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>>;
    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>>;
    async fn create_product(&self, product: NewProduct) -> StoreResult<Product>;
    async fn update_product(&self, id: Uuid, product: NewProduct) -> StoreResult<Option<Product>>;
    async fn delete_product(&self, id: Uuid) -> StoreResult<bool>;
    async fn set_stock(&self, id: Uuid, stock: u32) -> StoreResult<()>;
    async fn set_price(&self, id: Uuid, price: Price) -> StoreResult<()>;

    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn create_category(&self, category: NewCategory) -> StoreResult<Category>;
    /// Refuses with [`StoreError::Conflict`] while products still use the category.
    async fn delete_category(&self, id: Uuid) -> StoreResult<()>;

    async fn list_banners(&self, active_only: bool) -> StoreResult<Vec<Banner>>;
    async fn create_banner(&self, banner: NewBanner) -> StoreResult<Banner>;
    async fn toggle_banner(&self, id: Uuid) -> StoreResult<Option<Banner>>;
    async fn delete_banner(&self, id: Uuid) -> StoreResult<bool>;
}

pub(crate) fn category_taken(name: &str) -> StoreError {
    StoreError::Conflict(format!("category `{name}` already exists"))
}

pub(crate) fn category_in_use(name: &str) -> StoreError {
    StoreError::Conflict(format!("category `{name}` is still used by products"))
}
