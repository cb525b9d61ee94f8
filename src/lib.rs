//! Toserba WS Pedak storefront
//!
//! Neighbourhood grocery storefront: catalog browsing, a per-session cart,
//! and checkout through WhatsApp.
//!
//! ## Features
//! - Product catalog with categories and promo banners
//! - Session carts persisted to memory or disk
//! - Order submission: store the order, then hand off to WhatsApp
//! - Back-office: products, bulk stock/price edits, order status, sales report

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod events;
pub mod reports;
pub mod store;
pub mod telemetry;

pub use cart::{CartStore, SessionCarts};
pub use checkout::{CheckoutError, CheckoutPipeline, Receipt, ShippingDetails};
pub use config::{Config, ConfigError};
pub use domain::value_objects::{OrderRef, Price};
pub use store::{CatalogStore, MemoryStore, OrderStore, PgStore, StoreError};
