//! Aggregates module
pub mod bulk_edit;
pub mod cart;
pub mod order;
pub mod product;

pub use bulk_edit::{BulkCommitError, BulkEdit, PriceEdit, StockEdit};
pub use cart::{Cart, CartLineItem, CartSnapshot, NewCartItem};
pub use order::{NewOrder, NewOrderItem, OrderDetail, OrderHeader, OrderLineItem, OrderStatus, StatusError};
pub use product::{Banner, Category, NewBanner, NewCategory, NewProduct, Product, ProductFilter, DEFAULT_CATEGORY};
