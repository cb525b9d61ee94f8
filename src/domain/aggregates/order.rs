//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use crate::domain::aggregates::cart::CartSnapshot;
use crate::domain::value_objects::{OrderRef, Price};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        Self::Pending, Self::Confirmed, Self::Processing, Self::Shipped, Self::Delivered, Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }

    /// Checks an admin status change. Re-applying the current status is allowed.
    pub fn transition_to(self, next: OrderStatus) -> Result<OrderStatus, StatusError> {
        if self != next && self.is_terminal() {
            return Err(StatusError::Terminal { from: self, to: next });
        }
        Ok(next)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = StatusError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|st| st.as_str() == s).ok_or_else(|| StatusError::Unknown(s.to_string()))
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = StatusError;
    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    #[error("unknown order status `{0}`")]
    Unknown(String),
    #[error("order is {from}; it cannot move to {to}")]
    Terminal { from: OrderStatus, to: OrderStatus },
}

/// Persisted order header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderHeader {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_phone: Option<String>,
    #[sqlx(try_from = "rust_decimal::Decimal")]
    pub total_amount: Price,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub whatsapp_sent: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderHeader {
    pub fn reference(&self) -> OrderRef { OrderRef::from_order_id(&self.id) }
}

/// Persisted order line. Written once, right after its header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderLineItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    #[sqlx(try_from = "i32")]
    pub quantity: u32,
    #[sqlx(try_from = "rust_decimal::Decimal")]
    pub price: Price,
    pub created_at: DateTime<Utc>,
}

impl OrderLineItem {
    pub fn line_total(&self) -> Price { self.price.times(self.quantity) }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_address: String,
    pub customer_phone: Option<String>,
    pub total_amount: Price,
    pub status: OrderStatus,
    pub whatsapp_sent: bool,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrderItem {
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: u32,
    pub price: Price,
}

impl NewOrderItem {
    /// One row per cart line, pointing at `order_id`.
    pub fn from_snapshot(order_id: Uuid, snapshot: &CartSnapshot) -> Vec<NewOrderItem> {
        snapshot
            .items()
            .iter()
            .map(|line| NewOrderItem {
                order_id,
                product_id: Some(line.product_id),
                product_name: line.name.clone(),
                quantity: line.quantity,
                price: line.price,
            })
            .collect()
    }
}

/// An order header together with its line items.
#[derive(Clone, Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: OrderHeader,
    pub reference: OrderRef,
    pub items: Vec<OrderLineItem>,
}
