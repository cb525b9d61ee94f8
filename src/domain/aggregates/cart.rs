//! Cart Aggregate

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::Price;

/// A product as it is offered to the cart. Name, price and image are
/// snapshotted into the line item; the cart never re-reads the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCartItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: Price,
    pub image_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
    pub quantity: u32,
}

impl CartLineItem {
    pub fn line_total(&self) -> Price { self.price.times(self.quantity) }
}

/// Line items keyed by product id, in insertion order.
///
/// Holds at most one line per product and never a line with quantity zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    /// Rebuilds a cart from raw lines, merging duplicate products and
    /// dropping lines whose quantity is zero.
    pub fn from_items(lines: impl IntoIterator<Item = CartLineItem>) -> Self {
        let mut cart = Self::new();
        for line in lines.into_iter().filter(|l| l.quantity > 0) {
            match cart.find_mut(line.product_id) {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
                None => cart.items.push(line),
            }
        }
        cart
    }

    pub fn items(&self) -> &[CartLineItem] { &self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn line_count(&self) -> usize { self.items.len() }
    pub fn get(&self, product_id: Uuid) -> Option<&CartLineItem> { self.items.iter().find(|i| i.product_id == product_id) }

    pub fn add_item(&mut self, product: NewCartItem) {
        if let Some(existing) = self.find_mut(product.product_id) {
            existing.quantity = existing.quantity.saturating_add(1);
        } else {
            self.items.push(CartLineItem {
                product_id: product.product_id,
                name: product.name,
                price: product.price,
                image_url: product.image_url,
                quantity: 1,
            });
        }
    }

    /// Sets the quantity of a line exactly; zero or below removes it.
    /// Returns whether the cart changed. Unknown products are ignored.
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.find_mut(product_id) {
            Some(item) if item.quantity != quantity => { item.quantity = quantity; true }
            _ => false,
        }
    }

    pub fn remove_item(&mut self, product_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) { self.items.clear(); }

    pub fn total_items(&self) -> u64 { self.items.iter().map(|i| u64::from(i.quantity)).sum() }

    pub fn total_price(&self) -> Price { self.items.iter().map(CartLineItem::line_total).sum() }

    pub fn snapshot(&self) -> CartSnapshot { CartSnapshot { items: self.items.clone() } }

    fn find_mut(&mut self, product_id: Uuid) -> Option<&mut CartLineItem> {
        self.items.iter_mut().find(|i| i.product_id == product_id)
    }
}

/// Read-only copy of the cart taken at checkout time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    items: Vec<CartLineItem>,
}

impl CartSnapshot {
    pub fn items(&self) -> &[CartLineItem] { &self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn total_price(&self) -> Price { self.items.iter().map(CartLineItem::line_total).sum() }
}
