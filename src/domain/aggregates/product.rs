//! Catalog Aggregates: products, categories and promo banners

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};
use crate::domain::aggregates::cart::NewCartItem;
use crate::domain::not_blank;
use crate::domain::value_objects::Price;

pub const DEFAULT_CATEGORY: &str = "Lainnya";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(try_from = "rust_decimal::Decimal")]
    pub price: Price,
    pub image_url: Option<String>,
    #[sqlx(try_from = "i32")]
    pub stock: u32,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn is_in_stock(&self) -> bool { self.stock > 0 }

    /// What the cart keeps of this product: name, current price and image.
    pub fn to_cart_item(&self) -> NewCartItem {
        NewCartItem { product_id: self.id, name: self.name.clone(), price: self.price, image_url: self.image_url.clone() }
    }

    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.as_deref().is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(custom = "not_blank")]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom = "non_negative_price")]
    pub price: Price,
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock: u32,
    pub category: Option<String>,
}

impl NewProduct {
    pub fn category_or_default(&self) -> String {
        self.category.as_deref().map(str::trim).filter(|c| !c.is_empty()).unwrap_or(DEFAULT_CATEGORY).to_string()
    }
}

fn non_negative_price(price: &Price) -> Result<(), ValidationError> {
    if price.is_negative() { Err(ValidationError::new("negative_price")) } else { Ok(()) }
}

/// Catalog listing filter. Search terms shorter than two characters are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
}

impl ProductFilter {
    pub const MIN_SEARCH_LEN: usize = 2;

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| s.chars().count() >= Self::MIN_SEARCH_LEN)
    }

    pub fn category(&self) -> Option<&str> { self.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) }

    pub fn matches(&self, product: &Product) -> bool {
        self.category().map_or(true, |c| product.category == c) && self.search_term().map_or(true, |s| product.matches_search(s))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewCategory {
    #[validate(custom = "not_blank")]
    pub name: String,
    pub description: Option<String>,
}

impl NewCategory {
    /// Trimmed name, and a description only when it has content.
    pub fn normalized(self) -> Self {
        let description = self.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
        Self { name: self.name.trim().to_string(), description }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Banner {
    pub id: Uuid,
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub is_active: bool,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewBanner {
    #[validate(custom = "not_blank")]
    pub title: String,
    #[validate(custom = "not_blank")]
    pub image_url: String,
    pub link_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, description: Option<&str>, category: &str) -> Product {
        Product {
            id: Uuid::new_v4(), name: name.into(), description: description.map(Into::into), price: Price::from(5),
            image_url: None, stock: 3, category: category.into(), created_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_by_search_and_category() {
        let beras = product("Beras Pandan Wangi", Some("Beras premium 5kg"), "Sembako");
        let sabun = product("Sabun Mandi", None, "Kebersihan");
        let filter = ProductFilter { search: Some("PANDAN".into()), category: None };
        assert!(filter.matches(&beras));
        assert!(!filter.matches(&sabun));

        let by_description = ProductFilter { search: Some("premium".into()), category: Some("Sembako".into()) };
        assert!(by_description.matches(&beras));

        let short = ProductFilter { search: Some("x".into()), category: Some("Kebersihan".into()) };
        assert!(short.matches(&sabun));
        assert!(!short.matches(&beras));
    }

    #[test]
    fn test_new_product_validation() {
        let valid = NewProduct { name: "Kecap".into(), description: None, price: Price::from(8), image_url: None, stock: 0, category: Some("  ".into()) };
        assert!(valid.validate().is_ok());
        assert_eq!(valid.category_or_default(), DEFAULT_CATEGORY);

        let blank = NewProduct { name: "  ".into(), price: Price::from(-1), ..valid };
        let errors = blank.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("price"));
    }

    #[test]
    fn test_category_normalized() {
        let c = NewCategory { name: "  Minuman ".into(), description: Some("   ".into()) }.normalized();
        assert_eq!(c.name, "Minuman");
        assert_eq!(c.description, None);
    }
}
