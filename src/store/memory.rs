//! In-process store backing the unit and HTTP tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{category_in_use, category_taken, CatalogStore, OrderStore, StoreError, StoreResult};
use crate::domain::aggregates::{
    Banner, Category, NewBanner, NewCategory, NewOrder, NewOrderItem, NewProduct, OrderHeader, OrderLineItem,
    OrderStatus, Product, ProductFilter,
};
use crate::domain::value_objects::Price;

#[derive(Debug, Default)]
struct Tables {
    products: Vec<Product>,
    categories: Vec<Category>,
    banners: Vec<Banner>,
    orders: Vec<OrderHeader>,
    order_items: Vec<OrderLineItem>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: NewOrder) -> StoreResult<OrderHeader> {
        let now = Utc::now();
        let header = OrderHeader {
            id: Uuid::now_v7(),
            customer_name: order.customer_name,
            customer_address: order.customer_address,
            customer_phone: order.customer_phone,
            total_amount: order.total_amount,
            status: order.status,
            whatsapp_sent: order.whatsapp_sent,
            notes: order.notes,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.orders.push(header.clone());
        Ok(header)
    }

    async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(missing) = items.iter().find(|i| !tables.orders.iter().any(|o| o.id == i.order_id)) {
            return Err(StoreError::Conflict(format!("order {} does not exist", missing.order_id)));
        }
        let now = Utc::now();
        tables.order_items.extend(items.into_iter().map(|i| OrderLineItem {
            id: Uuid::now_v7(),
            order_id: i.order_id,
            product_id: i.product_id,
            product_name: i.product_name,
            quantity: i.quantity,
            price: i.price,
            created_at: now,
        }));
        Ok(())
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<OrderHeader>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.iter().rev().filter(|o| status.map_or(true, |s| o.status == s)).cloned().collect())
    }

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<OrderHeader>> {
        Ok(self.tables.read().await.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn order_items(&self, order_id: Uuid) -> StoreResult<Vec<OrderLineItem>> {
        Ok(self.tables.read().await.order_items.iter().filter(|i| i.order_id == order_id).cloned().collect())
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Option<OrderHeader>> {
        let mut tables = self.tables.write().await;
        let Some(order) = tables.orders.iter_mut().find(|o| o.id == id) else { return Ok(None) };
        order.status = status;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn orders_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<OrderHeader>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.iter().rev().filter(|o| o.created_at >= since).cloned().collect())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(tables.products.iter().rev().filter(|p| filter.matches(p)).cloned().collect())
    }

    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.tables.read().await.products.iter().find(|p| p.id == id).cloned())
    }

    async fn create_product(&self, product: NewProduct) -> StoreResult<Product> {
        let category = product.category_or_default();
        let created = Product {
            id: Uuid::now_v7(),
            name: product.name.trim().to_string(),
            description: product.description,
            price: product.price,
            image_url: product.image_url,
            stock: product.stock,
            category,
            created_at: Utc::now(),
        };
        self.tables.write().await.products.push(created.clone());
        Ok(created)
    }

    async fn update_product(&self, id: Uuid, product: NewProduct) -> StoreResult<Option<Product>> {
        let category = product.category_or_default();
        let mut tables = self.tables.write().await;
        let Some(existing) = tables.products.iter_mut().find(|p| p.id == id) else { return Ok(None) };
        existing.name = product.name.trim().to_string();
        existing.description = product.description;
        existing.price = product.price;
        existing.image_url = product.image_url;
        existing.stock = product.stock;
        existing.category = category;
        Ok(Some(existing.clone()))
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.products.len();
        tables.products.retain(|p| p.id != id);
        let removed = tables.products.len() != before;
        if removed {
            for item in tables.order_items.iter_mut().filter(|i| i.product_id == Some(id)) {
                item.product_id = None;
            }
        }
        Ok(removed)
    }

    async fn set_stock(&self, id: Uuid, stock: u32) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let product = tables.products.iter_mut().find(|p| p.id == id).ok_or(StoreError::NotFound("product"))?;
        product.stock = stock;
        Ok(())
    }

    async fn set_price(&self, id: Uuid, price: Price) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let product = tables.products.iter_mut().find(|p| p.id == id).ok_or(StoreError::NotFound("product"))?;
        product.price = price;
        Ok(())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut categories = self.tables.read().await.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn create_category(&self, category: NewCategory) -> StoreResult<Category> {
        let category = category.normalized();
        let mut tables = self.tables.write().await;
        if tables.categories.iter().any(|c| c.name == category.name) {
            return Err(category_taken(&category.name));
        }
        let created = Category { id: Uuid::now_v7(), name: category.name, description: category.description, created_at: Utc::now() };
        tables.categories.push(created.clone());
        Ok(created)
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let name = tables.categories.iter().find(|c| c.id == id).map(|c| c.name.clone()).ok_or(StoreError::NotFound("category"))?;
        if tables.products.iter().any(|p| p.category == name) {
            return Err(category_in_use(&name));
        }
        tables.categories.retain(|c| c.id != id);
        Ok(())
    }

    async fn list_banners(&self, active_only: bool) -> StoreResult<Vec<Banner>> {
        let mut banners: Vec<Banner> = self.tables.read().await.banners.iter().filter(|b| !active_only || b.is_active).cloned().collect();
        banners.sort_by_key(|b| b.order_index);
        Ok(banners)
    }

    async fn create_banner(&self, banner: NewBanner) -> StoreResult<Banner> {
        let mut tables = self.tables.write().await;
        let order_index = i32::try_from(tables.banners.len()).map_err(|e| StoreError::OutOfRange(e.to_string()))?;
        let created = Banner {
            id: Uuid::now_v7(),
            title: banner.title,
            image_url: banner.image_url,
            link_url: banner.link_url.filter(|l| !l.trim().is_empty()),
            is_active: true,
            order_index,
            created_at: Utc::now(),
        };
        tables.banners.push(created.clone());
        Ok(created)
    }

    async fn toggle_banner(&self, id: Uuid) -> StoreResult<Option<Banner>> {
        let mut tables = self.tables.write().await;
        let Some(banner) = tables.banners.iter_mut().find(|b| b.id == id) else { return Ok(None) };
        banner.is_active = !banner.is_active;
        Ok(Some(banner.clone()))
    }

    async fn delete_banner(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.banners.len();
        tables.banners.retain(|b| b.id != id);
        Ok(tables.banners.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product(name: &str, category: Option<&str>) -> NewProduct {
        NewProduct { name: name.into(), description: None, price: Price::from(5), image_url: None, stock: 4, category: category.map(Into::into) }
    }

    #[tokio::test]
    async fn test_category_rules() {
        let store = MemoryStore::new();
        let minuman = store.create_category(NewCategory { name: " Minuman ".into(), description: None }).await.unwrap();
        assert_eq!(minuman.name, "Minuman");
        assert!(matches!(store.create_category(NewCategory { name: "Minuman".into(), description: None }).await, Err(StoreError::Conflict(_))));

        let teh = store.create_product(new_product("Teh Botol", Some("Minuman"))).await.unwrap();
        assert!(matches!(store.delete_category(minuman.id).await, Err(StoreError::Conflict(_))));
        store.delete_product(teh.id).await.unwrap();
        store.delete_category(minuman.id).await.unwrap();
        assert!(store.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_product_keeps_order_history() {
        let store = MemoryStore::new();
        let p = store.create_product(new_product("Sarden", None)).await.unwrap();
        assert_eq!(p.category, "Lainnya");
        let order = store
            .insert_order(NewOrder {
                customer_name: "Budi".into(), customer_address: "Jl. Y".into(), customer_phone: None,
                total_amount: Price::from(5), status: OrderStatus::Pending, whatsapp_sent: true, notes: None,
            })
            .await
            .unwrap();
        store
            .insert_order_items(vec![NewOrderItem { order_id: order.id, product_id: Some(p.id), product_name: "Sarden".into(), quantity: 1, price: Price::from(5) }])
            .await
            .unwrap();
        assert!(store.delete_product(p.id).await.unwrap());
        let items = store.order_items(order.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, None);
        assert_eq!(items[0].product_name, "Sarden");
    }

    #[tokio::test]
    async fn test_banners_append_and_toggle() {
        let store = MemoryStore::new();
        let banner = |t: &str| NewBanner { title: t.into(), image_url: format!("/{t}.jpg"), link_url: Some(String::new()) };
        let first = store.create_banner(banner("promo")).await.unwrap();
        let second = store.create_banner(banner("lebaran")).await.unwrap();
        assert_eq!((first.order_index, second.order_index), (0, 1));
        assert_eq!(first.link_url, None);
        store.toggle_banner(first.id).await.unwrap();
        let active = store.list_banners(true).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);
    }
}
