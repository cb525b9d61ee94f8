//! Postgres-backed store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{category_in_use, category_taken, CatalogStore, OrderStore, StoreError, StoreResult};
use crate::domain::aggregates::{
    Banner, Category, NewBanner, NewCategory, NewOrder, NewOrderItem, NewProduct, OrderHeader, OrderLineItem,
    OrderStatus, Product, ProductFilter,
};
use crate::domain::value_objects::Price;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
    pub fn pool(&self) -> &PgPool { &self.pool }
}

fn to_i32(value: u32, what: &str) -> StoreResult<i32> {
    i32::try_from(value).map_err(|_| StoreError::OutOfRange(format!("{what} {value}")))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

#[async_trait]
impl OrderStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_order(&self, order: NewOrder) -> StoreResult<OrderHeader> {
        let header = sqlx::query_as::<_, OrderHeader>(
            "INSERT INTO orders (id, customer_name, customer_address, customer_phone, total_amount, status, whatsapp_sent, notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW()) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&order.customer_name)
        .bind(&order.customer_address)
        .bind(&order.customer_phone)
        .bind(order.total_amount.amount())
        .bind(order.status.as_str())
        .bind(order.whatsapp_sent)
        .bind(&order.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(header)
    }

    async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> StoreResult<()> {
        if items.is_empty() {
            return Ok(());
        }
        let rows = items
            .into_iter()
            .map(|i| Ok((i.order_id, i.product_id, i.product_name, to_i32(i.quantity, "quantity")?, i.price.amount())))
            .collect::<StoreResult<Vec<_>>>()?;
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("INSERT INTO order_items (id, order_id, product_id, product_name, quantity, price, created_at) ");
        builder.push_values(rows, |mut b, (order_id, product_id, name, quantity, price)| {
            b.push_bind(Uuid::now_v7())
                .push_bind(order_id)
                .push_bind(product_id)
                .push_bind(name)
                .push_bind(quantity)
                .push_bind(price)
                .push("NOW()");
        });
        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<OrderHeader>> {
        let orders = sqlx::query_as::<_, OrderHeader>(
            "SELECT * FROM orders WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at DESC",
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<OrderHeader>> {
        let order = sqlx::query_as::<_, OrderHeader>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    async fn order_items(&self, order_id: Uuid) -> StoreResult<Vec<OrderLineItem>> {
        let items = sqlx::query_as::<_, OrderLineItem>("SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at, id")
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Option<OrderHeader>> {
        let order = sqlx::query_as::<_, OrderHeader>("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    async fn orders_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<OrderHeader>> {
        let orders = sqlx::query_as::<_, OrderHeader>("SELECT * FROM orders WHERE created_at >= $1 ORDER BY created_at DESC")
            .bind(since)
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        let pattern = filter.search_term().map(|s| format!("%{s}%"));
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products \
             WHERE ($1::text IS NULL OR category = $1) \
               AND ($2::text IS NULL OR name ILIKE $2 OR description ILIKE $2) \
             ORDER BY created_at DESC",
        )
        .bind(filter.category())
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn create_product(&self, product: NewProduct) -> StoreResult<Product> {
        let category = product.category_or_default();
        let created = sqlx::query_as::<_, Product>(
            "INSERT INTO products (id, name, description, price, image_url, stock, category, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(product.name.trim())
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(&product.image_url)
        .bind(to_i32(product.stock, "stock")?)
        .bind(category)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_product(&self, id: Uuid, product: NewProduct) -> StoreResult<Option<Product>> {
        let category = product.category_or_default();
        let updated = sqlx::query_as::<_, Product>(
            "UPDATE products SET name = $2, description = $3, price = $4, image_url = $5, stock = $6, category = $7 \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(product.name.trim())
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(&product.image_url)
        .bind(to_i32(product.stock, "stock")?)
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_stock(&self, id: Uuid, stock: u32) -> StoreResult<()> {
        let result = sqlx::query("UPDATE products SET stock = $2 WHERE id = $1")
            .bind(id)
            .bind(to_i32(stock, "stock")?)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("product"));
        }
        Ok(())
    }

    async fn set_price(&self, id: Uuid, price: Price) -> StoreResult<()> {
        let result = sqlx::query("UPDATE products SET price = $2 WHERE id = $1")
            .bind(id)
            .bind(price.amount())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("product"));
        }
        Ok(())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    async fn create_category(&self, category: NewCategory) -> StoreResult<Category> {
        let category = category.normalized();
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name, description, created_at) VALUES ($1, $2, $3, NOW()) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&category.name)
        .bind(&category.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| if is_unique_violation(&e) { category_taken(&category.name) } else { e.into() })
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let name: Option<(String,)> = sqlx::query_as("SELECT name FROM categories WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let (name,) = name.ok_or(StoreError::NotFound("category"))?;
        let (in_use,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM products WHERE category = $1)")
            .bind(&name)
            .fetch_one(&mut *tx)
            .await?;
        if in_use {
            return Err(category_in_use(&name));
        }
        sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_banners(&self, active_only: bool) -> StoreResult<Vec<Banner>> {
        let banners = sqlx::query_as::<_, Banner>(
            "SELECT * FROM banners WHERE (NOT $1 OR is_active) ORDER BY order_index, created_at",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(banners)
    }

    async fn create_banner(&self, banner: NewBanner) -> StoreResult<Banner> {
        let created = sqlx::query_as::<_, Banner>(
            "INSERT INTO banners (id, title, image_url, link_url, is_active, order_index, created_at) \
             VALUES ($1, $2, $3, $4, TRUE, (SELECT COUNT(*)::int FROM banners), NOW()) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&banner.title)
        .bind(&banner.image_url)
        .bind(banner.link_url.filter(|l| !l.trim().is_empty()))
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn toggle_banner(&self, id: Uuid) -> StoreResult<Option<Banner>> {
        let banner = sqlx::query_as::<_, Banner>("UPDATE banners SET is_active = NOT is_active WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(banner)
    }

    async fn delete_banner(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM banners WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
