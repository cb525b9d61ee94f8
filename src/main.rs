//! Toserba WS Pedak storefront service

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use toserba_storefront::api::{self, AppState};
use toserba_storefront::cart::{CartStorage, FileCartStorage, MemoryCartStorage, SessionCarts};
use toserba_storefront::checkout::{CheckoutPipeline, WhatsAppLink};
use toserba_storefront::events::EventPublisher;
use toserba_storefront::{telemetry, Config, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    telemetry::init();

    let db = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("connecting to postgres")?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let events = EventPublisher::connect(config.nats_url.as_deref()).await;
    let cart_storage: Arc<dyn CartStorage> = match &config.cart_storage_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "persisting carts to disk");
            Arc::new(FileCartStorage::open(dir).await?)
        }
        None => Arc::new(MemoryCartStorage::new()),
    };

    let store = Arc::new(PgStore::new(db));
    let link = WhatsAppLink::new(config.whatsapp_host.clone(), config.whatsapp_number.clone());
    let state = AppState {
        orders: store.clone(),
        catalog: store.clone(),
        carts: Arc::new(SessionCarts::with_limits(cart_storage, config.cart_max_sessions, config.cart_idle_timeout)),
        checkout: Arc::new(CheckoutPipeline::new(store, link)),
        events,
    };

    let addr = config.bind_addr();
    tracing::info!("🚀 Toserba storefront listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, api::router(state)).await?;
    Ok(())
}
