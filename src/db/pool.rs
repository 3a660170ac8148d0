use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;
use crate::db::store::{Store, StoreError};

pub async fn get_db_pool(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(2)
        .idle_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Postgres when `DATABASE_URL` is set (migrated on connect), otherwise the in-memory store.
pub async fn open_store(config: &Config) -> Result<Store, StoreError> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; bookings are kept in memory and lost on restart");
        return Ok(Store::in_memory());
    };

    let pool = get_db_pool(database_url, config.max_connections).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!(max_connections = config.max_connections, "🛢️ Database connected and migrated");
    Ok(Store::Postgres(pool))
}
