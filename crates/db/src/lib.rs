//! Verso persistence: version models, the store abstraction with in-memory
//! and Postgres implementations, and the [`VersionManager`] engine on top.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod manager;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

pub use manager::VersionManager;
pub use memory::MemoryVersionStore;
pub use repositories::PgVersionStore;
pub use store::VersionStore;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
///
/// Acquisition times out quickly so an unreachable database surfaces as a
/// store error instead of a hung request.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Run a trivial query to verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
