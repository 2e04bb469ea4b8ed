//! Persistence for users and tickets.
//!
//! [`repositories`] holds the raw SQL, one zero-sized repository per table.
//! [`store::HelpdeskStore`] is the seam the dispatcher depends on; it is
//! implemented by [`store::PgStore`] and, for tests, by
//! [`memory::MemoryStore`].

use sqlx::postgres::PgPoolOptions;

pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

pub use error::StoreError;
pub use store::{HelpdeskStore, PgStore};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
