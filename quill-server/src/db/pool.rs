//! Database connection pool management

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Default maximum connections for the pool.
/// Kept low for single-author serving.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Create a SQLite connection pool, creating the database file if needed.
///
/// # Arguments
///
/// * `database_url` - SQLite connection string, e.g. `sqlite://quill.db`
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(DEFAULT_MAX_CONNECTIONS)
        .connect_with(options)
        .await
}

/// Single-connection in-memory pool.
///
/// Each SQLite `:memory:` connection is its own database, so the pool is
/// capped at one connection. Used by the test suites.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
}
