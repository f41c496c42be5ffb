//! Database connection pool management.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Type alias for the database pool.
pub type Pool = SqlitePool;

/// Create a new database connection pool.
pub async fn create_pool(database_url: &str) -> Result<Pool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(4)
        .connect(database_url)
        .await
}

/// Create a pool over a private in-memory database.
///
/// Every SQLite connection to `:memory:` opens its own database, so the pool
/// is pinned to one connection that is never recycled.
pub async fn create_memory_pool() -> Result<Pool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}

/// Run database migrations.
pub async fn run_migrations(pool: &Pool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
