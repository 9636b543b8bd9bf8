//! SQLite connection pool wrapper for the storage crate.

use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

const MAX_CONNECTIONS: u32 = 4;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Manages a single SQLite pool.
#[derive(Clone)]
pub struct SqlitePoolManager {
    pool: SqlitePool,
}

impl SqlitePoolManager {
    /// Creates a writable pool; creates the DB file if missing.
    pub async fn new(database_path: &str) -> Result<Self, sqlx::Error> {
        info!(path = %database_path, "Initializing SQLite pool");

        let options = SqliteConnectOptions::new()
            .create_if_missing(true)
            .filename(database_path);

        Self::connect(options).await
    }

    /// Opens an existing database read-only. Fails if the file does not exist.
    pub async fn open_read_only(database_path: &str) -> Result<Self, sqlx::Error> {
        info!(path = %database_path, "Opening SQLite pool (read-only)");

        let options = SqliteConnectOptions::new()
            .create_if_missing(false)
            .read_only(true)
            .filename(database_path);

        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Returns the underlying pool for running queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
