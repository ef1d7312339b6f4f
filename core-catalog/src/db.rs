//! SQLite pool setup for the catalog database.
//!
//! Pools are opened in WAL mode with foreign keys on, the embedded
//! schema is applied on startup, and a probe query verifies the pool
//! before it is handed out. Tables are created under
//! [`DEFAULT_TABLE_PREFIX`]; statements reach them through the
//! `*PREFIX*` token, which [`crate::adapters::SqliteStore`] renders
//! with the configured prefix.
//!
//! ```rust,ignore
//! let config = DatabaseConfig::new("medley.db").connections(1, 8);
//! let store = SqliteStore::connect(config).await?;
//! let mapper = AlbumMapper::new(Arc::new(store));
//! let albums = mapper.find_all("john").await?;
//! ```

use crate::error::{CatalogError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default table-name prefix substituted for the `*PREFIX*` token.
///
/// The bundled migrations create tables under this prefix.
pub const DEFAULT_TABLE_PREFIX: &str = "ml_";

/// SQLite pool configuration for the catalog database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `sqlite:` URL, `sqlite::memory:` for an in-memory database.
    pub url: String,
    /// Pool size bounds.
    pub min_connections: u32,
    pub max_connections: u32,
    /// How long `acquire` may wait for a free connection.
    pub acquire_timeout: Duration,
    /// Recycle connections older than this.
    pub max_lifetime: Option<Duration>,
    /// Close connections idle longer than this.
    pub idle_timeout: Option<Duration>,
    /// Prepared statements cached per connection.
    pub statement_cache_capacity: usize,
    /// Table-name prefix rendered into the `*PREFIX*` token. Must match
    /// the prefix the schema was created with.
    pub table_prefix: String,
}

impl DatabaseConfig {
    /// Configuration for a database file at `database_path`.
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            url: format!("sqlite:{}", database_path.into().display()),
            min_connections: 1,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: Some(Duration::from_secs(30 * 60)),
            idle_timeout: Some(Duration::from_secs(10 * 60)),
            statement_cache_capacity: 100,
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
        }
    }

    /// Configuration for an in-memory database, as used by the tests.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            // Every pooled connection to `sqlite::memory:` opens its own
            // database, so the migrated schema is only visible if the
            // pool never grows past one connection.
            min_connections: 1,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: None,
            idle_timeout: None,
            statement_cache_capacity: 100,
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
        }
    }

    /// Pool size bounds.
    pub fn connections(mut self, min: u32, max: u32) -> Self {
        self.min_connections = min;
        self.max_connections = max;
        self
    }

    /// How long `acquire` may wait for a free connection.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Connection recycling bounds; `None` keeps connections until the
    /// pool closes.
    pub fn lifetimes(
        mut self,
        max_lifetime: Option<Duration>,
        idle_timeout: Option<Duration>,
    ) -> Self {
        self.max_lifetime = max_lifetime;
        self.idle_timeout = idle_timeout;
        self
    }

    /// Prepared statements cached per connection.
    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = capacity;
        self
    }

    /// Table-name prefix rendered into the `*PREFIX*` token.
    pub fn table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn connect_options(config: &DatabaseConfig) -> Result<SqliteConnectOptions> {
    let options = SqliteConnectOptions::from_str(&config.url)
        .map_err(CatalogError::Database)?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .create_if_missing(true)
        // Negative cache_size is KiB (64 MB); mmap_size is bytes (256 MB).
        .pragma("cache_size", "-64000")
        .pragma("mmap_size", "268435456")
        .pragma("auto_vacuum", "INCREMENTAL")
        .statement_cache_capacity(config.statement_cache_capacity);
    Ok(options)
}

/// Open a connection pool, apply the embedded schema, and probe it.
///
/// # Errors
///
/// Returns an error when the database cannot be opened, a migration
/// fails to apply, or the probe query fails.
pub async fn create_pool(config: DatabaseConfig) -> Result<Pool<Sqlite>> {
    info!(
        url = %config.url,
        min_connections = config.min_connections,
        max_connections = config.max_connections,
        "Opening catalog database"
    );

    let pool = SqlitePoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .connect_with(connect_options(&config)?)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to open catalog database");
            CatalogError::Database(e)
        })?;

    run_migrations(&pool).await?;
    health_check(&pool).await?;

    info!(connections = pool.size(), "Catalog database ready");
    Ok(pool)
}

/// In-memory pool with the schema applied, for tests.
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    create_pool(DatabaseConfig::in_memory()).await
}

/// Apply the embedded schema. Migration files are compiled in via
/// `sqlx::migrate!`.
async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    info!("Applying catalog migrations");

    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        warn!(error = %e, "Migration failed");
        CatalogError::Migration(e.to_string())
    })?;

    debug!("Catalog migrations up to date");
    Ok(())
}

/// One-row probe verifying the pool hands out usable connections.
async fn health_check(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| {
        warn!(error = %e, "Database health check failed");
        CatalogError::Database(e)
    })?;

    debug!("Database health check passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_config_stays_on_one_connection() {
        let config = DatabaseConfig::in_memory();
        assert_eq!((config.min_connections, config.max_connections), (1, 1));
    }

    #[test]
    fn builder_overrides_stick() {
        let config = DatabaseConfig::new("catalog.db")
            .connections(2, 10)
            .acquire_timeout(Duration::from_secs(60))
            .lifetimes(None, Some(Duration::from_secs(120)))
            .statement_cache_capacity(200)
            .table_prefix("other_");

        assert_eq!(config.url, "sqlite:catalog.db");
        assert_eq!((config.min_connections, config.max_connections), (2, 10));
        assert_eq!(config.acquire_timeout, Duration::from_secs(60));
        assert_eq!(config.max_lifetime, None);
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.statement_cache_capacity, 200);
        assert_eq!(config.table_prefix, "other_");
    }

    #[tokio::test]
    async fn in_memory_pool_comes_up_migrated() {
        let pool = create_test_pool().await.unwrap();

        let (tables,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
             AND name IN ('ml_albums', 'ml_album_artists', 'ml_tracks', 'ml_files')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(tables, 4);
    }

    #[tokio::test]
    async fn health_check_passes_on_a_fresh_pool() {
        let pool = create_test_pool().await.unwrap();
        health_check(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let pool = create_test_pool().await.unwrap();

        let (enabled,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn journal_mode_matches_the_database_kind() {
        let pool = create_test_pool().await.unwrap();

        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        // In-memory databases report "memory"; file databases get WAL.
        assert!(matches!(mode.to_lowercase().as_str(), "wal" | "memory"));
    }

    #[tokio::test]
    async fn concurrent_queries_share_the_pool() {
        let pool = create_test_pool().await.unwrap();

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    sqlx::query("SELECT 1").fetch_one(&pool).await.unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }
    }
}
