//! # Stores
//!
//! Listings, orders and image blobs live in the document store; user
//! accounts live in a separate account store. Each gets its own pool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Two Stores, Two Pools                              │
//! │                                                                         │
//! │  harvest-api startup                                                    │
//! │       │                                                                 │
//! │       ├── DbConfig::new(DOCUMENT_DB_PATH)                               │
//! │       │        │                                                        │
//! │       │        ▼                                                        │
//! │       │   DocumentStore::new ──► SqlitePool + documents migrations      │
//! │       │        products() / orders() / images()                         │
//! │       │                                                                 │
//! │       └── DbConfig::new(ACCOUNT_DB_PATH)                                │
//! │                │                                                        │
//! │                ▼                                                        │
//! │           AccountStore::new ──► SqlitePool + accounts migrations        │
//! │                accounts()                                               │
//! │                                                                         │
//! │  Handlers borrow repositories per request; pools are cheap to clone.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! File-backed stores run in WAL mode so reads never block the occasional
//! write from a farmer editing a listing.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations::{self, Store};
use crate::repository::account::AccountRepository;
use crate::repository::image::ImageRepository;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Where a store lives and how its pool is sized.
///
/// ```rust,ignore
/// let docs = DbConfig::new("./data/documents.db").max_connections(8);
/// let scratch = DbConfig::in_memory();
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    /// Upper bound on pooled connections (10 for files, 1 for `:memory:`).
    pub max_connections: u32,
    /// How long a handler waits for a free connection before giving up.
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    /// Apply pending migrations as part of `new`. Off means the caller runs
    /// them explicitly through the store.
    pub run_migrations: bool,
}

impl DbConfig {
    /// File-backed store; missing parent directories and the file itself
    /// are created on connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Private throwaway database for tests.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            // a second connection to :memory: would see an empty database
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(3600),
            run_migrations: true,
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }
}

/// Opens a pool for `store` and applies its migrations when enabled.
async fn connect(config: &DbConfig, store: Store) -> DbResult<SqlitePool> {
    info!(
        store = store.name(),
        path = %config.database_path.display(),
        "Initializing database connection"
    );

    let connect_options = if config.is_in_memory() {
        SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
    } else {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
            }
        }

        SqliteConnectOptions::new()
            .filename(&config.database_path)
            .journal_mode(SqliteJournalMode::Wal)
            // durable against corruption; a crash may drop the last commit
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true)
    };

    debug!(store = store.name(), "Connection options configured");

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(Some(config.idle_timeout));

    if config.is_in_memory() {
        // recycling the only connection would drop the database
        pool_options = pool_options
            .max_lifetime(None::<Duration>)
            .idle_timeout(None::<Duration>);
    }

    let pool = pool_options
        .connect_with(connect_options)
        .await
        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

    info!(
        store = store.name(),
        max_connections = config.max_connections,
        "Database pool created"
    );

    if config.run_migrations {
        migrations::run_migrations(&pool, store).await?;
    }

    Ok(pool)
}

async fn ping(pool: &SqlitePool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}

// =============================================================================
// Document Store
// =============================================================================

/// Handle to the document store: listings, orders and image blobs.
///
/// ## Usage
/// ```rust,ignore
/// let docs = DocumentStore::new(DbConfig::new("./data/documents.db")).await?;
/// let newest = docs.products().list_all().await?;
/// ```
#[derive(Debug, Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let pool = connect(&config, Store::Documents).await?;
        Ok(DocumentStore { pool })
    }

    /// Runs document-store migrations (when disabled in the config).
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool, Store::Documents).await
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the product repository.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Returns the order repository.
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    /// Returns the image blob repository.
    pub fn images(&self) -> ImageRepository {
        ImageRepository::new(self.pool.clone())
    }

    pub async fn close(&self) {
        info!(store = Store::Documents.name(), "Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the store can execute queries.
    pub async fn health_check(&self) -> bool {
        ping(&self.pool).await
    }
}

// =============================================================================
// Account Store
// =============================================================================

/// Handle to the account store.
#[derive(Debug, Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

impl AccountStore {
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let pool = connect(&config, Store::Accounts).await?;
        Ok(AccountStore { pool })
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool, Store::Accounts).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the account repository.
    pub fn accounts(&self) -> AccountRepository {
        AccountRepository::new(self.pool.clone())
    }

    pub async fn close(&self) {
        info!(store = Store::Accounts.name(), "Closing database connection pool");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        ping(&self.pool).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
