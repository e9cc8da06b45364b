//! # Database Migrations
//!
//! Embedded SQL migrations, one set per datastore.
//!
//! ## Layout
//! ```text
//! migrations/
//! ├── documents/                 DocumentStore
//! │   └── 001_initial_schema.sql products, orders, product_images
//! └── accounts/                  AccountStore
//!     └── 001_initial_schema.sql users
//! ```
//!
//! Each store tracks its own `_sqlx_migrations` table, so the two files
//! can be versioned independently.
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in the store's directory with the next sequence number
//! 2. Name format: `NNN_description.sql`
//! 3. **NEVER** modify existing migrations - always add new ones

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static DOCUMENT_MIGRATOR: Migrator = sqlx::migrate!("../../migrations/documents");

static ACCOUNT_MIGRATOR: Migrator = sqlx::migrate!("../../migrations/accounts");

/// Which datastore a pool belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    Documents,
    Accounts,
}

impl Store {
    pub const fn name(&self) -> &'static str {
        match self {
            Store::Documents => "documents",
            Store::Accounts => "accounts",
        }
    }

    fn migrator(&self) -> &'static Migrator {
        match self {
            Store::Documents => &DOCUMENT_MIGRATOR,
            Store::Accounts => &ACCOUNT_MIGRATOR,
        }
    }
}

/// Runs all pending migrations for `store`.
///
/// Idempotent: applied migrations are recorded with their checksum and skipped.
pub async fn run_migrations(pool: &SqlitePool, store: Store) -> DbResult<()> {
    info!(store = store.name(), "Checking for pending migrations");

    store.migrator().run(pool).await?;

    info!(store = store.name(), "All migrations applied successfully");
    Ok(())
}

/// Returns (total_migrations, applied_migrations) for diagnostics.
pub async fn migration_status(pool: &SqlitePool, store: Store) -> DbResult<(usize, usize)> {
    let total = store.migrator().migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
