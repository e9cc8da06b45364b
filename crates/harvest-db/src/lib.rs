//! # harvest-db: Persistence for Harvest Link
//!
//! This crate owns both datastores. Each one is a SQLite database reached
//! through an sqlx pool with its own embedded migrations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Harvest Link Data Flow                            │
//! │                                                                         │
//! │  axum handler (GET /api/products/farmers/{name})                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   harvest-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────────────┐          ┌────────────────────┐       │   │
//! │  │   │   DocumentStore    │          │    AccountStore    │       │   │
//! │  │   │                    │          │                    │       │   │
//! │  │   │ ProductRepository  │  uid by  │ AccountRepository  │       │   │
//! │  │   │ OrderRepository    │ ───────► │                    │       │   │
//! │  │   │ ImageRepository    │  value   │                    │       │   │
//! │  │   └─────────┬──────────┘          └─────────┬──────────┘       │   │
//! │  └─────────────┼───────────────────────────────┼──────────────────┘   │
//! │                ▼                               ▼                        │
//! │         documents.db                      accounts.db                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Pool creation, store handles, health checks
//! - [`migrations`] - Embedded migrations per store
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use harvest_db::{DbConfig, DocumentStore};
//!
//! let docs = DocumentStore::new(DbConfig::new("./data/documents.db")).await?;
//! let products = docs.products().list_all().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::Store;
pub use pool::{AccountStore, DbConfig, DocumentStore};

pub use repository::account::AccountRepository;
pub use repository::image::{
    generate_image_filename, ImageRepository, StoredImage, FALLBACK_CONTENT_TYPE,
};
pub use repository::order::{generate_order_number, OrderRepository, StatusChange};
pub use repository::product::{generate_product_id, ProductRepository};
