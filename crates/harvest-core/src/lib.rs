//! # harvest-core: Pure Domain Logic for Harvest Link
//!
//! Everything the marketplace decides without touching a database or the
//! network lives here: product and order types, integer money, input
//! validation, gateway signature checks, and the name-based catalog grouping.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Harvest Link Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SPA Frontend (React)                        │   │
//! │  │   Farmer dashboard ──► Shop ──► Cart ──► Checkout (Razorpay)    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON / multipart over HTTP             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 harvest-api (axum handlers)                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ harvest-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌────────────┐ ┌─────────┐ ┌────────┐ │   │
//! │  │  │  types  │ │  money  │ │ validation │ │signature│ │catalog │ │   │
//! │  │  │ Product │ │  Money  │ │  product / │ │ HMAC    │ │ unique │ │   │
//! │  │  │ Order   │ │Discount │ │  order     │ │ SHA256  │ │ names  │ │   │
//! │  │  └─────────┘ └─────────┘ └────────────┘ └─────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │       harvest-db (document store + account store, sqlx)         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, Account, enums)
//! - [`money`] - Money type with integer paise arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Product and checkout validation
//! - [`signature`] - Payment gateway HMAC-SHA256 signatures
//! - [`catalog`] - Grouping listings of the same produce across farmers
//!
//! ## Example Usage
//!
//! ```rust
//! use harvest_core::money::{DiscountRate, Money};
//!
//! let price = Money::parse_decimal("120.00").unwrap(); // ₹120.00
//! let discount = DiscountRate::from_bps(1500);         // 15%
//!
//! assert_eq!(price.paise(), 12000);
//! assert_eq!(price.multiply_quantity(3).paise(), 36000);
//! assert_eq!(discount.bps(), 1500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod error;
pub mod money;
pub mod signature;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::{DiscountRate, Money};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Unit assumed when a farmer leaves the unit field blank.
pub const DEFAULT_UNIT: &str = "kg";

/// Currency used for gateway orders when the client does not send one.
pub const DEFAULT_CURRENCY: &str = "INR";

/// Maximum distinct line items in a single order.
pub const MAX_ORDER_ITEMS: usize = 100;

/// Maximum quantity of a single line item; 1000 is rejected at checkout.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Public path prefix under which listing images are served.
pub const PRODUCT_IMAGE_PATH: &str = "/api/products/image";

/// Public path prefix for other uploaded images (profile pictures).
pub const IMAGE_PATH: &str = "/api/images";
