//! # Error Types
//!
//! Domain-specific error types for harvest-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  harvest-core errors (this file)                                       │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  harvest-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  harvest-api errors (in app)                                           │
//! │  ├── GatewayError     - Payment gateway failures                       │
//! │  └── ApiError         - What the HTTP client sees                      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → JSON envelope          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// The order already reached a terminal status.
    ///
    /// ## When This Occurs
    /// ```text
    /// Order ORD-20261019-1A2B3C4D is Delivered
    ///      │
    ///      ▼
    /// PATCH /api/orders/{id}/status { "status": "shipped" }
    ///      │
    ///      ▼
    /// InvalidOrderTransition { from: Delivered, to: Shipped }
    /// ```
    #[error("Order {order_id} is {from}, cannot move to {to}")]
    InvalidOrderTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// The signing secret could not key an HMAC.
    #[error("Invalid signing key")]
    InvalidSigningKey,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These run before anything is persisted; every variant maps to a 400.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A single field that may not be absent or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Several required fields were checked at once.
    ///
    /// `fields` maps every checked field to `true` when it was missing,
    /// so clients can highlight exactly which inputs need attention.
    #[error("{message}")]
    MissingFields {
        message: String,
        fields: BTreeMap<String, bool>,
    },

    /// A checkout line item is incomplete. `item` echoes what was sent.
    #[error("{message}")]
    InvalidItem {
        message: String,
        item: serde_json::Value,
    },

    /// Names, descriptions and the like have length caps.
    #[error("{field} is longer than {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must lie within {min}..={max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Prices, quantities and payment amounts.
    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    /// Parsable text in the wrong shape: a rupee string with letters, a
    /// harvest date that is not `YYYY-MM-DD`.
    #[error("{field}: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Enumerated fields such as category or order status.
    #[error("{field} must be one of {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Free-form rule violation with a fixed user-facing message.
    #[error("{0}")]
    Rule(String),
}

impl ValidationError {
    /// Builds a [`ValidationError::MissingFields`] if any check failed.
    ///
    /// ## Example
    /// ```rust
    /// use harvest_core::ValidationError;
    ///
    /// let ok = ValidationError::missing_fields("Missing", [("name", false)]);
    /// assert!(ok.is_none());
    ///
    /// let err = ValidationError::missing_fields("Missing", [("name", true), ("price", false)]);
    /// assert!(err.is_some());
    /// ```
    pub fn missing_fields<'a>(
        message: &str,
        checks: impl IntoIterator<Item = (&'a str, bool)>,
    ) -> Option<Self> {
        let fields: BTreeMap<String, bool> = checks
            .into_iter()
            .map(|(field, missing)| (field.to_string(), missing))
            .collect();

        if fields.values().any(|missing| *missing) {
            Some(ValidationError::MissingFields {
                message: message.to_string(),
                fields,
            })
        } else {
            None
        }
    }

    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
