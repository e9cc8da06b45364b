//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Harvest API                            │
//! │                                                                         │
//! │  Handler -> Result<Json<T>, ApiError>                                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ValidationError ──► 400 (+ required / invalidItem)  ──┐               │
//! │  CoreError       ──► 404 / 409 / 400                 ──┤               │
//! │  DbError         ──► 404 / 409 / 500                 ──┼──► ApiError   │
//! │  GatewayError    ──► 500                             ──┤      │        │
//! │  Json/Multipart rejections ──► 400 / 413             ──┘      │        │
//! │                                                               ▼        │
//! │                           { "success": false, "message": ... }         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Response Shape
//! ```json
//! {
//!   "success": false,
//!   "code": "VALIDATION_ERROR",
//!   "message": "Missing required product information",
//!   "required": { "name": false, "price": true }
//! }
//! ```
//!
//! Responses leave without the cause. Routers built outside production add
//! it back as `error` through [`expose_detail`].

use std::collections::BTreeMap;

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use harvest_core::{CoreError, ValidationError};
use harvest_db::DbError;

use crate::gateway::GatewayError;

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Caller identity missing (401)
    Unauthorized,

    /// Resource not found (404)
    NotFound,

    /// State conflict such as editing a finished order (409)
    Conflict,

    /// Upload larger than the configured limit (413)
    PayloadTooLarge,

    /// Payment gateway call failed (500)
    PaymentError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::PaymentError | ErrorCode::DatabaseError | ErrorCode::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error returned from HTTP handlers.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Field → missing? map for multi-field presence checks
    pub required: Option<BTreeMap<String, bool>>,

    /// The offending checkout item, echoed back
    pub invalid_item: Option<Value>,

    /// Underlying cause, hidden in production
    pub detail: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            required: None,
            invalid_item: None,
            detail: None,
        }
    }

    /// Creates a not found error with a fixed message, e.g. "Product not found".
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::NotFound, message)
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Creates an internal error carrying the cause as detail.
    pub fn internal(message: impl Into<String>, cause: impl ToString) -> Self {
        ApiError::new(ErrorCode::Internal, message).with_detail(cause)
    }

    pub fn with_detail(mut self, cause: impl ToString) -> Self {
        self.detail = Some(cause.to_string());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    /// Renders the JSON envelope.
    pub fn body(&self, expose_detail: bool) -> Value {
        let mut body = json!({
            "success": false,
            "code": self.code,
            "message": self.message,
        });

        if let Some(required) = &self.required {
            body["required"] = json!(required);
        }
        if let Some(item) = &self.invalid_item {
            body["invalidItem"] = item.clone();
        }
        if expose_detail {
            if let Some(detail) = &self.detail {
                body["error"] = Value::String(detail.clone());
            }
        }

        body
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(
                code = ?self.code,
                message = %self.message,
                detail = ?self.detail,
                "Request failed"
            );
        } else {
            tracing::debug!(code = ?self.code, message = %self.message, "Request rejected");
        }

        let mut response = (status, Json(self.body(false))).into_response();
        // kept for expose_detail; extensions never reach the wire
        response.extensions_mut().insert(self);
        response
    }
}

/// Response mapper that re-renders error envelopes with their `error` detail.
///
/// Installed by [`crate::build_router`] for non-production environments.
pub async fn expose_detail(response: Response) -> Response {
    let Some(err) = response
        .extensions()
        .get::<ApiError>()
        .filter(|err| err.detail.is_some())
        .cloned()
    else {
        return response;
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    let body = Json(err.body(true)).into_response().into_body();
    Response::from_parts(parts, body)
}

// =============================================================================
// Conversions
// =============================================================================

/// Converts validation errors to API errors.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MissingFields { message, fields } => ApiError {
                required: Some(fields),
                ..ApiError::validation(message)
            },
            ValidationError::InvalidItem { message, item } => ApiError {
                invalid_item: Some(item),
                ..ApiError::validation(message)
            },
            other => ApiError::validation(other.to_string()),
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(_) => ApiError::not_found("Product not found"),
            CoreError::OrderNotFound(_) => ApiError::not_found("Order not found"),
            CoreError::AccountNotFound(_) => ApiError::not_found("User not found"),
            err @ CoreError::InvalidOrderTransition { .. } => {
                ApiError::new(ErrorCode::Conflict, err.to_string())
            }
            CoreError::InvalidSigningKey => {
                ApiError::internal("Payment verification failed", "invalid signing key")
            }
            CoreError::Validation(err) => err.into(),
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => ApiError::not_found(format!("{entity} not found")),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{field} '{value}' already exists"),
            ),
            DbError::ConnectionFailed(e) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
                    .with_detail(e)
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            other => ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
                .with_detail(other),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::new(ErrorCode::PaymentError, "Payment gateway error").with_detail(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation("Invalid JSON body").with_detail(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::new(ErrorCode::PayloadTooLarge, "Upload is too large")
        } else {
            ApiError::validation("Invalid multipart form").with_detail(err.body_text())
        }
    }
}

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Replaces the message of server-side failures with an operation-level one
/// ("Error fetching products"). Client errors keep their own message.
pub trait ResultExt<T> {
    fn on_failure(self, message: &str) -> ApiResult<T>;
}

impl<T, E: Into<ApiError>> ResultExt<T> for Result<T, E> {
    fn on_failure(self, message: &str) -> ApiResult<T> {
        self.map_err(|e| {
            let err = e.into();
            if err.status().is_server_error() {
                ApiError {
                    message: message.to_string(),
                    ..err
                }
            } else {
                err
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_render_required_map() {
        let err: ApiError = ValidationError::missing_fields(
            "Missing required fields",
            [("items", true), ("total_amount", false)],
        )
        .unwrap()
        .into();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let body = err.body(true);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Missing required fields");
        assert_eq!(body["required"]["items"], true);
        assert_eq!(body["required"]["total_amount"], false);
    }

    #[test]
    fn test_invalid_item_is_echoed() {
        let err: ApiError = ValidationError::InvalidItem {
            message: "Each item must have product_id, name, price, and quantity".to_string(),
            item: json!({ "name": "Tomato" }),
        }
        .into();

        assert_eq!(err.body(false)["invalidItem"]["name"], "Tomato");
    }

    #[test]
    fn test_detail_hidden_in_production() {
        let err = ApiError::internal("Error creating order", "connection refused");

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body(true)["error"], "connection refused");
        assert!(err.body(false).get("error").is_none());
    }

    #[test]
    fn test_core_and_db_mappings() {
        let conflict: ApiError = CoreError::InvalidOrderTransition {
            order_id: "ORD-1".to_string(),
            from: harvest_core::OrderStatus::Cancelled,
            to: harvest_core::OrderStatus::Shipped,
        }
        .into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let missing: ApiError = DbError::not_found("Order", "x").into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.message, "Order not found");

        let broken: ApiError = DbError::QueryFailed("disk I/O error".to_string()).into();
        assert_eq!(broken.code, ErrorCode::DatabaseError);
        assert_eq!(broken.detail.as_deref(), Some("sqlite: disk I/O error"));
    }

    #[test]
    fn test_on_failure_only_rewrites_server_errors() {
        let failed: Result<(), DbError> = Err(DbError::PoolExhausted);
        let err = failed.on_failure("Error fetching products").unwrap_err();
        assert_eq!(err.message, "Error fetching products");

        let missing: Result<(), DbError> = Err(DbError::not_found("Product", "p1"));
        let err = missing.on_failure("Error fetching products").unwrap_err();
        assert_eq!(err.message, "Product not found");
    }
}
