//! # Harvest API
//!
//! HTTP server for the Harvest Link marketplace.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Harvest API Layers                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  tower-http: CorsLayer ─► TraceLayer ─► DefaultBodyLimit         │  │
//! │  └──────────────────────────────┬───────────────────────────────────┘  │
//! │                                 │                                       │
//! │  ┌────────────────┐  ┌──────────▼─────┐  ┌────────────────┐            │
//! │  │ routes::       │  │ routes::       │  │ routes::       │            │
//! │  │ products       │  │ orders         │  │ profiles       │            │
//! │  │ • add / edit   │  │ • gateway order│  │ • profile      │            │
//! │  │ • catalog      │  │ • verify       │  │ • settings     │            │
//! │  │ • unique/farmers│ │ • checkout     │  │ • notifications│            │
//! │  └───────┬────────┘  └───────┬────────┘  └───────┬────────┘            │
//! │          │                   │                   │                      │
//! │  ┌───────▼───────────────────▼───────┐   ┌───────▼────────┐            │
//! │  │ DocumentStore                     │   │ AccountStore   │            │
//! │  │ products • orders • images        │   │ users          │            │
//! │  └───────────────────────────────────┘   └────────────────┘            │
//! │                      │                                                  │
//! │              PaymentGateway ──► Razorpay                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `PORT` - HTTP port (default: 5000)
//! - `DOCUMENT_DB_PATH` - products/orders/images store (default: ./data/documents.db)
//! - `ACCOUNT_DB_PATH` - user account store (default: ./data/accounts.db)
//! - `RAZORPAY_KEY_ID` / `RAZORPAY_KEY_SECRET` - gateway credentials (required in production)
//! - `RAZORPAY_BASE_URL` - gateway base URL (default: https://api.razorpay.com)
//! - `CORS_ORIGIN` - allowed browser origin (default: http://localhost:5173)
//! - `APP_ENV` - `development` or `production`
//! - `MAX_UPLOAD_BYTES` - image upload limit (default: 5MB)
//! - `RUST_LOG` - log filter

pub mod config;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod multipart;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Re-exports
pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use gateway::{PaymentGateway, RazorpayClient};
pub use state::AppState;

/// Room for the text parts of a multipart form on top of the image itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Builds the application router with middleware and state attached.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(identity::USER_ID_HEADER),
        ]);
    let cors = match HeaderValue::from_str(&state.config.cors_origin) {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!(origin = %state.config.cors_origin, "Invalid CORS origin, cross-origin requests disabled");
            cors
        }
    };

    let mut router = routes::router();
    if !state.config.environment.is_production() {
        router = router.layer(middleware::map_response(error::expose_detail));
    }

    router
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_bytes + FORM_OVERHEAD_BYTES,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
