//! # HTTP Routes
//!
//! ```text
//! /health                         health::check
//! /api/products/*                 products  (catalog, farmer CRUD, images)
//! /api/images/{filename}          images::serve
//! /api/orders/*                   orders    (gateway, checkout, status)
//! /api/users/*                    profiles  (X-User-Id scoped)
//! ```

pub mod health;
pub mod images;
pub mod orders;
pub mod products;
pub mod profiles;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Every route, without middleware.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health::routes())
        .merge(images::routes())
        .nest("/api/products", products::routes())
        .nest("/api/orders", orders::routes())
        .nest("/api/users", profiles::routes())
}
