//! Caller identity.
//!
//! Authentication happens upstream; by the time a request reaches this
//! service the gateway has put the account uid in `X-User-Id`. Handlers that
//! act on "the current user" take a [`CurrentUser`] argument and get a 401
//! when the header is absent.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::error::ApiError;

/// Header carrying the authenticated account uid.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated account uid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl CurrentUser {
    pub fn uid(&self) -> &str {
        &self.0
    }
}

/// Extract the uid from request headers. Blank values count as absent.
pub fn extract_user_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|uid| !uid.is_empty())
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_user_id(&parts.headers)
            .map(|uid| CurrentUser(uid.to_string()))
            .ok_or_else(|| ApiError::unauthorized("Not authorized, no user id"))
    }
}
