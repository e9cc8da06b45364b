//! Image blob serving.
//!
//! The same handler answers both public prefixes:
//! `/api/products/image/{filename}` (listing images) and
//! `/api/images/{filename}` (profile pictures).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use tracing::warn;

use harvest_db::generate_image_filename;

use crate::error::{ApiError, ApiResult, ResultExt};
use crate::multipart::Upload;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/images/{filename}", get(serve))
}

/// Writes an upload to the blob store and returns its generated filename.
pub(crate) async fn store(state: &AppState, upload: &Upload) -> ApiResult<String> {
    let filename =
        generate_image_filename(upload.original_name.as_deref(), &upload.content_type);

    state
        .documents
        .images()
        .put(&filename, &upload.content_type, &upload.data)
        .await
        .on_failure("Failed to store image")?;

    Ok(filename)
}

/// Best-effort blob removal; a leftover blob is only wasted space.
pub(crate) async fn discard(state: &AppState, filename: &str) {
    match state.documents.images().delete(filename).await {
        Ok(true) => {}
        Ok(false) => warn!(filename = %filename, "Image already gone"),
        Err(e) => warn!(filename = %filename, error = %e, "Failed to delete image"),
    }
}

pub async fn serve(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let image = state
        .documents
        .images()
        .get(&filename)
        .await
        .on_failure("Failed to fetch image")?
        .ok_or_else(|| ApiError::not_found("Image not found"))?;

    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        image.data,
    )
        .into_response())
}
