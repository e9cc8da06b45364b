//! Multipart form reading for product and profile uploads.
//!
//! Text parts land in a [`FormFields`] map; the single file part (named by
//! the caller) is buffered in memory. Repeated text parts keep the last value.

use axum::body::Bytes;
use axum::extract::Multipart;
use tracing::debug;

use harvest_core::validation::FormFields;
use harvest_db::FALLBACK_CONTENT_TYPE;

use crate::error::{ApiError, ApiResult, ErrorCode};

/// An uploaded file part.
#[derive(Debug, Clone)]
pub struct Upload {
    pub original_name: Option<String>,
    pub content_type: String,
    pub data: Bytes,
}

/// A fully buffered multipart form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: FormFields,
    pub file: Option<Upload>,
}

impl UploadForm {
    /// Drains `multipart`, treating the part named `file_field` as the upload.
    ///
    /// Empty file parts (a form submitted without choosing a file) are
    /// treated as no file. Anything that isn't an image is rejected.
    pub async fn read(
        mut multipart: Multipart,
        file_field: &str,
        max_bytes: usize,
    ) -> ApiResult<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == file_field {
                let original_name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .unwrap_or(FALLBACK_CONTENT_TYPE)
                    .to_string();
                let data = field.bytes().await?;

                if data.is_empty() {
                    continue;
                }
                if data.len() > max_bytes {
                    return Err(ApiError::new(
                        ErrorCode::PayloadTooLarge,
                        format!("Image must be at most {max_bytes} bytes"),
                    ));
                }
                if !content_type.starts_with("image/") {
                    return Err(ApiError::validation("Only image uploads are allowed"));
                }

                debug!(field = %name, bytes = data.len(), content_type = %content_type, "Received upload");
                form.file = Some(Upload {
                    original_name,
                    content_type,
                    data,
                });
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }
}
