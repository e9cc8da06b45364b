//! # Image Repository
//!
//! A plain blob store for uploaded listing and profile images, keyed by a
//! generated filename. Public URLs embed the filename:
//!
//! ```text
//! upload "IMG_2041.JPG" ──► 1760862000123-3fa85f64.jpg
//!                              │
//!                              ├── /api/products/image/1760862000123-3fa85f64.jpg
//!                              └── /api/images/1760862000123-3fa85f64.jpg
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;

/// Content type used when the upload didn't declare one.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A stored image and its metadata.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct StoredImage {
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Repository for image blobs.
#[derive(Debug, Clone)]
pub struct ImageRepository {
    pool: SqlitePool,
}

impl ImageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ImageRepository { pool }
    }

    /// Stores `data` under `filename`.
    pub async fn put(&self, filename: &str, content_type: &str, data: &[u8]) -> DbResult<()> {
        debug!(filename = %filename, bytes = data.len(), "Storing image");

        sqlx::query(
            r#"
            INSERT INTO product_images (filename, content_type, size_bytes, data, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(filename)
        .bind(content_type)
        .bind(data.len() as i64)
        .bind(data)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, filename: &str) -> DbResult<Option<StoredImage>> {
        let image = sqlx::query_as::<_, StoredImage>(
            r#"
            SELECT filename, content_type, size_bytes, data, created_at
            FROM product_images
            WHERE filename = ?1
            "#,
        )
        .bind(filename)
        .fetch_optional(&self.pool)
        .await?;

        Ok(image)
    }

    /// Removes a blob. Returns false if nothing was stored under `filename`.
    pub async fn delete(&self, filename: &str) -> DbResult<bool> {
        debug!(filename = %filename, "Deleting image");

        let result = sqlx::query("DELETE FROM product_images WHERE filename = ?1")
            .bind(filename)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of stored blobs.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_images")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Generates a unique blob filename, keeping a short alphanumeric extension
/// from the uploaded name, or deriving one from the content type.
///
/// ## Example
/// ```rust
/// use harvest_db::repository::image::generate_image_filename;
///
/// let name = generate_image_filename(Some("IMG_2041.JPG"), "image/jpeg");
/// assert!(name.ends_with(".jpg"));
/// ```
pub fn generate_image_filename(original: Option<&str>, content_type: &str) -> String {
    let ext = original
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .or_else(|| extension_for(content_type).map(str::to_string));

    let stem = format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        &Uuid::new_v4().simple().to_string()[..8]
    );

    match ext {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{DbConfig, DocumentStore};

    #[tokio::test]
    async fn test_put_get_delete() {
        let images = DocumentStore::new(DbConfig::in_memory())
            .await
            .unwrap()
            .images();

        images.put("a.png", "image/png", &[0x89, 0x50, 0x4e, 0x47]).await.unwrap();

        let stored = images.get("a.png").await.unwrap().unwrap();
        assert_eq!(stored.content_type, "image/png");
        assert_eq!(stored.size_bytes, 4);
        assert_eq!(stored.data, vec![0x89, 0x50, 0x4e, 0x47]);

        assert_eq!(images.count().await.unwrap(), 1);
        assert!(images.delete("a.png").await.unwrap());
        assert!(!images.delete("a.png").await.unwrap());
        assert_eq!(images.count().await.unwrap(), 0);
        assert!(images.get("a.png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_filename_is_rejected() {
        let images = DocumentStore::new(DbConfig::in_memory())
            .await
            .unwrap()
            .images();

        images.put("a.png", "image/png", b"one").await.unwrap();
        let err = images.put("a.png", "image/png", b"two").await.unwrap_err();
        assert!(matches!(err, crate::DbError::UniqueViolation { .. }));
    }

    #[test]
    fn test_filename_extension_rules() {
        assert!(generate_image_filename(Some("photo.PNG"), "image/png").ends_with(".png"));
        assert!(generate_image_filename(None, "image/webp").ends_with(".webp"));
        assert!(generate_image_filename(Some("../../etc/passwd"), "image/jpeg").ends_with(".jpg"));
        assert!(!generate_image_filename(Some("noext"), "text/plain").contains('.'));

        let a = generate_image_filename(None, "image/png");
        let b = generate_image_filename(None, "image/png");
        assert_ne!(a, b);
    }
}
