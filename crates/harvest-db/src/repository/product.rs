//! # Product Repository
//!
//! Database operations for listings.
//!
//! ## Key Operations
//! - CRUD for a single listing
//! - Newest-first listings (all, by farmer, by category)
//! - Case-insensitive exact name lookup for the "who sells this" page
//!
//! ## Ordering
//! ```text
//! ORDER BY created_at DESC, rowid DESC
//!          │                 │
//!          │                 └── tie-break: later insert wins
//!          └── RFC 3339 text sorts chronologically
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use harvest_core::{DiscountRate, Money, Product, Traceability};

macro_rules! select_products {
    ($tail:literal) => {
        concat!(
            "SELECT id, farmer_id, farmer_mobile, farmer_location, name, description, ",
            "category, price_paise, discount_bps, available_quantity, unit, image_url, ",
            "image_id, traceability, created_at, updated_at FROM products ",
            $tail
        )
    };
}

/// Flat row shape of the `products` table.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    farmer_id: String,
    farmer_mobile: Option<String>,
    farmer_location: Option<String>,
    name: String,
    description: String,
    category: String,
    price_paise: i64,
    discount_bps: i64,
    available_quantity: i64,
    unit: String,
    image_url: String,
    image_id: Option<String>,
    traceability: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let traceability: Traceability = serde_json::from_str(&row.traceability)
            .map_err(|e| DbError::invalid_data("products.traceability", e))?;
        let discount = u32::try_from(row.discount_bps)
            .map_err(|e| DbError::invalid_data("products.discount_bps", e))?;

        Ok(Product {
            id: row.id,
            farmer_id: row.farmer_id,
            farmer_mobile: row.farmer_mobile,
            farmer_location: row.farmer_location,
            name: row.name,
            description: row.description,
            category: row.category,
            price: Money::from_paise(row.price_paise),
            discount: DiscountRate::from_bps(discount),
            available_quantity: row.available_quantity,
            unit: row.unit,
            image_url: row.image_url,
            image_id: row.image_id,
            traceability,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> DbResult<Vec<Product>> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Repository for listing operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = docs.products();
///
/// let mine = repo.list_by_farmer("farmer-7").await?;
/// let tomatoes = repo.find_by_name("tomato").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a listing by its id.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Listing found
    /// * `Ok(None)` - No such listing
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(select_products!("WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Every listing, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(select_products!(
            "ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed all products");
        into_products(rows)
    }

    /// One farmer's listings, newest first.
    pub async fn list_by_farmer(&self, farmer_id: &str) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(select_products!(
            "WHERE farmer_id = ?1 ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(farmer_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(farmer_id = %farmer_id, count = rows.len(), "Listed farmer products");
        into_products(rows)
    }

    /// Listings in an exact category, newest first.
    pub async fn list_by_category(&self, category: &str) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(select_products!(
            "WHERE category = ?1 ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        into_products(rows)
    }

    /// Listings whose name equals `name`, ignoring ASCII case.
    ///
    /// The name is bound as a value, never spliced into a pattern, so
    /// characters like `%` or `.` match only themselves.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(select_products!(
            "WHERE name = ?1 COLLATE NOCASE ORDER BY created_at ASC, rowid ASC"
        ))
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        debug!(name = %name, count = rows.len(), "Found products by name");
        into_products(rows)
    }

    /// Inserts a new listing.
    ///
    /// ## Arguments
    /// * `product` - Listing to insert (id generated beforehand)
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, farmer_id = %product.farmer_id, "Inserting product");

        let traceability = serde_json::to_string(&product.traceability)?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, farmer_id, farmer_mobile, farmer_location,
                name, description, category,
                price_paise, discount_bps, available_quantity, unit,
                image_url, image_id, traceability,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14,
                ?15, ?16
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.farmer_id)
        .bind(&product.farmer_mobile)
        .bind(&product.farmer_location)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price.paise())
        .bind(i64::from(product.discount.bps()))
        .bind(product.available_quantity)
        .bind(&product.unit)
        .bind(&product.image_url)
        .bind(&product.image_id)
        .bind(traceability)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Writes every mutable field of `product` and stamps `updated_at`.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The stored listing
    /// * `Err(DbError::NotFound)` - Listing doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();
        let traceability = serde_json::to_string(&product.traceability)?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                farmer_mobile = ?2,
                farmer_location = ?3,
                name = ?4,
                description = ?5,
                category = ?6,
                price_paise = ?7,
                discount_bps = ?8,
                available_quantity = ?9,
                unit = ?10,
                image_url = ?11,
                image_id = ?12,
                traceability = ?13,
                updated_at = ?14
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.farmer_mobile)
        .bind(&product.farmer_location)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price.paise())
        .bind(i64::from(product.discount.bps()))
        .bind(product.available_quantity)
        .bind(&product.unit)
        .bind(&product.image_url)
        .bind(&product.image_id)
        .bind(traceability)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        let mut stored = product.clone();
        stored.updated_at = now;
        Ok(stored)
    }

    /// Hard-deletes a listing. The image blob is the caller's to remove.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Counts listings (for diagnostics and the seed tool).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Generates a new listing id.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{DbConfig, DocumentStore};
    use crate::repository::fixtures;

    async fn repo() -> ProductRepository {
        DocumentStore::new(DbConfig::in_memory())
            .await
            .unwrap()
            .products()
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let repo = repo().await;
        let product = fixtures::product("p1", "Tomato", "farmer-1", 0);
        repo.insert(&product).await.unwrap();

        let stored = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(stored, product);
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lists_are_newest_first() {
        let repo = repo().await;
        repo.insert(&fixtures::product("old", "Tomato", "farmer-1", 0)).await.unwrap();
        repo.insert(&fixtures::product("new", "Onion", "farmer-1", 30)).await.unwrap();
        repo.insert(&fixtures::product("mid", "Okra", "farmer-2", 10)).await.unwrap();

        let all: Vec<String> = repo.list_all().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(all, vec!["new", "mid", "old"]);

        let mine: Vec<String> = repo
            .list_by_farmer("farmer-1")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(mine, vec!["new", "old"]);

        assert_eq!(repo.list_by_category("Vegetables").await.unwrap().len(), 3);
        assert!(repo.list_by_category("vegetables").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_name_ignores_case_but_not_spelling() {
        let repo = repo().await;
        repo.insert(&fixtures::product("p1", "Tomato", "farmer-1", 0)).await.unwrap();
        repo.insert(&fixtures::product("p2", "TOMATO", "farmer-2", 5)).await.unwrap();
        repo.insert(&fixtures::product("p3", "Cherry Tomato", "farmer-3", 9)).await.unwrap();

        let found = repo.find_by_name("tomato").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, "p1");

        assert!(repo.find_by_name("tom%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = repo().await;
        let mut product = fixtures::product("p1", "Tomato", "farmer-1", 0);
        repo.insert(&product).await.unwrap();

        product.price = Money::from_paise(4500);
        product.traceability.certified_by = Some("NPOP".to_string());
        let updated = repo.update(&product).await.unwrap();
        assert!(updated.updated_at > product.created_at);

        let stored = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(stored.price.paise(), 4500);
        assert_eq!(stored.traceability.certified_by.as_deref(), Some("NPOP"));

        repo.delete("p1").await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.delete("p1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() {
        let repo = repo().await;
        let product = fixtures::product("ghost", "Tomato", "farmer-1", 0);
        assert!(repo.update(&product).await.unwrap_err().is_not_found());
    }
}
