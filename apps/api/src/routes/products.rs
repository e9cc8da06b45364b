//! # Product Routes
//!
//! Farmer listing management and the consumer catalog.
//!
//! ```text
//! POST   /add-product                 multipart, file part "image"
//! GET    /consumer/allproducts        newest first
//! GET    /farmer/{farmer_id}          404 when the farmer has none
//! GET    /category/{category}         404 when empty
//! GET    /unique                      one card per product name
//! GET    /farmers/{product_name}      who sells this (case-insensitive)
//! GET    /image/{filename}            listing image blob
//! GET    /{product_id}
//! PUT    /update/{product_id}         multipart, optional "image"
//! DELETE /delete/{product_id}         also drops the image blob
//! ```

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use harvest_core::catalog::{
    attach_farmer_details, farmer_ids, farmer_listings, unique_products, FarmerListing,
    ProductOverview, UniqueProduct,
};
use harvest_core::validation::{validate_new_product, validate_product_update};
use harvest_core::{CoreError, Product, PRODUCT_IMAGE_PATH};
use harvest_db::{generate_product_id, DbError};

use super::images;
use crate::error::{ApiError, ApiResult, ResultExt};
use crate::multipart::UploadForm;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/add-product", post(create))
        .route("/consumer/allproducts", get(list_all))
        .route("/farmer/{farmer_id}", get(list_by_farmer))
        .route("/category/{category}", get(list_by_category))
        .route("/unique", get(unique))
        .route("/farmers/{product_name}", get(farmers_selling))
        .route("/image/{filename}", get(images::serve))
        .route("/update/{product_id}", put(update))
        .route("/delete/{product_id}", delete(remove))
        .route("/{product_id}", get(get_by_id))
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Serialize)]
pub struct Created {
    pub success: bool,
    pub message: &'static str,
    pub data: Product,
}

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct SingleProduct {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub product: Product,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UniqueList {
    pub success: bool,
    pub count: usize,
    pub products: Vec<UniqueProduct>,
}

#[derive(Debug, Serialize)]
pub struct FarmersSelling {
    pub success: bool,
    pub product: ProductOverview,
    pub farmers: Vec<FarmerListing>,
    pub count: usize,
}

// =============================================================================
// Handlers
// =============================================================================

async fn create(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Created>)> {
    let form = UploadForm::read(multipart, "image", state.config.max_upload_bytes).await?;
    let draft = validate_new_product(&form.fields, form.file.is_some())?;
    let upload = form
        .file
        .ok_or_else(|| ApiError::validation("Product image is required"))?;

    let filename = images::store(&state, &upload).await?;
    let product = draft.into_product(generate_product_id(), filename.clone(), Utc::now());

    let product = match state.documents.products().insert(&product).await {
        Ok(product) => product,
        Err(e) => {
            images::discard(&state, &filename).await;
            return Err(ApiError::from(e)).on_failure("Failed to create product");
        }
    };

    info!(
        id = %product.id,
        farmer_id = %product.farmer_id,
        name = %product.name,
        "Product created"
    );

    Ok((
        StatusCode::CREATED,
        Json(Created {
            success: true,
            message: "Product created successfully",
            data: product,
        }),
    ))
}

async fn list_all(State(state): State<Arc<AppState>>) -> ApiResult<Json<ProductList>> {
    let products = state
        .documents
        .products()
        .list_all()
        .await
        .on_failure("Error fetching products")?;

    Ok(Json(ProductList {
        success: true,
        count: Some(products.len()),
        products,
    }))
}

async fn list_by_farmer(
    State(state): State<Arc<AppState>>,
    Path(farmer_id): Path<String>,
) -> ApiResult<Json<ProductList>> {
    let products = state
        .documents
        .products()
        .list_by_farmer(&farmer_id)
        .await
        .on_failure("Error fetching products")?;

    if products.is_empty() {
        return Err(ApiError::not_found("No products found for this farmer"));
    }

    Ok(Json(ProductList {
        success: true,
        count: None,
        products,
    }))
}

async fn list_by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> ApiResult<Json<ProductList>> {
    let products = state
        .documents
        .products()
        .list_by_category(&category)
        .await
        .on_failure("Error searching products")?;

    if products.is_empty() {
        return Err(ApiError::not_found("No products found in this category"));
    }

    Ok(Json(ProductList {
        success: true,
        count: Some(products.len()),
        products,
    }))
}

async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<SingleProduct>> {
    let product = state
        .documents
        .products()
        .get_by_id(&product_id)
        .await
        .on_failure("Error fetching product details")?
        .ok_or(CoreError::ProductNotFound(product_id))?;

    Ok(Json(SingleProduct {
        success: true,
        message: None,
        product,
    }))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<SingleProduct>> {
    let form = UploadForm::read(multipart, "image", state.config.max_upload_bytes).await?;
    let changes = validate_product_update(&form.fields)?;

    let products = state.documents.products();
    let mut product = products
        .get_by_id(&product_id)
        .await
        .on_failure("Failed to update product")?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;

    changes.apply_to(&mut product);

    let mut stored = None;
    let mut replaced_image = None;
    if let Some(upload) = &form.file {
        let filename = images::store(&state, upload).await?;
        product.image_url = format!("{PRODUCT_IMAGE_PATH}/{filename}");
        replaced_image = product.image_id.replace(filename.clone());
        stored = Some(filename);
    }

    let product = match products.update(&product).await {
        Ok(product) => product,
        Err(e) => {
            if let Some(filename) = &stored {
                images::discard(&state, filename).await;
            }
            return Err(match e {
                DbError::NotFound { .. } => ApiError::from(CoreError::ProductNotFound(product_id)),
                other => ApiError::from(other),
            })
            .on_failure("Failed to update product");
        }
    };

    if let Some(old) = replaced_image {
        images::discard(&state, &old).await;
    }

    info!(id = %product.id, "Product updated");

    Ok(Json(SingleProduct {
        success: true,
        message: Some("Product updated successfully"),
        product,
    }))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<Deleted>> {
    let products = state.documents.products();
    let product = products
        .get_by_id(&product_id)
        .await
        .on_failure("Failed to delete product")?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;

    products
        .delete(&product.id)
        .await
        .on_failure("Failed to delete product")?;

    if let Some(image_id) = &product.image_id {
        images::discard(&state, image_id).await;
    }

    info!(id = %product.id, "Product deleted");

    Ok(Json(Deleted {
        success: true,
        message: "Product deleted successfully",
    }))
}

async fn unique(State(state): State<Arc<AppState>>) -> ApiResult<Json<UniqueList>> {
    let products = state
        .documents
        .products()
        .list_all()
        .await
        .on_failure("Error fetching unique products")?;

    let unique = unique_products(&products);

    Ok(Json(UniqueList {
        success: true,
        count: unique.len(),
        products: unique,
    }))
}

async fn farmers_selling(
    State(state): State<Arc<AppState>>,
    Path(product_name): Path<String>,
) -> ApiResult<Json<FarmersSelling>> {
    let products = state
        .documents
        .products()
        .find_by_name(&product_name)
        .await
        .on_failure("Error fetching farmers for product")?;

    let (product, mut farmers) = farmer_listings(&products)
        .ok_or_else(|| ApiError::not_found("No products found with this name"))?;

    // Seller details are advisory: a failed lookup leaves them empty.
    match state.accounts.accounts().farmers_by_ids(&farmer_ids(&farmers)).await {
        Ok(details) => attach_farmer_details(&mut farmers, &details),
        Err(e) => tracing::warn!(error = %e, "Farmer details unavailable"),
    }

    Ok(Json(FarmersSelling {
        success: true,
        count: farmers.len(),
        product,
        farmers,
    }))
}

// =============================================================================
// Tests
// =============================================================================
