//! Catalog handlers: public reads plus admin-only CRUD, stock, and status.

use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::CurrentUser;

use super::{ensure_admin, map_db_error, parse_object_id, ApiError, AppState, Envelope, NoData};

const MAX_PRODUCT_IMAGES: usize = 4;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SingleProductRequest {
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AddProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub bestseller: bool,
    #[serde(default)]
    pub sizes: Vec<String>,
    pub image: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpdateProductRequest {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub bestseller: Option<bool>,
    pub sizes: Option<Vec<String>>,
    pub image: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RemoveProductRequest {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpdateStockRequest {
    pub product_id: String,
    pub stock: i32,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateStatusRequest {
    pub id: String,
    pub status: String,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// A catalog entry as the UIs consume it — `_id` string, camelCase fields,
/// `date` in epoch milliseconds.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProductPayload {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: String,
    pub sub_category: String,
    pub stock: i32,
    pub bestseller: bool,
    pub sizes: Vec<String>,
    pub image: Vec<String>,
    pub status: String,
    pub date: i64,
}

impl From<storefront_db::ProductRow> for ProductPayload {
    fn from(row: storefront_db::ProductRow) -> Self {
        Self {
            id: row.id.to_string(),
            name: row.name,
            description: row.description,
            price: row.price,
            category: row.category,
            sub_category: row.sub_category,
            stock: row.stock,
            bestseller: row.bestseller,
            sizes: row.sizes.0,
            image: row.image.0,
            status: row.status,
            date: row.created_at.timestamp_millis(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ProductsData {
    pub products: Vec<ProductPayload>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductData {
    pub product: ProductPayload,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn validate_name(name: &str) -> Result<(), ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > 200 {
        return Err(ApiError::new(
            "validation_error",
            "name must be 1–200 characters",
        ));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), ApiError> {
    if price.is_sign_negative() {
        return Err(ApiError::new(
            "validation_error",
            "price must not be negative",
        ));
    }
    Ok(())
}

fn validate_stock(stock: i32) -> Result<(), ApiError> {
    if stock < 0 {
        return Err(ApiError::new(
            "validation_error",
            "stock must not be negative",
        ));
    }
    Ok(())
}

fn validate_images(image: &[String]) -> Result<(), ApiError> {
    if image.is_empty() || image.len() > MAX_PRODUCT_IMAGES {
        return Err(ApiError::new(
            "validation_error",
            format!("between 1 and {MAX_PRODUCT_IMAGES} image references are required"),
        ));
    }
    for url in image {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ApiError::new(
                "validation_error",
                format!("'{url}' is not a valid image URL"),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public handlers
// ---------------------------------------------------------------------------

/// GET /api/product/list — the full catalog; the storefront filters
/// client-side.
pub(super) async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Envelope<ProductsData>>, ApiError> {
    let products = storefront_db::list_products(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?
        .into_iter()
        .map(ProductPayload::from)
        .collect();

    Ok(Envelope::data(ProductsData { products }))
}

/// POST /api/product/single — one catalog entry by id.
pub(super) async fn single_product(
    State(state): State<AppState>,
    Json(body): Json<SingleProductRequest>,
) -> Result<Json<Envelope<ProductData>>, ApiError> {
    let id = parse_object_id(&body.product_id, "Product not found")?;
    let product = storefront_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&e))?
        .ok_or_else(|| ApiError::new("not_found", "Product not found"))?;

    Ok(Envelope::data(ProductData {
        product: product.into(),
    }))
}

// ---------------------------------------------------------------------------
// Admin handlers
// ---------------------------------------------------------------------------

/// POST /api/product/add — create a catalog entry.
pub(super) async fn add_product(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<AddProductRequest>,
) -> Result<(StatusCode, Json<Envelope<NoData>>), ApiError> {
    ensure_admin(&current)?;

    validate_name(&body.name)?;
    validate_price(body.price)?;
    validate_stock(body.stock)?;
    validate_images(&body.image)?;

    storefront_db::create_product(
        &state.pool,
        body.name.trim(),
        &body.description,
        body.price,
        &body.category,
        &body.sub_category,
        body.stock,
        body.bestseller,
        &body.sizes,
        &body.image,
    )
    .await
    .map_err(|e| map_db_error(&e))?;

    Ok((StatusCode::CREATED, Envelope::message("Product Added")))
}

/// POST /api/product/update — edit a catalog entry; images are replaced
/// only when new references are supplied.
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<Envelope<NoData>>, ApiError> {
    ensure_admin(&current)?;

    let id = parse_object_id(&body.id, "Product not found")?;
    if let Some(ref name) = body.name {
        validate_name(name)?;
    }
    if let Some(price) = body.price {
        validate_price(price)?;
    }
    if let Some(ref image) = body.image {
        validate_images(image)?;
    }

    storefront_db::update_product(
        &state.pool,
        id,
        body.name.as_deref().map(str::trim),
        body.description.as_deref(),
        body.price,
        body.category.as_deref(),
        body.sub_category.as_deref(),
        body.bestseller,
        body.sizes.as_deref(),
        body.image.as_deref(),
    )
    .await
    .map_err(|e| match e {
        storefront_db::DbError::NotFound => ApiError::new("not_found", "Product not found"),
        other => map_db_error(&other),
    })?;

    Ok(Envelope::message("Product Updated"))
}

/// POST /api/product/remove — hard-delete a catalog entry.
pub(super) async fn remove_product(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<RemoveProductRequest>,
) -> Result<Json<Envelope<NoData>>, ApiError> {
    ensure_admin(&current)?;

    let id = parse_object_id(&body.id, "Product not found")?;
    let deleted = storefront_db::delete_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&e))?;

    if !deleted {
        return Err(ApiError::new("not_found", "Product not found"));
    }

    Ok(Envelope::message("Product Removed"))
}

/// POST /api/product/update-stock — set the stock level.
pub(super) async fn update_stock(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<UpdateStockRequest>,
) -> Result<Json<Envelope<NoData>>, ApiError> {
    ensure_admin(&current)?;

    let id = parse_object_id(&body.product_id, "Product not found")?;
    validate_stock(body.stock)?;

    let updated = storefront_db::update_stock(&state.pool, id, body.stock)
        .await
        .map_err(|e| map_db_error(&e))?;

    if !updated {
        return Err(ApiError::new("not_found", "Product not found"));
    }

    Ok(Envelope::message("Stock updated successfully!"))
}

/// POST /api/product/update-status — flip a product between active and
/// inactive without touching the rest of the record.
pub(super) async fn update_status(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Envelope<ProductData>>, ApiError> {
    ensure_admin(&current)?;

    let id = parse_object_id(&body.id, "Product not found")?;
    if body.status != "active" && body.status != "inactive" {
        return Err(ApiError::new(
            "validation_error",
            format!("status must be 'active' or 'inactive', got '{}'", body.status),
        ));
    }

    let updated = storefront_db::update_product_status(&state.pool, id, &body.status)
        .await
        .map_err(|e| map_db_error(&e))?;

    if !updated {
        return Err(ApiError::new("not_found", "Product not found"));
    }

    let product = storefront_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&e))?
        .ok_or_else(|| ApiError::new("not_found", "Product not found"))?;

    Ok(Envelope::data(ProductData {
        product: product.into(),
    }))
}
