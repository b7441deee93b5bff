//! Database operations for the `products` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, PgPool};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `products` table.
///
/// `sizes` and `image` are JSONB arrays; `image` holds 1–4 URL references
/// (validated at the API boundary, not by the schema).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub sub_category: String,
    pub stock: i32,
    pub bestseller: bool,
    pub sizes: Json<Vec<String>>,
    pub image: Json<Vec<String>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Creates a new product row and returns it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
#[allow(clippy::too_many_arguments)] // public API for full product creation; no sensible grouping
pub async fn create_product(
    pool: &PgPool,
    name: &str,
    description: &str,
    price: Decimal,
    category: &str,
    sub_category: &str,
    stock: i32,
    bestseller: bool,
    sizes: &[String],
    image: &[String],
) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "INSERT INTO products \
             (name, description, price, category, sub_category, stock, bestseller, sizes, image) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id, name, description, price, category, sub_category, stock, bestseller, \
                   sizes, image, status, created_at, updated_at",
    )
    .bind(name)
    .bind(description)
    .bind(price)
    .bind(category)
    .bind(sub_category)
    .bind(stock)
    .bind(bestseller)
    .bind(Json(sizes))
    .bind(Json(image))
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns all products, newest first.
///
/// The storefront filters by category/status client-side, so this is the
/// single catalog read both UIs share.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(pool: &PgPool) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, description, price, category, sub_category, stock, bestseller, \
                sizes, image, status, created_at, updated_at \
         FROM products \
         ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single product by id, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, description, price, category, sub_category, stock, bestseller, \
                sizes, image, status, created_at, updated_at \
         FROM products \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Updates product fields. `Some(v)` sets a field, `None` preserves it.
///
/// `sizes` and `image` are replaced wholesale when supplied — the admin
/// form always submits the complete arrays.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the product does not exist, or
/// [`DbError::Sqlx`] if the query fails.
#[allow(clippy::too_many_arguments)] // public API for partial product update; no sensible grouping
pub async fn update_product(
    pool: &PgPool,
    id: i64,
    name: Option<&str>,
    description: Option<&str>,
    price: Option<Decimal>,
    category: Option<&str>,
    sub_category: Option<&str>,
    bestseller: Option<bool>,
    sizes: Option<&[String]>,
    image: Option<&[String]>,
) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "UPDATE products \
         SET name         = COALESCE($2, name), \
             description  = COALESCE($3, description), \
             price        = COALESCE($4, price), \
             category     = COALESCE($5, category), \
             sub_category = COALESCE($6, sub_category), \
             bestseller   = COALESCE($7, bestseller), \
             sizes        = COALESCE($8, sizes), \
             image        = COALESCE($9, image), \
             updated_at   = NOW() \
         WHERE id = $1 \
         RETURNING id, name, description, price, category, sub_category, stock, bestseller, \
                   sizes, image, status, created_at, updated_at",
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(price)
    .bind(category)
    .bind(sub_category)
    .bind(bestseller)
    .bind(sizes.map(Json))
    .bind(image.map(Json))
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Sets the stock level for a product. Returns `true` if a row was updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_stock(pool: &PgPool, id: i64, stock: i32) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE products \
         SET stock = $2, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(stock)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Sets the display status (`active`/`inactive`) for a product.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_product_status(pool: &PgPool, id: i64, status: &str) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE products \
         SET status = $2, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(status)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Hard-deletes a product. Returns `true` if a row was removed.
///
/// Order item snapshots keep the product's name and price, so history
/// survives the delete.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_product(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Decrements stock by the ordered quantity, flooring at zero.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn decrement_stock(pool: &PgPool, id: i64, quantity: i32) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE products \
         SET stock = GREATEST(stock - $2, 0), updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(quantity)
    .execute(pool)
    .await?;

    Ok(())
}
