//! Database operations for the `orders` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, PgPool};
use storefront_core::{OrderAddress, OrderItem};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `orders` table.
///
/// `items` and `address` are JSONB snapshots fixed at placement time; the
/// live catalog and user profile can change or disappear without touching
/// them. Only [`update_order`] — the audited admin override — rewrites them.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub user_id: i64,
    pub items: Json<Vec<OrderItem>>,
    pub address: Json<OrderAddress>,
    pub amount: Decimal,
    pub status: String,
    pub payment: bool,
    pub payment_method: String,
    pub return_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Creates a new order in "Order Placed" status and returns the full row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_order(
    pool: &PgPool,
    user_id: i64,
    items: &[OrderItem],
    address: &OrderAddress,
    amount: Decimal,
    payment_method: &str,
) -> Result<OrderRow, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(
        "INSERT INTO orders (user_id, items, address, amount, payment_method) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, user_id, items, address, amount, status, payment, payment_method, \
                   return_reason, cancellation_reason, created_at, updated_at",
    )
    .bind(user_id)
    .bind(Json(items))
    .bind(Json(address))
    .bind(amount)
    .bind(payment_method)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns the owning user's orders, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_orders_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<OrderRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderRow>(
        "SELECT id, user_id, items, address, amount, status, payment, payment_method, \
                return_reason, cancellation_reason, created_at, updated_at \
         FROM orders \
         WHERE user_id = $1 \
         ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns all orders, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_all_orders(pool: &PgPool) -> Result<Vec<OrderRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderRow>(
        "SELECT id, user_id, items, address, amount, status, payment, payment_method, \
                return_reason, cancellation_reason, created_at, updated_at \
         FROM orders \
         ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single order by id, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_order(pool: &PgPool, id: i64) -> Result<Option<OrderRow>, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(
        "SELECT id, user_id, items, address, amount, status, payment, payment_method, \
                return_reason, cancellation_reason, created_at, updated_at \
         FROM orders \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Applies a validated status transition, guarded on the expected current
/// status so two writers cannot double-apply the same edge.
///
/// Reason strings accompany the cancel and return-request edges; marking an
/// order Delivered under COD also flips the paid flag (payment on delivery).
///
/// # Errors
///
/// Returns [`DbError::InvalidStatusTransition`] if the order has already
/// left `expected_status`, or [`DbError::Sqlx`] if the update fails.
pub async fn set_order_status(
    pool: &PgPool,
    id: i64,
    expected_status: &str,
    next_status: &str,
    return_reason: Option<&str>,
    cancellation_reason: Option<&str>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE orders \
         SET status = $3, \
             return_reason = COALESCE($4, return_reason), \
             cancellation_reason = COALESCE($5, cancellation_reason), \
             payment = payment OR ($3 = 'Delivered' AND payment_method = 'cod'), \
             updated_at = NOW() \
         WHERE id = $1 AND status = $2",
    )
    .bind(id)
    .bind(expected_status)
    .bind(next_status)
    .bind(return_reason)
    .bind(cancellation_reason)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidStatusTransition {
            id,
            expected_status: expected_status.to_string(),
        });
    }

    Ok(())
}

/// Admin full edit of an order: item lines, address, amount, and payment
/// metadata. `Some(v)` sets a field, `None` preserves it.
///
/// This deliberately bypasses the snapshot-immutability rule and never
/// touches `status`; callers log it as an administrative override.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the order does not exist, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_order(
    pool: &PgPool,
    id: i64,
    items: Option<&[OrderItem]>,
    address: Option<&OrderAddress>,
    amount: Option<Decimal>,
    payment: Option<bool>,
    payment_method: Option<&str>,
) -> Result<OrderRow, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(
        "UPDATE orders \
         SET items          = COALESCE($2, items), \
             address        = COALESCE($3, address), \
             amount         = COALESCE($4, amount), \
             payment        = COALESCE($5, payment), \
             payment_method = COALESCE($6, payment_method), \
             updated_at     = NOW() \
         WHERE id = $1 \
         RETURNING id, user_id, items, address, amount, status, payment, payment_method, \
                   return_reason, cancellation_reason, created_at, updated_at",
    )
    .bind(id)
    .bind(items.map(Json))
    .bind(address.map(Json))
    .bind(amount)
    .bind(payment)
    .bind(payment_method)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}
