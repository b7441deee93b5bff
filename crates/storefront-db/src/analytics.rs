//! Read-model aggregation queries for the admin sales dashboard.
//!
//! Computed per request with no caching; acceptable at the intended data
//! volume, and documented as a scaling non-goal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// One entry of the top-products ranking.
///
/// Line items are grouped by the snapshot's `productId` field — the
/// canonical product identifier — so re-aggregation is stable even after
/// the live product is renamed or deleted.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopProductRow {
    pub product_id: String,
    pub product_name: String,
    pub revenue: Decimal,
}

/// Sum of `amount` over all paid orders.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn total_revenue(pool: &PgPool) -> Result<Decimal, DbError> {
    let total = sqlx::query_scalar::<_, Decimal>(
        "SELECT COALESCE(SUM(amount), 0)::numeric(12,2) FROM orders WHERE payment = true",
    )
    .fetch_one(pool)
    .await?;

    Ok(total)
}

/// Sum of `amount` over paid orders created on or after the given instant.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn month_revenue(pool: &PgPool, since: DateTime<Utc>) -> Result<Decimal, DbError> {
    let total = sqlx::query_scalar::<_, Decimal>(
        "SELECT COALESCE(SUM(amount), 0)::numeric(12,2) \
         FROM orders \
         WHERE payment = true AND created_at >= $1",
    )
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(total)
}

/// Count of all orders, paid or not.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_orders(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Top five products by revenue across paid orders.
///
/// Unwinds the `items` JSONB array, groups by the line's `productId`, and
/// sums price × quantity per group. Revenue ties break on the grouping key
/// so the ranking is deterministic across re-aggregation.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn top_products(pool: &PgPool) -> Result<Vec<TopProductRow>, DbError> {
    let rows = sqlx::query_as::<_, TopProductRow>(
        "SELECT item->>'productId' AS product_id, \
                MIN(item->>'name') AS product_name, \
                SUM((item->>'price')::numeric * (item->>'quantity')::numeric)::numeric(12,2) \
                    AS revenue \
         FROM orders o \
         CROSS JOIN LATERAL jsonb_array_elements(o.items) AS item \
         WHERE o.payment = true \
         GROUP BY item->>'productId' \
         ORDER BY revenue DESC, product_id \
         LIMIT 5",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
