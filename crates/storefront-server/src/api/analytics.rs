//! Admin sales-analytics handler.

use axum::{extract::State, Extension, Json};
use chrono::{Datelike, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::middleware::CurrentUser;

use super::{ensure_admin, map_db_error, ApiError, AppState, Envelope};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TopProductEntry {
    pub product_id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OverviewPayload {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    pub total_orders: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_month_revenue: Decimal,
    pub total_customers: i64,
    pub new_customers_this_month: i64,
    pub top_products: Vec<TopProductEntry>,
}

#[derive(Debug, Serialize)]
pub(super) struct OverviewData {
    pub data: OverviewPayload,
}

/// GET /api/analytics/overview — revenue, order and customer counts, and
/// the top-5 products by revenue. Aggregated per request, no caching.
pub(super) async fn overview(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Envelope<OverviewData>>, ApiError> {
    ensure_admin(&current)?;

    let now = Utc::now();
    let start_of_month = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .ok_or_else(|| ApiError::new("internal_error", "Internal server error"))?;

    let total_revenue = storefront_db::total_revenue(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?;
    let current_month_revenue = storefront_db::month_revenue(&state.pool, start_of_month)
        .await
        .map_err(|e| map_db_error(&e))?;
    let total_orders = storefront_db::count_orders(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?;
    let total_customers = storefront_db::count_users(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?;
    let new_customers_this_month =
        storefront_db::count_users_since(&state.pool, start_of_month)
            .await
            .map_err(|e| map_db_error(&e))?;
    let top_products = storefront_db::top_products(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?
        .into_iter()
        .map(|row| TopProductEntry {
            product_id: row.product_id,
            name: row.product_name,
            revenue: row.revenue,
        })
        .collect();

    Ok(Envelope::data(OverviewData {
        data: OverviewPayload {
            total_revenue,
            total_orders,
            current_month_revenue,
            total_customers,
            new_customers_this_month,
            top_products,
        },
    }))
}
