//! Order handlers: checkout, history, the status workflow, and the admin
//! override edit.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_core::{
    transition, OrderAddress, OrderItem, OrderStatus, PaymentMethod, Role, TransitionError,
};
use uuid::Uuid;

use crate::middleware::CurrentUser;

use super::{ensure_admin, map_db_error, parse_object_id, ApiError, AppState, Envelope};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PlaceOrderItem {
    pub item_id: String,
    pub size: String,
    pub quantity: u32,
}

/// The storefront also submits its locally computed `amount`; it is
/// accepted for compatibility but the server recomputes from live catalog
/// prices.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PlaceOrderRequest {
    pub address: OrderAddress,
    pub items: Vec<PlaceOrderItem>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[allow(dead_code)]
    pub amount: Option<Decimal>,
    pub method: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SetStatusRequest {
    pub order_id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ReturnRequestBody {
    pub order_id: String,
    pub return_reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CancelOrderRequest {
    pub order_id: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AdminUpdateOrderRequest {
    pub items: Option<Vec<OrderItem>>,
    pub address: Option<OrderAddress>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    pub payment: Option<bool>,
    pub payment_method: Option<String>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// An order as the UIs consume it — `_id` string, camelCase fields,
/// `date` in epoch milliseconds.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OrderPayload {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub address: OrderAddress,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub status: String,
    pub payment: bool,
    pub payment_method: String,
    pub date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}

impl From<storefront_db::OrderRow> for OrderPayload {
    fn from(row: storefront_db::OrderRow) -> Self {
        Self {
            id: row.id.to_string(),
            user_id: row.user_id.to_string(),
            items: row.items.0,
            address: row.address.0,
            amount: row.amount,
            status: row.status,
            payment: row.payment,
            payment_method: row.payment_method,
            date: row.created_at.timestamp_millis(),
            return_reason: row.return_reason,
            cancellation_reason: row.cancellation_reason,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PlaceOrderData {
    pub order_id: String,
    /// Present for redirect payment methods only; the client forwards the
    /// shopper to the gateway using this opaque reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct OrdersData {
    pub orders: Vec<OrderPayload>,
}

#[derive(Debug, Serialize)]
pub(super) struct OrderData {
    pub order: OrderPayload,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn map_transition_error(e: &TransitionError) -> ApiError {
    match e {
        TransitionError::Forbidden { .. } => ApiError::new("forbidden", e.to_string()),
        TransitionError::InvalidTransition { .. } | TransitionError::UnknownStatus(_) => {
            ApiError::new("validation_error", e.to_string())
        }
    }
}

fn actor_role(current: &CurrentUser) -> Role {
    Role::parse(&current.0.role).unwrap_or(Role::User)
}

async fn resolve_order(
    state: &AppState,
    raw_id: &str,
) -> Result<storefront_db::OrderRow, ApiError> {
    let id = parse_object_id(raw_id, "Order not found")?;
    storefront_db::get_order(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&e))?
        .ok_or_else(|| ApiError::new("not_found", "Order not found"))
}

fn current_status(order: &storefront_db::OrderRow) -> Result<OrderStatus, ApiError> {
    order
        .status
        .parse::<OrderStatus>()
        .map_err(|e| map_transition_error(&e))
}

/// Applies a validated transition with the guarded update, translating a
/// lost race into a validation error.
async fn apply_transition(
    state: &AppState,
    order: &storefront_db::OrderRow,
    next: OrderStatus,
    actor: Role,
    return_reason: Option<&str>,
    cancellation_reason: Option<&str>,
) -> Result<(), ApiError> {
    let current = current_status(order)?;
    transition(current, next, actor).map_err(|e| map_transition_error(&e))?;

    storefront_db::set_order_status(
        &state.pool,
        order.id,
        current.as_str(),
        next.as_str(),
        return_reason,
        cancellation_reason,
    )
    .await
    .map_err(|e| match e {
        storefront_db::DbError::InvalidStatusTransition { .. } => ApiError::new(
            "validation_error",
            "Order status changed concurrently, reload and retry",
        ),
        other => map_db_error(&other),
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/order/place — create an order from the submitted line items.
///
/// Every line is re-resolved against the live catalog: current prices are
/// snapshotted into the order, unknown or inactive products fail the whole
/// placement, and stock is decremented per line. COD placement clears the
/// server-side cart; redirect methods leave it intact until the gateway
/// confirms payment, so an abandoned redirect does not lose the cart.
pub(super) async fn place_order(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Envelope<PlaceOrderData>>), ApiError> {
    if body.items.is_empty() {
        return Err(ApiError::new(
            "validation_error",
            "Cannot place an order with an empty cart",
        ));
    }
    let Some(method) = PaymentMethod::parse(&body.method) else {
        return Err(ApiError::new(
            "validation_error",
            format!("Unknown payment method '{}'", body.method),
        ));
    };

    let mut items: Vec<OrderItem> = Vec::with_capacity(body.items.len());
    for line in &body.items {
        if line.quantity == 0 {
            return Err(ApiError::new(
                "validation_error",
                "Item quantity must be at least 1",
            ));
        }
        let product_id = parse_object_id(&line.item_id, "Product not found")?;
        let product = storefront_db::get_product(&state.pool, product_id)
            .await
            .map_err(|e| map_db_error(&e))?
            .ok_or_else(|| ApiError::new("not_found", "Product not found"))?;
        if product.status != "active" {
            return Err(ApiError::new(
                "validation_error",
                format!("'{}' is no longer available", product.name),
            ));
        }
        items.push(OrderItem {
            product_id: product.id,
            name: product.name,
            price: product.price,
            image: product.image.0,
            size: line.size.clone(),
            quantity: line.quantity,
        });
    }

    let amount: Decimal =
        items.iter().map(OrderItem::line_total).sum::<Decimal>() + state.delivery_fee;

    let order = storefront_db::create_order(
        &state.pool,
        current.0.id,
        &items,
        &body.address,
        amount,
        method.as_str(),
    )
    .await
    .map_err(|e| map_db_error(&e))?;

    for item in &items {
        let quantity = i32::try_from(item.quantity).unwrap_or(i32::MAX);
        storefront_db::decrement_stock(&state.pool, item.product_id, quantity)
            .await
            .map_err(|e| map_db_error(&e))?;
    }

    let payment_reference = if method.is_redirect() {
        Some(format!("pay_{}_{}", order.id, Uuid::new_v4().simple()))
    } else {
        storefront_db::save_cart_data(&state.pool, current.0.id, &storefront_core::CartData::new())
            .await
            .map_err(|e| map_db_error(&e))?;
        None
    };

    tracing::info!(
        order_id = order.id,
        user_id = current.0.id,
        method = method.as_str(),
        %amount,
        "order placed"
    );

    Ok((
        StatusCode::CREATED,
        Envelope::with_message(
            "Order Placed",
            PlaceOrderData {
                order_id: order.id.to_string(),
                payment_reference,
            },
        ),
    ))
}

/// POST /api/order/userorders — the calling user's order history.
pub(super) async fn user_orders(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Envelope<OrdersData>>, ApiError> {
    let orders = storefront_db::list_orders_for_user(&state.pool, current.0.id)
        .await
        .map_err(|e| map_db_error(&e))?
        .into_iter()
        .map(OrderPayload::from)
        .collect();

    Ok(Envelope::data(OrdersData { orders }))
}

/// POST /api/order/list — every order, for the admin console.
pub(super) async fn list_orders(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Envelope<OrdersData>>, ApiError> {
    ensure_admin(&current)?;

    let orders = storefront_db::list_all_orders(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?
        .into_iter()
        .map(OrderPayload::from)
        .collect();

    Ok(Envelope::data(OrdersData { orders }))
}

/// POST /api/order/status — admin-driven status transition, validated
/// against the adjacency table.
pub(super) async fn set_status(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<Envelope<super::NoData>>, ApiError> {
    ensure_admin(&current)?;

    let next = body
        .status
        .parse::<OrderStatus>()
        .map_err(|e| map_transition_error(&e))?;
    let order = resolve_order(&state, &body.order_id).await?;

    apply_transition(&state, &order, next, Role::Admin, None, None).await?;

    Ok(Envelope::message("Status Updated"))
}

/// POST /api/order/return-request — the owning user requests a
/// return/refund on a delivered order.
pub(super) async fn return_request(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<ReturnRequestBody>,
) -> Result<Json<Envelope<super::NoData>>, ApiError> {
    if body.return_reason.trim().is_empty() {
        return Err(ApiError::new(
            "validation_error",
            "A return reason is required",
        ));
    }

    let order = resolve_order(&state, &body.order_id).await?;
    if order.user_id != current.0.id && !actor_role(&current).is_admin() {
        return Err(ApiError::new("forbidden", "Access denied"));
    }

    apply_transition(
        &state,
        &order,
        OrderStatus::ReturnRequested,
        actor_role(&current),
        Some(body.return_reason.trim()),
        None,
    )
    .await?;

    Ok(Envelope::message("Return/refund request submitted"))
}

/// POST /api/order/cancel — the owning user cancels an order that has not
/// entered fulfillment.
pub(super) async fn cancel_order(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CancelOrderRequest>,
) -> Result<Json<Envelope<super::NoData>>, ApiError> {
    let order = resolve_order(&state, &body.order_id).await?;
    if order.user_id != current.0.id && !actor_role(&current).is_admin() {
        return Err(ApiError::new("forbidden", "Access denied"));
    }

    apply_transition(
        &state,
        &order,
        OrderStatus::Cancelled,
        actor_role(&current),
        None,
        body.reason.as_deref(),
    )
    .await?;

    Ok(Envelope::message("Order Cancelled"))
}

/// PUT /api/order/:id — admin full edit of item lines, address, and
/// payment metadata.
///
/// This intentionally bypasses the snapshot-immutability rule; it is the
/// audited override path and never touches `status`.
pub(super) async fn admin_update_order(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<AdminUpdateOrderRequest>,
) -> Result<Json<Envelope<OrderData>>, ApiError> {
    ensure_admin(&current)?;

    if let Some(ref items) = body.items {
        if items.is_empty() {
            return Err(ApiError::new(
                "validation_error",
                "An order must keep at least one item line",
            ));
        }
    }
    if let Some(ref method) = body.payment_method {
        if PaymentMethod::parse(method).is_none() {
            return Err(ApiError::new(
                "validation_error",
                format!("Unknown payment method '{method}'"),
            ));
        }
    }
    if let Some(amount) = body.amount {
        if amount.is_sign_negative() {
            return Err(ApiError::new(
                "validation_error",
                "amount must not be negative",
            ));
        }
    }

    let updated = storefront_db::update_order(
        &state.pool,
        id,
        body.items.as_deref(),
        body.address.as_ref(),
        body.amount,
        body.payment,
        body.payment_method.as_deref(),
    )
    .await
    .map_err(|e| match e {
        storefront_db::DbError::NotFound => ApiError::new("not_found", "Order not found"),
        other => map_db_error(&other),
    })?;

    tracing::warn!(
        order_id = id,
        admin_id = current.0.id,
        "administrative order override applied"
    );

    Ok(Envelope::data(OrderData {
        order: updated.into(),
    }))
}
