//! Cart handlers.
//!
//! Each mutation is a read-modify-write of the calling user's cart
//! document: apply the pure `CartData` operation, then persist the whole
//! mapping back. The storefront mirrors the same mapping locally and
//! reconciles against `POST /api/cart/get`.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use storefront_core::CartData;

use crate::middleware::CurrentUser;

use super::{map_db_error, parse_object_id, ApiError, AppState, Envelope, NoData};

// ---------------------------------------------------------------------------
// Request/response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AddToCartRequest {
    pub item_id: String,
    pub size: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpdateCartRequest {
    pub item_id: String,
    pub size: String,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CartDataBody {
    pub cart_data: CartData,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/cart/add — increment the (product, size) line by one.
///
/// The product must exist and be active; the size label is taken as-is
/// (the storefront only offers labels from the product's own size list).
pub(super) async fn add_to_cart(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<AddToCartRequest>,
) -> Result<Json<Envelope<NoData>>, ApiError> {
    if body.size.trim().is_empty() {
        return Err(ApiError::new("validation_error", "Size is required"));
    }

    let product_id = parse_object_id(&body.item_id, "Product not found")?;
    let product = storefront_db::get_product(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(&e))?
        .ok_or_else(|| ApiError::new("not_found", "Product not found"))?;
    if product.status != "active" {
        return Err(ApiError::new("validation_error", "Product is unavailable"));
    }

    let mut cart = current.0.cart_data.0;
    cart.add(&body.item_id, &body.size);

    storefront_db::save_cart_data(&state.pool, current.0.id, &cart)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Envelope::message("Added To Cart"))
}

/// POST /api/cart/update — set an explicit quantity on an existing line.
///
/// A quantity of zero (or less) removes the line; updating a line that is
/// not in the cart is an error rather than an implicit add.
pub(super) async fn update_cart(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<UpdateCartRequest>,
) -> Result<Json<Envelope<NoData>>, ApiError> {
    let mut cart = current.0.cart_data.0;

    if !cart.contains_line(&body.item_id, &body.size) {
        return Err(ApiError::new(
            "not_found",
            "Item not found in cart for update.",
        ));
    }

    let quantity = u32::try_from(body.quantity.max(0)).unwrap_or(0);
    cart.set_quantity(&body.item_id, &body.size, quantity);

    storefront_db::save_cart_data(&state.pool, current.0.id, &cart)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Envelope::message("Cart Updated"))
}

/// POST /api/cart/get — the full cart mapping, empty if never written.
pub(super) async fn get_cart(
    Extension(current): Extension<CurrentUser>,
) -> Json<Envelope<CartDataBody>> {
    Envelope::data(CartDataBody {
        cart_data: current.0.cart_data.0,
    })
}
