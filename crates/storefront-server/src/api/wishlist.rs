//! Wishlist handlers: a flat product-id → presence mapping per user.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use storefront_core::WishlistData;

use crate::middleware::CurrentUser;

use super::{map_db_error, ApiError, AppState, Envelope, NoData};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WishlistItemRequest {
    pub item_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WishlistDataBody {
    pub wishlist_data: WishlistData,
}

/// POST /api/wishlist/add — flag a product. Idempotent.
pub(super) async fn add_to_wishlist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<WishlistItemRequest>,
) -> Result<Json<Envelope<NoData>>, ApiError> {
    if body.item_id.trim().is_empty() {
        return Err(ApiError::new("validation_error", "Item id is required"));
    }

    let mut wishlist = current.0.wishlist_data.0;
    wishlist.add(&body.item_id);

    storefront_db::save_wishlist_data(&state.pool, current.0.id, &wishlist)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Envelope::message("Added To Wishlist"))
}

/// POST /api/wishlist/remove — delete the key outright (never store false).
pub(super) async fn remove_from_wishlist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<WishlistItemRequest>,
) -> Result<Json<Envelope<NoData>>, ApiError> {
    let mut wishlist = current.0.wishlist_data.0;
    wishlist.remove(&body.item_id);

    storefront_db::save_wishlist_data(&state.pool, current.0.id, &wishlist)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Envelope::message("Removed From Wishlist"))
}

/// POST /api/wishlist/get — the full wishlist mapping.
pub(super) async fn get_wishlist(
    Extension(current): Extension<CurrentUser>,
) -> Json<Envelope<WishlistDataBody>> {
    Envelope::data(WishlistDataBody {
        wishlist_data: current.0.wishlist_data.0,
    })
}

/// POST /api/wishlist/clear — empty the mapping in one write.
pub(super) async fn clear_wishlist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Envelope<NoData>>, ApiError> {
    storefront_db::save_wishlist_data(&state.pool, current.0.id, &WishlistData::new())
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Envelope::message("Wishlist Cleared"))
}
