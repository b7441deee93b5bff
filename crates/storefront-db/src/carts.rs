//! Whole-document persistence of cart and wishlist mappings.
//!
//! Every shopping mutation is a read-modify-write of the owning user row:
//! the handler loads the document, applies the pure `storefront-core`
//! operation, and writes the complete mapping back. There is no partial
//! patch primitive; concurrent writers from two devices are last-write-wins.

use sqlx::{types::Json, PgPool};
use storefront_core::{CartData, WishlistData};

use crate::DbError;

/// Persists the full cart mapping back to the user record.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the user does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn save_cart_data(pool: &PgPool, user_id: i64, cart: &CartData) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE users \
         SET cart_data = $2, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(user_id)
    .bind(Json(cart))
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Persists the full wishlist mapping back to the user record.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the user does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn save_wishlist_data(
    pool: &PgPool,
    user_id: i64,
    wishlist: &WishlistData,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE users \
         SET wishlist_data = $2, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(user_id)
    .bind(Json(wishlist))
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
