//! Database operations for the `users` table.

use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool};
use storefront_core::{CartData, WishlistData};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `users` table.
///
/// `cart_data` and `wishlist_data` are whole JSONB documents; the
/// application always reads and writes them as complete mappings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub address: String,
    pub phone: String,
    pub role: String,
    pub suspended: bool,
    pub cart_data: Json<CartData>,
    pub wishlist_data: Json<WishlistData>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Creates a new user row and returns it.
///
/// A duplicate email violates the unique constraint; callers map the
/// Postgres 23505 code to a conflict response.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_user(
    pool: &PgPool,
    first_name: &str,
    last_name: &str,
    email: &str,
    password_hash: &str,
    address: &str,
    phone: &str,
    role: &str,
) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (first_name, last_name, email, password_hash, address, phone, role) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, first_name, last_name, email, password_hash, address, phone, \
                   role, suspended, cart_data, wishlist_data, created_at, updated_at",
    )
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(password_hash)
    .bind(address)
    .bind(phone)
    .bind(role)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns a user by id, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_id(pool: &PgPool, id: i64) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, first_name, last_name, email, password_hash, address, phone, \
                role, suspended, cart_data, wishlist_data, created_at, updated_at \
         FROM users \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns a user by email, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, first_name, last_name, email, password_hash, address, phone, \
                role, suspended, cart_data, wishlist_data, created_at, updated_at \
         FROM users \
         WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns all users, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_users(pool: &PgPool) -> Result<Vec<UserRow>, DbError> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, first_name, last_name, email, password_hash, address, phone, \
                role, suspended, cart_data, wishlist_data, created_at, updated_at \
         FROM users \
         ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Updates the caller-editable profile fields of a user.
///
/// `Some(v)` sets a field, `None` preserves it, via `COALESCE` in a single
/// `UPDATE … RETURNING` statement.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the user does not exist, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_profile(
    pool: &PgPool,
    id: i64,
    first_name: Option<&str>,
    last_name: Option<&str>,
    address: Option<&str>,
    phone: Option<&str>,
) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "UPDATE users \
         SET first_name = COALESCE($2, first_name), \
             last_name  = COALESCE($3, last_name), \
             address    = COALESCE($4, address), \
             phone      = COALESCE($5, phone), \
             updated_at = NOW() \
         WHERE id = $1 \
         RETURNING id, first_name, last_name, email, password_hash, address, phone, \
                   role, suspended, cart_data, wishlist_data, created_at, updated_at",
    )
    .bind(id)
    .bind(first_name)
    .bind(last_name)
    .bind(address)
    .bind(phone)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Admin edit of a user record, including role and suspension flag.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the user does not exist, or
/// [`DbError::Sqlx`] if the query fails.
#[allow(clippy::too_many_arguments)] // public API for full user edit; no sensible grouping
pub async fn admin_update_user(
    pool: &PgPool,
    id: i64,
    first_name: Option<&str>,
    last_name: Option<&str>,
    email: Option<&str>,
    address: Option<&str>,
    phone: Option<&str>,
    role: Option<&str>,
    suspended: Option<bool>,
) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "UPDATE users \
         SET first_name = COALESCE($2, first_name), \
             last_name  = COALESCE($3, last_name), \
             email      = COALESCE($4, email), \
             address    = COALESCE($5, address), \
             phone      = COALESCE($6, phone), \
             role       = COALESCE($7, role), \
             suspended  = COALESCE($8, suspended), \
             updated_at = NOW() \
         WHERE id = $1 \
         RETURNING id, first_name, last_name, email, password_hash, address, phone, \
                   role, suspended, cart_data, wishlist_data, created_at, updated_at",
    )
    .bind(id)
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(address)
    .bind(phone)
    .bind(role)
    .bind(suspended)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Hard-deletes a user. Returns `true` if a row was removed.
///
/// Orders placed by the user are intentionally left in place; their item
/// and address snapshots carry everything the admin views need.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_user(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Total registered users.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_users(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Users created on or after the given instant.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_users_since(pool: &PgPool, since: DateTime<Utc>) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE created_at >= $1")
        .bind(since)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
