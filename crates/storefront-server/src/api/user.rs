//! Account handlers: registration, login, profile, and admin user management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_core::{CartData, Role, WishlistData};

use crate::middleware::CurrentUser;

use super::{ensure_admin, map_db_error, ApiError, AppState, Envelope};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AdminUpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub suspended: Option<bool>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct TokenData {
    pub token: String,
}

/// A user record as the UIs consume it — `_id` string, camelCase fields,
/// and never the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserPayload {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub phone: String,
    pub role: String,
    pub suspended: bool,
    pub cart_data: CartData,
    pub wishlist_data: WishlistData,
    pub created_at: DateTime<Utc>,
}

impl From<storefront_db::UserRow> for UserPayload {
    fn from(row: storefront_db::UserRow) -> Self {
        Self {
            id: row.id.to_string(),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            address: row.address,
            phone: row.phone,
            role: row.role,
            suspended: row.suspended,
            cart_data: row.cart_data.0,
            wishlist_data: row.wishlist_data.0,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct UserData {
    pub user: UserPayload,
}

#[derive(Debug, Serialize)]
pub(super) struct UsersData {
    pub users: Vec<UserPayload>,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn validate_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn validate_phone(raw: &str) -> bool {
    let digits = raw.chars().filter(char::is_ascii_digit).count();
    digits >= 7
        && raw
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
}

fn validate_registration(body: &RegisterRequest) -> Result<(), ApiError> {
    if body.first_name.trim().is_empty() || body.last_name.trim().is_empty() {
        return Err(ApiError::new(
            "validation_error",
            "First and last name are required",
        ));
    }
    if !validate_email(&body.email) {
        return Err(ApiError::new(
            "validation_error",
            "Please enter a valid email",
        ));
    }
    if body.password.len() < 8 {
        return Err(ApiError::new(
            "validation_error",
            "Please enter a strong password",
        ));
    }
    if !body.phone.is_empty() && !validate_phone(&body.phone) {
        return Err(ApiError::new(
            "validation_error",
            "Please enter a valid phone number",
        ));
    }
    Ok(())
}

fn map_unique_violation(e: &storefront_db::DbError) -> ApiError {
    if let storefront_db::DbError::Sqlx(sqlx::Error::Database(db_err)) = e {
        if db_err.code().as_deref() == Some("23505") {
            return ApiError::new("conflict", "User already exists");
        }
    }
    map_db_error(e)
}

async fn register_with_role(
    state: &AppState,
    body: RegisterRequest,
    role: Role,
) -> Result<Json<Envelope<TokenData>>, ApiError> {
    validate_registration(&body)?;

    if storefront_db::get_user_by_email(&state.pool, &body.email)
        .await
        .map_err(|e| map_db_error(&e))?
        .is_some()
    {
        return Err(ApiError::new("conflict", "User already exists"));
    }

    let password_hash = bcrypt::hash(&body.password, bcrypt::DEFAULT_COST).map_err(|e| {
        tracing::error!(error = %e, "password hashing failed");
        ApiError::new("internal_error", "Internal server error")
    })?;

    let user = storefront_db::create_user(
        &state.pool,
        body.first_name.trim(),
        body.last_name.trim(),
        &body.email,
        &password_hash,
        &body.address,
        &body.phone,
        role.as_str(),
    )
    .await
    .map_err(|e| map_unique_violation(&e))?;

    let token = issue_token_or_internal(state, user.id)?;
    Ok(Envelope::data(TokenData { token }))
}

fn issue_token_or_internal(state: &AppState, user_id: i64) -> Result<String, ApiError> {
    state.auth.issue_token(user_id).map_err(|e| {
        tracing::error!(error = %e, "token signing failed");
        ApiError::new("internal_error", "Internal server error")
    })
}

// ---------------------------------------------------------------------------
// Public handlers
// ---------------------------------------------------------------------------

/// POST /api/user/register — create a storefront account.
pub(super) async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<Envelope<TokenData>>, ApiError> {
    register_with_role(&state, body, Role::User).await
}

/// POST /api/user/register-admin — bootstrap creation of an admin account.
pub(super) async fn register_admin(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<Envelope<TokenData>>, ApiError> {
    register_with_role(&state, body, Role::Admin).await
}

/// POST /api/user/login — storefront login.
pub(super) async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Envelope<TokenData>>, ApiError> {
    let Some(user) = storefront_db::get_user_by_email(&state.pool, &body.email)
        .await
        .map_err(|e| map_db_error(&e))?
    else {
        return Err(ApiError::new("not_found", "User doesn't exists"));
    };

    if !bcrypt::verify(&body.password, &user.password_hash).unwrap_or(false) {
        return Err(ApiError::new("unauthorized", "Invalid credentials"));
    }

    let token = issue_token_or_internal(&state, user.id)?;
    Ok(Envelope::data(TokenData { token }))
}

/// POST /api/user/admin — admin console login.
///
/// Same flow as [`login`], but the account must carry the admin role; a
/// matching password on a non-admin account is still "Invalid credentials"
/// so the endpoint does not reveal which accounts are admins.
pub(super) async fn admin_login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Envelope<TokenData>>, ApiError> {
    let Some(user) = storefront_db::get_user_by_email(&state.pool, &body.email)
        .await
        .map_err(|e| map_db_error(&e))?
    else {
        return Err(ApiError::new("unauthorized", "Invalid credentials"));
    };

    let password_ok = bcrypt::verify(&body.password, &user.password_hash).unwrap_or(false);
    let is_admin = Role::parse(&user.role).is_some_and(Role::is_admin);
    if !password_ok || !is_admin {
        return Err(ApiError::new("unauthorized", "Invalid credentials"));
    }

    let token = issue_token_or_internal(&state, user.id)?;
    Ok(Envelope::data(TokenData { token }))
}

// ---------------------------------------------------------------------------
// Authenticated handlers
// ---------------------------------------------------------------------------

/// GET /api/user/profile — the calling user's record.
pub(super) async fn get_profile(
    Extension(current): Extension<CurrentUser>,
) -> Json<Envelope<UserData>> {
    Envelope::data(UserData {
        user: current.0.into(),
    })
}

/// PUT /api/user/profile — edit the calling user's names, address, phone.
pub(super) async fn update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<Envelope<UserData>>, ApiError> {
    let updated = storefront_db::update_profile(
        &state.pool,
        current.0.id,
        body.first_name.as_deref(),
        body.last_name.as_deref(),
        body.address.as_deref(),
        body.phone.as_deref(),
    )
    .await
    .map_err(|e| map_db_error(&e))?;

    Ok(Envelope::data(UserData {
        user: updated.into(),
    }))
}

// ---------------------------------------------------------------------------
// Admin handlers
// ---------------------------------------------------------------------------

/// GET /api/user/all — every registered user.
pub(super) async fn list_users(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Envelope<UsersData>>, ApiError> {
    ensure_admin(&current)?;

    let users = storefront_db::list_users(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?
        .into_iter()
        .map(UserPayload::from)
        .collect();

    Ok(Envelope::data(UsersData { users }))
}

/// PUT /api/user/:id — admin edit of any user, including role and
/// suspension flag.
pub(super) async fn admin_update_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<AdminUpdateUserRequest>,
) -> Result<Json<Envelope<UserData>>, ApiError> {
    ensure_admin(&current)?;

    if let Some(ref role) = body.role {
        if Role::parse(role).is_none() {
            return Err(ApiError::new(
                "validation_error",
                format!("role must be 'user' or 'admin', got '{role}'"),
            ));
        }
    }
    if let Some(ref email) = body.email {
        if !validate_email(email) {
            return Err(ApiError::new(
                "validation_error",
                "Please enter a valid email",
            ));
        }
    }

    let updated = storefront_db::admin_update_user(
        &state.pool,
        id,
        body.first_name.as_deref(),
        body.last_name.as_deref(),
        body.email.as_deref(),
        body.address.as_deref(),
        body.phone.as_deref(),
        body.role.as_deref(),
        body.suspended,
    )
    .await
    .map_err(|e| match e {
        storefront_db::DbError::NotFound => ApiError::new("not_found", "User not found"),
        other => map_unique_violation(&other),
    })?;

    Ok(Envelope::data(UserData {
        user: updated.into(),
    }))
}

/// DELETE /api/user/:id — hard-delete an account.
pub(super) async fn delete_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<Envelope<super::NoData>>), ApiError> {
    ensure_admin(&current)?;

    let deleted = storefront_db::delete_user(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&e))?;

    if !deleted {
        return Err(ApiError::new("not_found", "User not found"));
    }

    Ok((StatusCode::OK, Envelope::message("User deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_email_accepts_plain_addresses() {
        assert!(validate_email("a@b.com"));
        assert!(validate_email("first.last@shop.example.co"));
    }

    #[test]
    fn validate_email_rejects_malformed_addresses() {
        assert!(!validate_email("not-an-email"));
        assert!(!validate_email("@missing-local.com"));
        assert!(!validate_email("user@nodot"));
        assert!(!validate_email("user@.leading-dot"));
    }

    #[test]
    fn validate_phone_requires_enough_digits() {
        assert!(validate_phone("555-010-0199"));
        assert!(validate_phone("+1 (512) 555 0100"));
        assert!(!validate_phone("123"));
        assert!(!validate_phone("call me maybe"));
    }
}
