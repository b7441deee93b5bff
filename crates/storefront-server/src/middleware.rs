use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The authenticated user resolved from the bearer token, stored as a
/// request extension by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub storefront_db::UserRow);

/// JWT claims carried by every bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id, stringified.
    pub sub: String,
    /// Expiry as a Unix timestamp.
    pub exp: usize,
}

/// Token signing/verification settings plus the pool used to resolve a
/// verified token to its user record.
#[derive(Clone)]
pub struct AuthState {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    token_ttl_days: i64,
    pool: PgPool,
}

impl AuthState {
    #[must_use]
    pub fn new(jwt_secret: &str, token_ttl_days: i64, pool: PgPool) -> Self {
        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(jwt_secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(jwt_secret.as_bytes())),
            token_ttl_days,
            pool,
        }
    }

    #[must_use]
    pub fn from_config(config: &storefront_core::AppConfig, pool: PgPool) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl_days, pool)
    }

    /// Signs a bearer token for the given user id.
    ///
    /// # Errors
    ///
    /// Returns [`jsonwebtoken::errors::Error`] if signing fails.
    pub fn issue_token(&self, user_id: i64) -> Result<String, jsonwebtoken::errors::Error> {
        let expires_at = chrono::Utc::now() + chrono::Duration::days(self.token_ttl_days);
        let claims = Claims {
            sub: user_id.to_string(),
            exp: usize::try_from(expires_at.timestamp()).unwrap_or(usize::MAX),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Verifies a token and returns the embedded user id, if valid.
    fn verify(&self, token: &str) -> Option<i64> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())
                .ok()?;
        data.claims.sub.parse::<i64>().ok()
    }
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Sliding fixed-window limiter for simple API protection.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

// Failure bodies keep the `{success: false, message}` envelope the UIs
// parse, rather than a nested error object.
#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    success: bool,
    message: &'static str,
}

fn reject(status: StatusCode, message: &'static str) -> Response {
    (
        status,
        Json(MiddlewareErrorBody {
            success: false,
            message,
        }),
    )
        .into_response()
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing bearer-token auth and resolving the token to a
/// user record.
///
/// A missing, malformed, or expired token is 401. A token whose user row
/// no longer exists is 401 (the account was deleted). A suspended account
/// is 403 — the token verifies, but every authenticated operation is
/// refused.
pub async fn require_auth(State(auth): State<AuthState>, mut req: Request, next: Next) -> Response {
    let token = extract_bearer_token(req.headers().get(AUTHORIZATION));

    let Some(user_id) = token.and_then(|t| auth.verify(t)) else {
        return reject(StatusCode::UNAUTHORIZED, "Not Authorized, Login Again");
    };

    match storefront_db::get_user_by_id(&auth.pool, user_id).await {
        Ok(Some(user)) if user.suspended => reject(StatusCode::FORBIDDEN, "Account suspended"),
        Ok(Some(user)) => {
            req.extensions_mut().insert(CurrentUser(user));
            next.run(req).await
        }
        Ok(None) => reject(StatusCode::UNAUTHORIZED, "Not Authorized, Login Again"),
        Err(e) => {
            tracing::error!(error = %e, user_id, "failed to resolve authenticated user");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            )
        }
    }
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return reject(StatusCode::TOO_MANY_REQUESTS, "Too many requests");
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}
