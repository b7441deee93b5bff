//! Storefront and admin API handlers.
//!
//! Route areas:
//! - `/api/user`      — registration, login, profile, admin user management
//! - `/api/product`   — public catalog reads, admin CRUD/stock/status
//! - `/api/cart`      — the calling user's cart document
//! - `/api/wishlist`  — the calling user's wishlist document
//! - `/api/order`     — checkout, history, status workflow, admin override
//! - `/api/analytics` — admin sales overview
//!
//! Every mutating endpoint answers with the `{success, message?, …}`
//! envelope the UIs parse; failures are `success: false` plus the error
//! taxonomy's HTTP status. Request IDs travel in the `x-request-id` header.

mod analytics;
mod cart;
mod order;
mod product;
mod user;
mod wishlist;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_auth, AuthState, CurrentUser, RateLimitState,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth: AuthState,
    pub delivery_fee: Decimal,
}

/// The `{success, message?, …}` response body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

/// Marker for envelope responses that carry no payload beyond the message.
#[derive(Debug, Serialize)]
pub struct NoData {}

impl<T: Serialize> Envelope<T> {
    pub fn data(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
            data,
        })
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            data,
        })
    }
}

impl Envelope<NoData> {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            data: NoData {},
        })
    }
}

/// A failed request: a machine-readable code for the status mapping and a
/// human-readable message for the `success: false` envelope.
#[derive(Debug)]
pub struct ApiError {
    code: String,
    message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(serde_json::json!({ "success": false, "message": self.message })),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

/// Converts persistence failures at the handler boundary: not-found stays
/// typed, everything else is logged server-side and surfaced generically.
pub(super) fn map_db_error(error: &storefront_db::DbError) -> ApiError {
    match error {
        storefront_db::DbError::NotFound => ApiError::new("not_found", "Record not found"),
        other => {
            tracing::error!(error = %other, "database query failed");
            ApiError::new("internal_error", "Internal server error")
        }
    }
}

/// Parses the stringified ids the UIs submit. An unparseable id cannot
/// reference any record, so it maps to the caller's not-found message.
pub(super) fn parse_object_id(raw: &str, not_found_message: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::new("not_found", not_found_message))
}

/// The single capability check consulted by every admin handler.
pub(super) fn ensure_admin(current: &CurrentUser) -> Result<(), ApiError> {
    if storefront_core::Role::parse(&current.0.role).is_some_and(storefront_core::Role::is_admin) {
        Ok(())
    } else {
        Err(ApiError::new("forbidden", "Access denied"))
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn authenticated_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/cart/add", post(cart::add_to_cart))
        .route("/api/cart/update", post(cart::update_cart))
        .route("/api/cart/get", post(cart::get_cart))
        .route("/api/wishlist/add", post(wishlist::add_to_wishlist))
        .route("/api/wishlist/remove", post(wishlist::remove_from_wishlist))
        .route("/api/wishlist/get", post(wishlist::get_wishlist))
        .route("/api/wishlist/clear", post(wishlist::clear_wishlist))
        .route("/api/order/place", post(order::place_order))
        .route("/api/order/userorders", post(order::user_orders))
        .route("/api/order/return-request", post(order::return_request))
        .route("/api/order/cancel", post(order::cancel_order))
        .route(
            "/api/user/profile",
            get(user::get_profile).put(user::update_profile),
        )
        // Admin routes share the bearer-auth tier; each handler applies the
        // ensure_admin capability check before mutating anything.
        .route("/api/product/add", post(product::add_product))
        .route("/api/product/update", post(product::update_product))
        .route("/api/product/remove", post(product::remove_product))
        .route("/api/product/update-stock", post(product::update_stock))
        .route("/api/product/update-status", post(product::update_status))
        .route("/api/order/list", post(order::list_orders))
        .route("/api/order/status", post(order::set_status))
        .route("/api/order/{id}", put(order::admin_update_order))
        .route("/api/user/all", get(user::list_users))
        .route(
            "/api/user/{id}",
            put(user::admin_update_user).delete(user::delete_user),
        )
        .route("/api/analytics/overview", get(analytics::overview))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(auth, require_auth)),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/api/health", get(health))
        .route("/api/product/list", get(product::list_products))
        .route("/api/product/single", post(product::single_product))
        .route("/api/user/register", post(user::register))
        .route("/api/user/login", post(user::login))
        .route("/api/user/admin", post(user::admin_login))
        .route("/api/user/register-admin", post(user::register_admin));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match storefront_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Envelope::data(HealthData {
                status: "ok",
                database: "ok",
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Envelope::data(HealthData {
                    status: "degraded",
                    database: "unavailable",
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    // -------------------------------------------------------------------------
    // Unit tests (no DB)
    // -------------------------------------------------------------------------

    #[test]
    fn envelope_flattens_payload_next_to_success() {
        #[derive(Serialize)]
        struct Payload {
            token: &'static str,
        }

        let Json(envelope) = Envelope::data(Payload { token: "abc" });
        let value = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(value, json!({"success": true, "token": "abc"}));
    }

    #[test]
    fn envelope_message_skips_absent_payload() {
        let Json(envelope) = Envelope::message("Added To Cart");
        let value = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(value, json!({"success": true, "message": "Added To Cart"}));
    }

    #[test]
    fn api_error_maps_codes_to_statuses() {
        let cases = [
            ("validation_error", StatusCode::BAD_REQUEST),
            ("unauthorized", StatusCode::UNAUTHORIZED),
            ("forbidden", StatusCode::FORBIDDEN),
            ("not_found", StatusCode::NOT_FOUND),
            ("conflict", StatusCode::CONFLICT),
            ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            let response = ApiError::new(code, "boom").into_response();
            assert_eq!(response.status(), status, "code {code}");
        }
    }

    #[test]
    fn parse_object_id_rejects_garbage_as_not_found() {
        assert_eq!(parse_object_id(" 42 ", "nope").expect("parses"), 42);
        let err = parse_object_id("abc", "nope").unwrap_err().into_response();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    // -------------------------------------------------------------------------
    // Router integration tests (with DB)
    // -------------------------------------------------------------------------

    fn test_app(pool: sqlx::PgPool) -> Router {
        let auth = AuthState::new("test-secret", 30, pool.clone());
        build_app(
            AppState {
                pool,
                auth: auth.clone(),
                delivery_fee: Decimal::from(50),
            },
            auth,
            default_rate_limit_state(),
        )
    }

    /// Sends a request with an optional bearer token and JSON body, returning
    /// the status code and parsed body.
    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json parse")
        };
        (status, value)
    }

    /// Registers a storefront account and returns its bearer token.
    async fn register_user(app: &Router, email: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/user/register",
            None,
            Some(json!({
                "firstName": "Test",
                "lastName": "Shopper",
                "email": email,
                "password": "longenough",
                "phone": "5125550100",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        body["token"].as_str().expect("token").to_string()
    }

    /// Registers an admin account and returns its bearer token.
    async fn register_admin(app: &Router, email: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/user/register-admin",
            None,
            Some(json!({
                "firstName": "Test",
                "lastName": "Admin",
                "email": email,
                "password": "longenough",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "register-admin failed: {body}");
        body["token"].as_str().expect("token").to_string()
    }

    /// Inserts a catalog product directly and returns its id.
    async fn seed_product(pool: &sqlx::PgPool, name: &str, price: &str) -> i64 {
        let price: Decimal = price.parse().expect("price parses");
        let sizes = vec!["M".to_string(), "L".to_string()];
        let image = vec![format!("https://cdn.example.com/{name}.jpg")];
        storefront_db::create_product(pool, name, "desc", price, "Men", "Topwear", 25, false, &sizes, &image)
            .await
            .expect("seed product")
            .id
    }

    /// Places a COD order for one unit of the product and returns the order id.
    async fn place_cod_order(app: &Router, token: &str, product_id: i64) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/order/place",
            Some(token),
            Some(json!({
                "address": test_address(),
                "items": [{"itemId": product_id.to_string(), "size": "M", "quantity": 1}],
                "method": "cod",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "place failed: {body}");
        body["orderId"].as_str().expect("orderId").to_string()
    }

    fn test_address() -> Value {
        json!({
            "firstName": "Test", "lastName": "Shopper", "email": "ship@example.com",
            "street": "1 Main St", "city": "Austin", "state": "TX",
            "zipcode": "78701", "country": "US", "phone": "5125550100",
        })
    }

    /// Walks an order through admin transitions, asserting each step.
    async fn advance(app: &Router, admin_token: &str, order_id: &str, statuses: &[&str]) {
        for status in statuses {
            let (code, body) = send(
                app,
                "POST",
                "/api/order/status",
                Some(admin_token),
                Some(json!({"orderId": order_id, "status": status})),
            )
            .await;
            assert_eq!(code, StatusCode::OK, "advance to {status} failed: {body}");
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_reports_ok(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let (status, body) = send(&app, "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "ok");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn register_login_and_profile_roundtrip(pool: sqlx::PgPool) {
        let app = test_app(pool);
        register_user(&app, "a@b.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/user/login",
            None,
            Some(json!({"email": "a@b.com", "password": "longenough"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().expect("token").to_string();

        let (status, body) = send(&app, "GET", "/api/user/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "a@b.com");
        assert_eq!(body["user"]["role"], "user");
        assert!(body["user"].get("passwordHash").is_none(), "hash never leaves");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn admin_login_rejects_non_admin_accounts(pool: sqlx::PgPool) {
        let app = test_app(pool);
        register_user(&app, "shopper@example.com").await;
        register_admin(&app, "boss@example.com").await;

        // Correct password on a non-admin account still reads as bad
        // credentials, so the endpoint does not reveal which accounts are
        // admins.
        let (status, body) = send(
            &app,
            "POST",
            "/api/user/admin",
            None,
            Some(json!({"email": "shopper@example.com", "password": "longenough"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");

        let (status, body) = send(
            &app,
            "POST",
            "/api/user/admin",
            None,
            Some(json!({"email": "boss@example.com", "password": "longenough"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
        assert!(body["token"].as_str().is_some());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn duplicate_registration_conflicts(pool: sqlx::PgPool) {
        let app = test_app(pool);
        register_user(&app, "dup@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/user/register",
            None,
            Some(json!({
                "firstName": "Other", "lastName": "Person",
                "email": "dup@example.com", "password": "longenough",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "User already exists");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn short_password_is_a_validation_error(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let (status, body) = send(
            &app,
            "POST",
            "/api/user/register",
            None,
            Some(json!({
                "firstName": "T", "lastName": "S",
                "email": "short@example.com", "password": "short",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Please enter a strong password");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn cart_requires_a_bearer_token(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let (status, body) = send(&app, "POST", "/api/cart/get", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn cart_add_update_and_zero_removal_flow(pool: sqlx::PgPool) {
        let app = test_app(pool.clone());
        let token = register_user(&app, "cart@example.com").await;
        let product_id = seed_product(&pool, "cart-tee", "25.00").await;
        let key = product_id.to_string();

        for _ in 0..2 {
            let (status, body) = send(
                &app,
                "POST",
                "/api/cart/add",
                Some(&token),
                Some(json!({"itemId": key, "size": "M"})),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "add failed: {body}");
        }

        let (status, body) = send(&app, "POST", "/api/cart/get", Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cartData"][&key]["M"], 2);

        // Explicit quantity set, then zero removes the line entirely.
        let (status, _) = send(
            &app,
            "POST",
            "/api/cart/update",
            Some(&token),
            Some(json!({"itemId": key, "size": "M", "quantity": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            "POST",
            "/api/cart/update",
            Some(&token),
            Some(json!({"itemId": key, "size": "M", "quantity": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "POST", "/api/cart/get", Some(&token), Some(json!({}))).await;
        assert_eq!(body["cartData"], json!({}), "zero removes the product entry");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn cart_update_of_absent_line_fails(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let token = register_user(&app, "absent@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/cart/update",
            Some(&token),
            Some(json!({"itemId": "12345", "size": "M", "quantity": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Item not found in cart for update.");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn wishlist_roundtrip_and_clear(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let token = register_user(&app, "wish@example.com").await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/wishlist/add",
            Some(&token),
            Some(json!({"itemId": "101"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "POST", "/api/wishlist/get", Some(&token), Some(json!({}))).await;
        assert_eq!(body["wishlistData"]["101"], true);

        let (status, _) = send(
            &app,
            "POST",
            "/api/wishlist/remove",
            Some(&token),
            Some(json!({"itemId": "101"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "POST", "/api/wishlist/get", Some(&token), Some(json!({}))).await;
        assert_eq!(body["wishlistData"], json!({}), "add then remove is empty");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn cod_checkout_scenario_end_to_end(pool: sqlx::PgPool) {
        let app = test_app(pool.clone());
        let token = register_user(&app, "a@b.com").await;
        let product_id = seed_product(&pool, "scenario-tee", "25.00").await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/cart/add",
            Some(&token),
            Some(json!({"itemId": product_id.to_string(), "size": "M"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        place_cod_order(&app, &token, product_id).await;

        let (status, body) =
            send(&app, "POST", "/api/order/userorders", Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        let order = &body["orders"][0];
        assert_eq!(order["status"], "Order Placed");
        assert_eq!(order["payment"], false);
        assert_eq!(order["paymentMethod"], "cod");
        // amount = 25.00 price + 50 delivery fee, from live catalog prices.
        assert_eq!(order["amount"], 75.0);
        assert_eq!(order["items"][0]["quantity"], 1);

        let (_, body) = send(&app, "POST", "/api/cart/get", Some(&token), Some(json!({}))).await;
        assert_eq!(body["cartData"], json!({}), "COD placement clears the cart");

        // Stock decremented from 25 to 24.
        let product = storefront_db::get_product(&pool, product_id)
            .await
            .expect("get product")
            .expect("exists");
        assert_eq!(product.stock, 24);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn empty_cart_placement_creates_no_order(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let token = register_user(&app, "empty@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/order/place",
            Some(&token),
            Some(json!({"address": test_address(), "items": [], "method": "cod"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (_, body) =
            send(&app, "POST", "/api/order/userorders", Some(&token), Some(json!({}))).await;
        assert_eq!(body["orders"], json!([]), "no order row was created");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn placement_uses_live_prices_not_client_amount(pool: sqlx::PgPool) {
        let app = test_app(pool.clone());
        let token = register_user(&app, "stale@example.com").await;
        let product_id = seed_product(&pool, "stale-tee", "30.00").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/order/place",
            Some(&token),
            Some(json!({
                "address": test_address(),
                "items": [{"itemId": product_id.to_string(), "size": "M", "quantity": 2}],
                "amount": 1.0,
                "method": "cod",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "place failed: {body}");

        let (_, body) =
            send(&app, "POST", "/api/order/userorders", Some(&token), Some(json!({}))).await;
        assert_eq!(body["orders"][0]["amount"], 110.0, "2 × 30.00 + 50 fee");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn stripe_placement_returns_reference_and_keeps_cart(pool: sqlx::PgPool) {
        let app = test_app(pool.clone());
        let token = register_user(&app, "stripe@example.com").await;
        let product_id = seed_product(&pool, "stripe-tee", "25.00").await;
        let key = product_id.to_string();

        let (status, _) = send(
            &app,
            "POST",
            "/api/cart/add",
            Some(&token),
            Some(json!({"itemId": key, "size": "M"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "POST",
            "/api/order/place",
            Some(&token),
            Some(json!({
                "address": test_address(),
                "items": [{"itemId": key, "size": "M", "quantity": 1}],
                "method": "stripe",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(
            body["paymentReference"].as_str().is_some_and(|r| r.starts_with("pay_")),
            "redirect methods get a payment reference: {body}"
        );

        let (_, body) = send(&app, "POST", "/api/cart/get", Some(&token), Some(json!({}))).await;
        assert_eq!(
            body["cartData"][&key]["M"], 1,
            "cart survives until the gateway confirms"
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn user_cancel_allowed_only_while_placed(pool: sqlx::PgPool) {
        let app = test_app(pool.clone());
        let token = register_user(&app, "cancel@example.com").await;
        let admin = register_admin(&app, "cancel-admin@example.com").await;
        let product_id = seed_product(&pool, "cancel-tee", "25.00").await;

        // From Placed, the owner may cancel.
        let first = place_cod_order(&app, &token, product_id).await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/order/cancel",
            Some(&token),
            Some(json!({"orderId": first, "reason": "changed my mind"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Once fulfillment starts, the same request is forbidden.
        let second = place_cod_order(&app, &token, product_id).await;
        advance(&app, &admin, &second, &["Packing"]).await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/order/cancel",
            Some(&token),
            Some(json!({"orderId": second})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "cancel after Packing: {body}");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn return_request_allowed_only_from_delivered(pool: sqlx::PgPool) {
        let app = test_app(pool.clone());
        let token = register_user(&app, "return@example.com").await;
        let admin = register_admin(&app, "return-admin@example.com").await;
        let product_id = seed_product(&pool, "return-tee", "25.00").await;
        let order_id = place_cod_order(&app, &token, product_id).await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/order/return-request",
            Some(&token),
            Some(json!({"orderId": order_id, "returnReason": "wrong size"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "not yet delivered");

        advance(
            &app,
            &admin,
            &order_id,
            &["Packing", "Shipped", "Out for Delivery", "Delivered"],
        )
        .await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/order/return-request",
            Some(&token),
            Some(json!({"orderId": order_id, "returnReason": "wrong size"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Only an admin can resolve the request.
        let (status, _) = send(
            &app,
            "POST",
            "/api/order/status",
            Some(&admin),
            Some(json!({"orderId": order_id, "status": "Return Approved"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn admin_cannot_rewind_or_skip_statuses(pool: sqlx::PgPool) {
        let app = test_app(pool.clone());
        let token = register_user(&app, "strict@example.com").await;
        let admin = register_admin(&app, "strict-admin@example.com").await;
        let product_id = seed_product(&pool, "strict-tee", "25.00").await;
        let order_id = place_cod_order(&app, &token, product_id).await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/order/status",
            Some(&admin),
            Some(json!({"orderId": order_id, "status": "Delivered"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "skipping ahead is invalid");

        let (status, _) = send(
            &app,
            "POST",
            "/api/order/status",
            Some(&admin),
            Some(json!({"orderId": order_id, "status": "Nonsense Status"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "unknown status string");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn admin_surface_rejects_plain_users(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let token = register_user(&app, "plain@example.com").await;

        for (method, uri) in [
            ("POST", "/api/order/list"),
            ("GET", "/api/analytics/overview"),
            ("GET", "/api/user/all"),
        ] {
            let body = (method == "POST").then(|| json!({}));
            let (status, response) = send(&app, method, uri, Some(&token), body).await;
            assert_eq!(
                status,
                StatusCode::FORBIDDEN,
                "{method} {uri} must be admin-only: {response}"
            );
            assert_eq!(response["message"], "Access denied");
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn suspended_account_is_locked_out(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let token = register_user(&app, "suspended@example.com").await;
        let admin = register_admin(&app, "suspend-admin@example.com").await;

        let (_, profile) = send(&app, "GET", "/api/user/profile", Some(&token), None).await;
        let user_id = profile["user"]["_id"].as_str().expect("_id");

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/user/{user_id}"),
            Some(&admin),
            Some(json!({"suspended": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "POST", "/api/cart/get", Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Account suspended");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn admin_order_override_edits_payment_metadata(pool: sqlx::PgPool) {
        let app = test_app(pool.clone());
        let token = register_user(&app, "override@example.com").await;
        let admin = register_admin(&app, "override-admin@example.com").await;
        let product_id = seed_product(&pool, "override-tee", "25.00").await;
        let order_id = place_cod_order(&app, &token, product_id).await;

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/order/{order_id}"),
            Some(&admin),
            Some(json!({"payment": true, "amount": 80.0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "override failed: {body}");
        assert_eq!(body["order"]["payment"], true);
        assert_eq!(body["order"]["amount"], 80.0);
        assert_eq!(body["order"]["status"], "Order Placed", "override never touches status");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn analytics_overview_matches_fixture_exactly(pool: sqlx::PgPool) {
        let app = test_app(pool.clone());
        let token = register_user(&app, "buyer@example.com").await;
        let admin = register_admin(&app, "analytics-admin@example.com").await;
        let tee = seed_product(&pool, "analytics-tee", "25.00").await;
        let coat = seed_product(&pool, "analytics-coat", "200.00").await;

        // Two paid orders (75.00 and 250.00), one unpaid (75.00).
        let first = place_cod_order(&app, &token, tee).await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/order/place",
            Some(&token),
            Some(json!({
                "address": test_address(),
                "items": [{"itemId": coat.to_string(), "size": "M", "quantity": 1}],
                "method": "cod",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, orders) =
            send(&app, "POST", "/api/order/userorders", Some(&token), Some(json!({}))).await;
        let second = orders["orders"][0]["_id"].as_str().expect("_id").to_string();
        place_cod_order(&app, &token, tee).await;

        for id in [first.as_str(), second.as_str()] {
            let (status, _) = send(
                &app,
                "PUT",
                &format!("/api/order/{id}"),
                Some(&admin),
                Some(json!({"payment": true})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) =
            send(&app, "GET", "/api/analytics/overview", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["totalRevenue"], 325.0, "75 + 250, unpaid excluded");
        assert_eq!(data["currentMonthRevenue"], 325.0);
        assert_eq!(data["totalOrders"], 3, "counts orders regardless of payment");
        assert_eq!(data["totalCustomers"], 2, "shopper and admin");
        assert_eq!(data["newCustomersThisMonth"], 2);

        let top = data["topProducts"].as_array().expect("topProducts");
        assert_eq!(top.len(), 2);
        assert_eq!(top[0]["name"], "analytics-coat");
        assert_eq!(top[0]["revenue"], 200.0);
        assert_eq!(top[1]["name"], "analytics-tee");
        assert_eq!(top[1]["revenue"], 25.0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn inactive_product_cannot_be_carted(pool: sqlx::PgPool) {
        let app = test_app(pool.clone());
        let token = register_user(&app, "inactive@example.com").await;
        let admin = register_admin(&app, "inactive-admin@example.com").await;
        let product_id = seed_product(&pool, "inactive-tee", "25.00").await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/product/update-status",
            Some(&admin),
            Some(json!({"id": product_id.to_string(), "status": "inactive"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "POST",
            "/api/cart/add",
            Some(&token),
            Some(json!({"itemId": product_id.to_string(), "size": "M"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Product is unavailable");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn admin_product_lifecycle(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let admin = register_admin(&app, "catalog-admin@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/product/add",
            Some(&admin),
            Some(json!({
                "name": "Lifecycle Tee",
                "description": "A tee",
                "price": 19.5,
                "category": "Men",
                "subCategory": "Topwear",
                "sizes": ["M"],
                "image": ["https://cdn.example.com/lifecycle.jpg"],
                "stock": 10,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "add failed: {body}");

        let (status, body) = send(&app, "GET", "/api/product/list", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let product = &body["products"][0];
        assert_eq!(product["name"], "Lifecycle Tee");
        assert_eq!(product["price"], 19.5);
        let id = product["_id"].as_str().expect("_id").to_string();

        let (status, _) = send(
            &app,
            "POST",
            "/api/product/update-stock",
            Some(&admin),
            Some(json!({"productId": id, "stock": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "POST",
            "/api/product/single",
            None,
            Some(json!({"productId": id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["product"]["stock"], 3);

        let (status, _) = send(
            &app,
            "POST",
            "/api/product/remove",
            Some(&admin),
            Some(json!({"id": id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            "POST",
            "/api/product/single",
            None,
            Some(json!({"productId": id})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
