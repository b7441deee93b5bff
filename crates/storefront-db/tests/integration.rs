//! Offline unit tests for storefront-db pool configuration and row types.
//! These tests do not require a live database connection.

use rust_decimal::Decimal;
use sqlx::types::Json;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use storefront_core::{AppConfig, CartData, Environment, WishlistData};
use storefront_db::{PoolConfig, ProductRow, UserRow};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 4000),
        log_level: "info".to_string(),
        jwt_secret: "secret".to_string(),
        token_ttl_days: 30,
        delivery_fee: Decimal::from(50),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`UserRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn user_row_has_expected_fields() {
    use chrono::Utc;

    let row = UserRow {
        id: 1_i64,
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        password_hash: "$2b$10$hash".to_string(),
        address: String::new(),
        phone: String::new(),
        role: "user".to_string(),
        suspended: false,
        cart_data: Json(CartData::new()),
        wishlist_data: Json(WishlistData::new()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.id, 1);
    assert_eq!(row.role, "user");
    assert!(!row.suspended);
    assert!(row.cart_data.0.is_empty());
    assert!(row.wishlist_data.0.is_empty());
}

/// Compile-time smoke test: confirm that [`ProductRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn product_row_has_expected_fields() {
    use chrono::Utc;

    let row = ProductRow {
        id: 42_i64,
        name: "Classic Crew Tee".to_string(),
        description: "Midweight cotton tee".to_string(),
        price: Decimal::new(2500, 2),
        category: "Men".to_string(),
        sub_category: "Topwear".to_string(),
        stock: 120,
        bestseller: true,
        sizes: Json(vec!["S".to_string(), "M".to_string()]),
        image: Json(vec!["https://cdn.example.com/tee.jpg".to_string()]),
        status: "active".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.id, 42);
    assert_eq!(row.price, Decimal::new(2500, 2));
    assert_eq!(row.stock, 120);
    assert_eq!(row.sizes.0.len(), 2);
    assert_eq!(row.status, "active");
}
