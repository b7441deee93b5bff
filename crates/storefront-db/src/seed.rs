use rust_decimal::Decimal;
use sqlx::{types::Json, PgPool};

use crate::DbError;

struct DemoProduct {
    name: &'static str,
    description: &'static str,
    price: Decimal,
    category: &'static str,
    sub_category: &'static str,
    stock: i32,
    bestseller: bool,
    sizes: &'static [&'static str],
    image: &'static [&'static str],
}

const DEMO_PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        name: "Classic Crew Tee",
        description: "Midweight cotton tee with a ribbed crew neck.",
        price: Decimal::from_parts(2500, 0, 0, false, 2), // 25.00
        category: "Men",
        sub_category: "Topwear",
        stock: 120,
        bestseller: true,
        sizes: &["S", "M", "L", "XL"],
        image: &["https://cdn.example.com/demo/crew-tee.jpg"],
    },
    DemoProduct {
        name: "Relaxed Linen Shirt",
        description: "Breathable linen shirt for warm weather.",
        price: Decimal::from_parts(5450, 0, 0, false, 2), // 54.50
        category: "Women",
        sub_category: "Topwear",
        stock: 60,
        bestseller: false,
        sizes: &["S", "M", "L"],
        image: &["https://cdn.example.com/demo/linen-shirt.jpg"],
    },
    DemoProduct {
        name: "Everyday Chino",
        description: "Straight-fit chino in stretch twill.",
        price: Decimal::from_parts(6900, 0, 0, false, 2), // 69.00
        category: "Men",
        sub_category: "Bottomwear",
        stock: 80,
        bestseller: false,
        sizes: &["30", "32", "34", "36"],
        image: &["https://cdn.example.com/demo/chino.jpg"],
    },
];

/// Seed the demo catalog into the database, skipping products whose name
/// already exists so the call is idempotent.
///
/// Returns the number of products inserted. All inserts run inside a single
/// transaction; if any operation fails the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_demo_products(pool: &PgPool) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for product in DEMO_PRODUCTS {
        let sizes: Vec<String> = product.sizes.iter().map(|s| (*s).to_string()).collect();
        let image: Vec<String> = product.image.iter().map(|s| (*s).to_string()).collect();

        let inserted = sqlx::query(
            "INSERT INTO products \
                 (name, description, price, category, sub_category, stock, bestseller, sizes, image) \
             SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9 \
             WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = $1)",
        )
        .bind(product.name)
        .bind(product.description)
        .bind(product.price)
        .bind(product.category)
        .bind(product.sub_category)
        .bind(product.stock)
        .bind(product.bestseller)
        .bind(Json(&sizes))
        .bind(Json(&image))
        .execute(&mut *tx)
        .await?
        .rows_affected();

        count += usize::try_from(inserted).unwrap_or(0);
    }

    tx.commit().await?;
    Ok(count)
}
