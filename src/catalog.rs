//! Read and counter access to the two purchasable catalogs.
//!
//! Courses and products live in separate tables but share a single
//! cart/order pipeline, so everything here is keyed by `(ItemKind, id)`.

use sqlx::FromRow;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult, models::ItemKind};

/// Snapshot of a catalog row at the moment a cart line is priced.
#[derive(Debug, Clone)]
pub struct CatalogItem {
    pub name: String,
    pub price: i64,
    pub image: Option<String>,
    /// `None` for courses, which have no inventory.
    pub stock: Option<i32>,
}

#[derive(FromRow)]
struct CourseRow {
    title: String,
    price: i64,
    image: Option<String>,
}

#[derive(FromRow)]
struct ProductRow {
    name: String,
    price: i64,
    image: Option<String>,
    stock: i32,
}

/// Looks up the current name/price/stock for a cart line.
///
/// Returns `Ok(None)` when the referenced row no longer exists; callers
/// decide whether that is a 404 (adding to cart) or a skip (pricing a
/// cart that outlived its item).
pub async fn resolve(pool: &DbPool, kind: ItemKind, id: Uuid) -> AppResult<Option<CatalogItem>> {
    let item = match kind {
        ItemKind::Course => {
            sqlx::query_as::<_, CourseRow>("SELECT title, price, image FROM courses WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?
                .map(|row| CatalogItem {
                    name: row.title,
                    price: row.price,
                    image: row.image,
                    stock: None,
                })
        }
        ItemKind::Product => {
            sqlx::query_as::<_, ProductRow>(
                "SELECT name, price, image, stock FROM products WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(|row| CatalogItem {
                name: row.name,
                price: row.price,
                image: row.image,
                stock: Some(row.stock),
            })
        }
    };
    Ok(item)
}

/// Stock level after an unconditional decrement.
#[derive(Debug, Clone, Copy)]
pub struct StockLevel {
    pub remaining: i32,
}

impl StockLevel {
    pub fn oversold(&self) -> bool {
        self.remaining < 0
    }
}

/// Subtracts `quantity` from a product's stock without a floor check.
///
/// Stock is allowed to go negative; a negative result is surfaced so the
/// caller can log it. Returns `Ok(None)` when the product is gone.
pub async fn decrement_stock(
    pool: &DbPool,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<Option<StockLevel>> {
    let row: Option<(i32,)> = sqlx::query_as(
        "UPDATE products SET stock = stock - $2, updated_at = NOW() WHERE id = $1 RETURNING stock",
    )
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(remaining,)| StockLevel { remaining }))
}

/// Bumps a course's enrolled-student counter, returning the new count.
pub async fn increment_students_count(
    pool: &DbPool,
    course_id: Uuid,
) -> AppResult<Option<i32>> {
    let row: Option<(i32,)> = sqlx::query_as(
        "UPDATE courses SET students_count = students_count + 1 WHERE id = $1 RETURNING students_count",
    )
    .bind(course_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(count,)| count))
}
