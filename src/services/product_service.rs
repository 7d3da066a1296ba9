use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::products::{ProductList, ProductView},
    error::{AppError, AppResult},
    models::Product,
    response::ApiResponse,
    routes::params::{ProductQuery, ProductSortBy},
};

pub async fn list_products(
    pool: &DbPool,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let order_by = query
        .sort_by
        .as_ref()
        .map(ProductSortBy::as_sql)
        .unwrap_or("name ASC");

    // Sort keys come from a closed enum, never from raw client input.
    let sql = format!(
        r#"
        SELECT * FROM products
        WHERE ($1::text IS NULL OR category = $1)
          AND ($2::text IS NULL
               OR name ILIKE '%' || $2 || '%'
               OR description ILIKE '%' || $2 || '%')
        ORDER BY {order_by}
        "#
    );

    let products: Vec<Product> = sqlx::query_as(&sql)
        .bind(query.category.as_deref())
        .bind(query.search.as_deref())
        .fetch_all(pool)
        .await?;

    Ok(ApiResponse::success(
        "OK",
        ProductList {
            products: products.into_iter().map(ProductView::from).collect(),
        },
        None,
    ))
}

pub async fn get_product(pool: &DbPool, product_id: Uuid) -> AppResult<ApiResponse<ProductView>> {
    let product: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(pool)
        .await?;

    match product {
        Some(product) => Ok(ApiResponse::success("OK", product.into(), None)),
        None => Err(AppError::NotFound("Product")),
    }
}
