use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

/// Product as rendered for the storefront, with the stored comma-separated
/// feature list split into an array.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub image: Option<String>,
    pub category: String,
    pub rating: f64,
    pub reviews_count: i32,
    pub stock: i32,
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let features = product
            .features
            .as_deref()
            .map(|raw| raw.split(',').map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            image: product.image,
            category: product.category,
            rating: product.rating,
            reviews_count: product.reviews_count,
            stock: product.stock,
            features,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub products: Vec<ProductView>,
}
