use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSortBy {
    PriceLow,
    PriceHigh,
    Rating,
}

impl ProductSortBy {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ProductSortBy::PriceLow => "price ASC",
            ProductSortBy::PriceHigh => "price DESC",
            ProductSortBy::Rating => "rating DESC",
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<ProductSortBy>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CourseQuery {
    pub category: Option<String>,
    pub level: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
}

impl OrderListQuery {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}
