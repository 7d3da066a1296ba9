use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderLine};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub payment_method: Option<String>,
    pub shipping_address: Option<String>,
}

/// What the customer gets back once the order row exists.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub order_id: Uuid,
    pub total_amount: i64,
}

/// Order row joined with a comma-separated list of its line names.
#[derive(Debug, Serialize, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: i64,
    pub status: String,
    pub payment_method: Option<String>,
    pub shipping_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items_summary: Option<String>,
}

/// Admin listing row, which also names the customer.
#[derive(Debug, Serialize, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub total_amount: i64,
    pub status: String,
    pub payment_method: Option<String>,
    pub shipping_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items_summary: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub orders: Vec<OrderSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminOrderList {
    pub orders: Vec<AdminOrderSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithLines {
    pub order: Order,
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}
