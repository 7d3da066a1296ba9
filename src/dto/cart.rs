use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::ItemKind;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub item_id: Uuid,
    pub item_type: String,
    pub quantity: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub item_id: Uuid,
    pub item_type: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartRequest {
    pub item_id: Uuid,
    pub item_type: String,
}

/// One priced cart line as rendered for the client.
///
/// `id` is the composite `"{type}_{itemId}"` key the storefront uses to
/// address lines locally.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub image: Option<String>,
    pub quantity: i32,
    #[serde(rename = "type")]
    pub item_type: ItemKind,
    pub item_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: i64,
    pub item_count: i32,
}
