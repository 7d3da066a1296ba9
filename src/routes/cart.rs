use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post, put},
};

use crate::{
    cart_store::AnyCart,
    dto::cart::{AddToCartRequest, CartView, RemoveFromCartRequest, UpdateCartRequest},
    error::AppResult,
    middleware::auth::CartIdentity,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(view_cart))
        .route("/add", post(add_to_cart))
        .route("/update", put(update_cart_item))
        .route("/remove", delete(remove_from_cart))
        .route("/clear", delete(clear_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Current cart with priced lines", body = ApiResponse<CartView>)
    ),
    tag = "Cart"
)]
pub async fn view_cart(
    State(state): State<AppState>,
    CartIdentity(owner): CartIdentity,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let cart = AnyCart::for_owner(&state.pool, &state.guest_carts, owner);
    let resp = cart_service::view_cart(&state.pool, &cart).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/add",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Item added"),
        (status = 404, description = "Catalog item not found")
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    CartIdentity(owner): CartIdentity,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let cart = AnyCart::for_owner(&state.pool, &state.guest_carts, owner.clone());
    let resp = cart_service::add_to_cart(&state.pool, &cart, &owner, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/cart/update",
    request_body = UpdateCartRequest,
    responses(
        (status = 200, description = "Quantity updated or line removed"),
        (status = 404, description = "Line not in cart")
    ),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    CartIdentity(owner): CartIdentity,
    Json(payload): Json<UpdateCartRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let cart = AnyCart::for_owner(&state.pool, &state.guest_carts, owner.clone());
    let resp = cart_service::update_cart_item(&state.pool, &cart, &owner, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/remove",
    request_body = RemoveFromCartRequest,
    responses(
        (status = 200, description = "Line removed"),
        (status = 404, description = "Line not in cart")
    ),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    CartIdentity(owner): CartIdentity,
    Json(payload): Json<RemoveFromCartRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let cart = AnyCart::for_owner(&state.pool, &state.guest_carts, owner.clone());
    let resp = cart_service::remove_from_cart(&state.pool, &cart, &owner, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(delete, path = "/api/cart/clear", tag = "Cart")]
pub async fn clear_cart(
    State(state): State<AppState>,
    CartIdentity(owner): CartIdentity,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let cart = AnyCart::for_owner(&state.pool, &state.guest_carts, owner);
    let resp = cart_service::clear_cart(&cart).await?;
    Ok(Json(resp))
}
