use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        AdminOrderList, CheckoutRequest, OrderList, OrderReceipt, OrderWithLines,
        UpdateOrderStatusRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(place_order).get(list_all_orders))
        .route("/my-orders", get(my_orders))
        .route("/{id}", get(get_order))
        .route("/{id}/status", patch(update_order_status))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order recorded", body = ApiResponse<OrderReceipt>),
        (status = 400, description = "Cart is empty")
    ),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderReceipt>>)> {
    let resp = order_service::place_order(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders/my-orders",
    responses(
        (status = 200, description = "Caller's orders, newest first", body = ApiResponse<OrderList>)
    ),
    tag = "Orders"
)]
pub async fn my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::my_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    responses(
        (status = 200, description = "Order with its lines", body = ApiResponse<OrderWithLines>),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithLines>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "All orders (admin)", body = ApiResponse<AdminOrderList>)
    ),
    tag = "Orders"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<AdminOrderList>>> {
    let resp = order_service::list_all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Invalid status"),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<crate::models::Order>>> {
    let resp = order_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
