use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};

use crate::{
    dto::auth::{AuthResponse, LoginRequest, RegisterRequest, UserPublic},
    error::AppResult,
    middleware::auth::{AuthUser, CART_TOKEN_HEADER},
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile))
}

/// Guest cart token, if the client sent one alongside its credentials.
fn cart_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CART_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<AuthResponse>),
        (status = 409, description = "Email already in use")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
    let resp = auth_service::register_user(&state, cart_token(&headers), payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let resp = auth_service::login_user(&state, cart_token(&headers), payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserPublic>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserPublic>>> {
    let resp = auth_service::profile(&state, &user).await?;
    Ok(Json(resp))
}
