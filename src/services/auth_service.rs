use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{AuthResponse, Claims, LoginRequest, RegisterRequest, UserPublic},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub async fn register_user(
    state: &AppState,
    guest_token: Option<String>,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let RegisterRequest {
        name,
        email,
        password,
    } = payload;

    if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Name, email and password are required".to_string(),
        ));
    }
    if password.chars().count() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&state.pool)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict(
            "A user with this email already exists".to_string(),
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();

    let user: User = sqlx::query_as(
        "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(name.as_str())
    .bind(email.as_str())
    .bind(password_hash)
    .fetch_one(&state.pool)
    .await?;

    merge_guest_cart(state, guest_token, user.id).await;

    let token = issue_token(&user)?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "User created",
        AuthResponse {
            token,
            user: user.into(),
        },
        None,
    ))
}

pub async fn login_user(
    state: &AppState,
    guest_token: Option<String>,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let LoginRequest { email, password } = payload;

    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&state.pool)
        .await?;

    let user = match user {
        Some(user) => user,
        None => return Err(AppError::Unauthorized("Invalid email or password")),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthorized("Invalid email or password"));
    }

    merge_guest_cart(state, guest_token, user.id).await;

    let token = issue_token(&user)?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        AuthResponse {
            token,
            user: user.into(),
        },
        None,
    ))
}

pub async fn profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserPublic>> {
    let found: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?;

    match found {
        Some(found) => Ok(ApiResponse::success("OK", found.into(), None)),
        None => Err(AppError::NotFound("User")),
    }
}

/// Folds a guest cart into the freshly authenticated user's cart.
/// Failures must not block the login, so this never returns an error.
async fn merge_guest_cart(state: &AppState, guest_token: Option<String>, user_id: Uuid) {
    if let Some(token) = guest_token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        cart_service::merge_guest_into(&state.pool, &state.guest_carts, token, user_id).await;
    }
}

fn issue_token(user: &User) -> AppResult<String> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}
