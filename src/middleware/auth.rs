use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{cart_store::CartOwner, dto::auth::Claims, error::AppError};

/// Header carrying the opaque guest cart session token.
pub const CART_TOKEN_HEADER: &str = "x-cart-token";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

pub fn ensure_role(user: &AuthUser, role: &str) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden("Admin access required"));
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, "admin")
}

fn decode_bearer(parts: &axum::http::request::Parts) -> Result<Option<AuthUser>, AppError> {
    let auth_header = match parts.headers.get(header::AUTHORIZATION) {
        Some(value) => value,
        None => return Ok(None),
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Access token required"))?;

    let token = match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => token.trim(),
        _ => return Err(AppError::Unauthorized("Access token required")),
    };

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Forbidden("Invalid or expired token"))?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Forbidden("Invalid or expired token"))?;

    Ok(Some(AuthUser {
        user_id,
        role: decoded.claims.role.clone(),
    }))
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        decode_bearer(parts)?.ok_or(AppError::Unauthorized("Access token required"))
    }
}

/// Identity for endpoints that degrade gracefully for anonymous visitors.
///
/// A missing or unusable credential resolves to `None` instead of rejecting,
/// so catalog reads can fall back to the not-enrolled view.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuthUser(decode_bearer(parts).unwrap_or(None)))
    }
}

/// Resolves who a cart request belongs to.
///
/// A valid bearer credential wins; otherwise a guest session token is
/// accepted. A present-but-invalid bearer credential is rejected rather than
/// silently downgraded to a guest.
#[derive(Debug, Clone)]
pub struct CartIdentity(pub CartOwner);

impl<S> FromRequestParts<S> for CartIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = decode_bearer(parts)? {
            return Ok(CartIdentity(CartOwner::User(user.user_id)));
        }

        let token = parts
            .headers
            .get(CART_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|token| !token.is_empty());

        match token {
            Some(token) => Ok(CartIdentity(CartOwner::Guest(token.to_string()))),
            None => Err(AppError::Unauthorized("Access token required")),
        }
    }
}
