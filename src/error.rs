use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("{0}")]
    Conflict(String),

    #[error("Already enrolled in this course")]
    AlreadyEnrolled,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("You must be enrolled in this course")]
    NotEnrolled,

    #[error("Database error")]
    Db(#[from] sqlx::Error),

    #[error("ORM error")]
    Orm(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::EmptyCart => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) | AppError::AlreadyEnrolled => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::NotEnrolled => StatusCode::FORBIDDEN,
            AppError::Db(_) | AppError::Orm(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage failures surface as a generic 500; the cause stays server-side.
        let message = match &self {
            AppError::Db(err) => {
                tracing::error!(error = %err, "database error");
                "Internal Server Error".to_string()
            }
            AppError::Orm(err) => {
                tracing::error!(error = %err, "orm error");
                "Internal Server Error".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData { error: message }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
