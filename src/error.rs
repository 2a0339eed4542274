use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidVariant(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Order has no items")]
    EmptyOrder,

    #[error("Order value must be at least {min_order_value} to use this discount")]
    MinOrderValue { min_order_value: i64 },

    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    #[error("Discount code has reached its usage limit")]
    UsageExceeded,

    #[error("Discount name '{0}' already exists")]
    DuplicateName(String),

    #[error("Discount code '{0}' already exists")]
    DuplicateCode(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error: {0}")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{what} not found"))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_)
            | AppError::InvalidVariant(_)
            | AppError::EmptyCart
            | AppError::EmptyOrder
            | AppError::MinOrderValue { .. }
            | AppError::InvalidStatus(_)
            | AppError::UsageExceeded
            | AppError::DuplicateName(_)
            | AppError::DuplicateCode(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::OrmError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let message = self.to_string();
        let body = ApiResponse::error(
            message.clone(),
            ErrorData { error: message },
        );

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
