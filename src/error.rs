//! Error type shared by every handler and service.
//!
//! Each variant maps to one error kind of the public taxonomy. Responses carry
//! `{"success": false, "message", "kind"}`; internal details never reach the
//! client and are handed to the logging middleware through a response
//! extension instead.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use thiserror::Error;

use crate::entities::order::Status;
use crate::middleware::logging::ErrorDetail;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock { product_id: i32 },
    #[error("Product {product_id} is not available")]
    ProductUnavailable { product_id: i32 },
    #[error("{0}")]
    Forbidden(String),
    #[error("Cannot move order from {from} to {to}")]
    InvalidStatusTransition { from: Status, to: Status },
    #[error("Request timed out")]
    Timeout,
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::ProductUnavailable { .. } => "product_unavailable",
            Self::Forbidden(_) => "forbidden",
            Self::InvalidStatusTransition { .. } => "invalid_status_transition",
            Self::Timeout => "timeout",
            Self::Db(_) | Self::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_)
            | Self::InsufficientStock { .. }
            | Self::ProductUnavailable { .. }
            | Self::InvalidStatusTransition { .. } => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Db(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, Self::Db(_) | Self::Internal(_))
    }

    /// Maps a unique-constraint violation to `Conflict`, everything else to `Db`.
    pub fn from_write(err: DbErr, conflict_message: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                Self::Conflict(conflict_message.to_owned())
            }
            _ => Self::Db(err),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = if self.is_internal() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut response = (
            self.status(),
            Json(json!({
                "success": false,
                "message": message,
                "kind": self.kind(),
            })),
        )
            .into_response();

        response.extensions_mut().insert(ErrorDetail {
            kind: self.kind(),
            detail: self.to_string(),
        });

        response
    }
}
