use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Duration;

use crate::error::ApiError;

/// Cuts a request off after `limit`. Dropping the handler future also drops any
/// open `DatabaseTransaction`, which rolls it back.
pub async fn timeout_middleware(
    State(limit): State<Duration>,
    req: Request,
    next: Next,
) -> Response {
    match tokio::time::timeout(limit, next.run(req)).await {
        Ok(response) => response,
        Err(_) => ApiError::Timeout.into_response(),
    }
}
