use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{error, info, warn};

/// Attached to error responses so the request log carries the internal cause.
#[derive(Clone, Debug)]
pub struct ErrorDetail {
    pub kind: &'static str,
    pub detail: String,
}

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed = start.elapsed();

    match response.extensions().get::<ErrorDetail>() {
        Some(err) if status.is_server_error() => error!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            kind = err.kind,
            detail = %err.detail,
            "Failed to process request"
        ),
        Some(err) => warn!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            kind = err.kind,
            detail = %err.detail,
            "Rejected request"
        ),
        None if status.is_server_error() || status.is_client_error() => warn!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            "Request failed outside a handler"
        ),
        None => info!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            "Processed request"
        ),
    }

    response
}
