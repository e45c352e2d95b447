pub mod api;
pub mod config;
pub mod entities;
pub mod error;
pub mod middleware;
pub mod services;

use axum::{
    http::{header, Method},
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::api::create_api_router;
use crate::config::Config;
use crate::middleware::{
    auth::TokenKeys, logging::logging_middleware, timeout::timeout_middleware,
};

/// Builds the full application router on top of an already migrated database.
pub fn app(db: Arc<DatabaseConnection>, config: &Config) -> Router {
    let keys = Arc::new(TokenKeys::new(&config.secret, config.token_ttl_hours));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION]);

    create_api_router(db, keys)
        .layer(from_fn_with_state(config.request_timeout, timeout_middleware))
        .layer(from_fn(logging_middleware))
        .layer(cors)
}
