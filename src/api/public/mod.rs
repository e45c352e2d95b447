pub mod auth;
pub mod product;

use axum::{routing::get, Json, Router};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;

use crate::middleware::auth::TokenKeys;
use auth::auth_router;
use product::product_router;

pub fn public_api_router(db: Arc<DatabaseConnection>, keys: Arc<TokenKeys>) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({ "success": true })) }))
        .merge(auth_router(db.clone(), keys))
        .merge(product_router(db))
}
