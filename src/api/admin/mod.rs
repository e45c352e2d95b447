pub mod order;
pub mod product;
pub mod user;

use axum::{middleware::from_fn_with_state, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use order::admin_order_router;
use product::admin_product_router;
use user::admin_user_router;

use crate::entities::user::Role;
use crate::middleware::auth::{auth_middleware, AuthState, TokenKeys};

pub fn admin_api_router(db: Arc<DatabaseConnection>, keys: Arc<TokenKeys>) -> Router {
    Router::new()
        .merge(admin_product_router(db.clone()))
        .merge(admin_user_router(db.clone()))
        .merge(admin_order_router(db.clone()))
        .layer(from_fn_with_state(
            AuthState {
                db,
                keys,
                role: Role::Admin,
            },
            auth_middleware,
        ))
}
