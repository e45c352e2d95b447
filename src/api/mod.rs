pub mod admin;
pub mod public;
pub mod user;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::auth::TokenKeys;
use admin::admin_api_router;
use public::public_api_router;
use user::user_api_router;

pub fn create_api_router(db: Arc<DatabaseConnection>, keys: Arc<TokenKeys>) -> Router {
    let v1 = Router::new()
        .merge(public_api_router(db.clone(), keys.clone()))
        .merge(user_api_router(db.clone(), keys.clone()))
        .nest("/admin", admin_api_router(db, keys));

    Router::new().nest("/api/v1", v1)
}

/// `Json` whose rejection is reported as a `validation_error`.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}
