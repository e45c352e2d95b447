use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::api::ApiJson;
use crate::entities::user::{self, Entity as UserEntity, Role};
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::{generate_token, TokenKeys};
use crate::services::accounts;

//ROUTERS
pub fn auth_router(db: Arc<DatabaseConnection>, keys: Arc<TokenKeys>) -> Router {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin))
        .layer(Extension(db))
        .layer(Extension(keys))
}

//ROUTES
async fn signup(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    ApiJson(payload): ApiJson<SignupPayload>,
) -> ApiResult<Response> {
    payload.validate()?;

    let account = accounts::register(
        &db,
        payload.name,
        payload.email.to_lowercase(),
        &payload.password,
        Role::User,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "user": {
                "id": account.id,
                "name": account.name,
                "email": account.email,
            }
        })),
    )
        .into_response())
}

async fn signin(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(keys): Extension<Arc<TokenKeys>>,
    ApiJson(payload): ApiJson<SigninPayload>,
) -> ApiResult<Response> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation("Please provide all fields!".into()));
    }

    let invalid = || ApiError::Unauthenticated("Invalid credentials!".into());

    let account = UserEntity::find()
        .filter(user::Column::Email.eq(payload.email.to_lowercase()))
        .one(&*db)
        .await?
        .ok_or_else(invalid)?;

    account.check_hash(&payload.password).map_err(|_| invalid())?;

    let token = generate_token(&keys, account.id, account.role)?;

    Ok(Json(json!({
        "success": true,
        "message": "Logged in successfully!",
        "token": token,
    }))
    .into_response())
}

//structs
#[derive(Deserialize, Validate)]
struct SignupPayload {
    #[validate(length(min = 2, max = 100))]
    name: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 6))]
    password: String,
}

#[derive(Deserialize)]
struct SigninPayload {
    email: String,
    password: String,
}
