use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::api::ApiJson;
use crate::entities::user::Entity as UserEntity;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::Principal;
use crate::services::accounts::{self, AccountChanges};

pub fn profile_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/user/profile", get(get_profile).put(update_profile))
        .route("/user/change-password", post(change_password))
        .layer(Extension(db))
}

async fn get_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Response> {
    let account = UserEntity::find_by_id(principal.account_id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile fetched successfully",
        "user": account,
    }))
    .into_response())
}

async fn update_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(principal): Extension<Principal>,
    ApiJson(payload): ApiJson<UpdateProfile>,
) -> ApiResult<Response> {
    payload.validate()?;

    let account = accounts::update_account(
        &db,
        principal.account_id,
        AccountChanges {
            name: Some(payload.name),
            ..Default::default()
        },
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "user": account,
    }))
    .into_response())
}

async fn change_password(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(principal): Extension<Principal>,
    ApiJson(payload): ApiJson<ChangePassword>,
) -> ApiResult<Response> {
    payload.validate()?;

    let account = UserEntity::find_by_id(principal.account_id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    account
        .check_hash(&payload.old_password)
        .map_err(|_| ApiError::Unauthenticated("Old password is incorrect".into()))?;

    accounts::update_account(
        &db,
        account.id,
        AccountChanges {
            password: Some(payload.new_password),
            ..Default::default()
        },
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password changed successfully",
    }))
    .into_response())
}

#[derive(Deserialize, Validate)]
struct UpdateProfile {
    #[validate(length(min = 2, max = 100))]
    name: String,
}

#[derive(Deserialize, Validate)]
struct ChangePassword {
    old_password: String,
    #[validate(length(min = 6))]
    new_password: String,
}
