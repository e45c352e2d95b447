use axum::{
    extract::{Extension, Path},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::api::ApiJson;
use crate::entities::user::{self, Entity as UserEntity, Role};
use crate::error::{ApiError, ApiResult};
use crate::services::accounts::{self, AccountChanges};

pub fn admin_user_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/users", get(get_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .layer(Extension(db))
}

async fn get_users(Extension(db): Extension<Arc<DatabaseConnection>>) -> ApiResult<Response> {
    let users = UserEntity::find()
        .order_by_asc(user::Column::Id)
        .all(&*db)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Users fetched successfully",
        "users": users,
    }))
    .into_response())
}

async fn get_user(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult<Response> {
    let user = UserEntity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(json!({
        "success": true,
        "message": "User fetched successfully",
        "user": user,
    }))
    .into_response())
}

async fn update_user(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    ApiJson(payload): ApiJson<UpdateUser>,
) -> ApiResult<Response> {
    payload.validate()?;

    let user = accounts::update_account(
        &db,
        id,
        AccountChanges {
            name: payload.name,
            email: payload.email.map(|email| email.to_lowercase()),
            password: payload.password,
            role: payload.role,
        },
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "User updated successfully",
        "user": user,
    }))
    .into_response())
}

async fn delete_user(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult<Response> {
    accounts::delete_account(&db, id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully",
    }))
    .into_response())
}

#[derive(Deserialize, Validate)]
struct UpdateUser {
    #[validate(length(min = 2, max = 100))]
    name: Option<String>,
    #[validate(email)]
    email: Option<String>,
    #[validate(length(min = 6))]
    password: Option<String>,
    role: Option<Role>,
}
