use axum::{
    extract::{Extension, Path},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::api::ApiJson;
use crate::entities::{
    order::{self, Status},
    order_item,
};
use crate::error::{ApiError, ApiResult};
use crate::services::{order_query, order_status};

pub fn admin_order_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/orders", get(get_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/user/:user_id", get(get_user_orders))
        .route("/orders/:id/status", put(update_status))
        .route("/order-items", get(get_order_items))
        .route("/order-items/product/:product_id", get(get_product_order_items))
        .layer(Extension(db))
}

async fn get_orders(Extension(db): Extension<Arc<DatabaseConnection>>) -> ApiResult<Response> {
    let orders = order_query::find_orders(&db, Condition::all()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Orders fetched successfully",
        "orders": orders,
    }))
    .into_response())
}

async fn get_order(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult<Response> {
    let order = order_query::find_order(&db, Condition::all().add(order::Column::Id.eq(id)))
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;

    Ok(Json(json!({
        "success": true,
        "message": "Order fetched successfully",
        "order": order,
    }))
    .into_response())
}

async fn get_user_orders(
    Path(user_id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult<Response> {
    let orders =
        order_query::find_orders(&db, Condition::all().add(order::Column::UserId.eq(user_id)))
            .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Orders fetched successfully",
        "orders": orders,
    }))
    .into_response())
}

async fn update_status(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    ApiJson(payload): ApiJson<UpdateStatus>,
) -> ApiResult<Response> {
    let order = order_status::update_status(&db, id, payload.status).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Order status updated",
        "order": order,
    }))
    .into_response())
}

async fn get_order_items(Extension(db): Extension<Arc<DatabaseConnection>>) -> ApiResult<Response> {
    let items = order_query::find_order_items(&db, Condition::all()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Order items fetched successfully",
        "items": items,
    }))
    .into_response())
}

async fn get_product_order_items(
    Path(product_id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult<Response> {
    let items = order_query::find_order_items(
        &db,
        Condition::all().add(order_item::Column::ProductId.eq(product_id)),
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Order items fetched successfully",
        "items": items,
    }))
    .into_response())
}

#[derive(Deserialize)]
struct UpdateStatus {
    status: Status,
}
