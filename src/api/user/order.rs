use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection};
use serde_json::json;
use std::sync::Arc;

use crate::api::ApiJson;
use crate::entities::order;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::Principal;
use crate::services::checkout::{Checkout, PlaceOrder};
use crate::services::{order_query, order_status};

pub fn order_router(db: Arc<DatabaseConnection>) -> Router {
    let checkout = Arc::new(Checkout::new(db.clone()));

    Router::new()
        .route("/orders/checkout", post(place_order))
        .route("/orders", get(get_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/cancel", delete(cancel_order))
        .layer(Extension(checkout))
        .layer(Extension(db))
}

async fn place_order(
    Extension(checkout): Extension<Arc<Checkout>>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(principal): Extension<Principal>,
    ApiJson(payload): ApiJson<PlaceOrder>,
) -> ApiResult<Response> {
    let order_id = checkout.place_order(principal.account_id, payload).await?;

    let order = order_query::find_order(&db, Condition::all().add(order::Column::Id.eq(order_id)))
        .await?
        .ok_or_else(|| ApiError::Internal(format!("Order {order_id} vanished after commit")))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Order placed successfully",
            "order_id": order_id,
            "order": order,
        })),
    )
        .into_response())
}

async fn get_orders(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Response> {
    let orders = order_query::find_orders(
        &db,
        Condition::all().add(order::Column::UserId.eq(principal.account_id)),
    )
    .await?;

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
    Extension(principal): Extension<Principal>,
) -> ApiResult<Response> {
    let order = order_query::find_order(
        &db,
        Condition::all()
            .add(order::Column::Id.eq(id))
            .add(order::Column::UserId.eq(principal.account_id)),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;

    Ok(Json(json!({
        "success": true,
        "message": "Order fetched successfully",
        "order": order,
    }))
    .into_response())
}

async fn cancel_order(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Response> {
    let order = order_status::cancel_order(&db, principal.account_id, id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Order cancelled",
        "order": order,
    }))
    .into_response())
}
