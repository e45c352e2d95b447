use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, put},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::api::ApiJson;
use crate::error::ApiResult;
use crate::middleware::auth::Principal;
use crate::services::cart;

//ROUTERS
pub fn cart_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/cart", get(get_cart).post(add_product))
        .route("/cart/update-quantity/:id", put(update_entry))
        .route("/cart/:id", delete(remove_product))
        .layer(Extension(db))
}

//ROUTES
async fn get_cart(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Response> {
    let cart = cart::get_cart(&db, principal.account_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Cart fetched successfully!",
        "cart": cart,
    }))
    .into_response())
}

async fn add_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(principal): Extension<Principal>,
    ApiJson(payload): ApiJson<AddProduct>,
) -> ApiResult<Response> {
    let item = cart::add_item(
        &db,
        principal.account_id,
        payload.product_id,
        payload.quantity.unwrap_or(1),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Product added to cart",
            "item": item,
        })),
    )
        .into_response())
}

async fn update_entry(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(principal): Extension<Principal>,
    ApiJson(payload): ApiJson<UpdateQuantity>,
) -> ApiResult<Response> {
    let item = cart::update_quantity(&db, principal.account_id, id, payload.quantity).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Cart item updated",
        "item": item,
    }))
    .into_response())
}

async fn remove_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Response> {
    cart::remove_item(&db, principal.account_id, id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Item removed from cart",
    }))
    .into_response())
}

//structs
#[derive(Deserialize, Debug)]
struct AddProduct {
    product_id: i32,
    quantity: Option<i32>,
}

#[derive(Deserialize, Debug)]
struct UpdateQuantity {
    quantity: i32,
}
