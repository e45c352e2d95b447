use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{post, put},
    Json, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::api::ApiJson;
use crate::entities::{
    cart_item, order_item,
    product::{self, Entity as ProductEntity},
};
use crate::error::{ApiError, ApiResult};

//ROUTERS
pub fn admin_product_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", put(update_product).delete(delete_product))
        .layer(Extension(db))
}

/// Prices live in a `Decimal(10, 2)` column.
fn check_price(price: Decimal) -> Result<(), ApiError> {
    if price.is_sign_negative() {
        return Err(ApiError::Validation("price must not be negative".into()));
    }
    if price.normalize().scale() > 2 {
        return Err(ApiError::Validation("price must have at most 2 decimal places".into()));
    }
    if price >= Decimal::new(100_000_000, 0) {
        return Err(ApiError::Validation("price must be below 100000000".into()));
    }
    Ok(())
}

//ROUTES
async fn create_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    ApiJson(payload): ApiJson<CreateProduct>,
) -> ApiResult<Response> {
    payload.validate()?;
    check_price(payload.price)?;

    let now = Utc::now();
    let product = product::ActiveModel {
        name: Set(payload.name),
        description: Set(payload.description.unwrap_or_default()),
        price: Set(payload.price),
        category: Set(payload.category),
        image_url: Set(payload.image_url.unwrap_or_default()),
        stock: Set(payload.stock),
        is_available: Set(payload.is_available.unwrap_or(true)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    info!(product_id = product.id, stock = product.stock, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Product created successfully",
            "product": product,
        })),
    )
        .into_response())
}

async fn update_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    ApiJson(payload): ApiJson<UpdateProduct>,
) -> ApiResult<Response> {
    payload.validate()?;

    let existing = ProductEntity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    let mut product: product::ActiveModel = existing.into();

    if let Some(name) = payload.name {
        product.name = Set(name);
    }
    if let Some(description) = payload.description {
        product.description = Set(description);
    }
    if let Some(price) = payload.price {
        check_price(price)?;
        product.price = Set(price);
    }
    if let Some(category) = payload.category {
        product.category = Set(category);
    }
    if let Some(image_url) = payload.image_url {
        product.image_url = Set(image_url);
    }
    if let Some(stock) = payload.stock {
        product.stock = Set(stock);
    }
    if let Some(is_available) = payload.is_available {
        product.is_available = Set(is_available);
    }
    product.updated_at = Set(Utc::now());

    let product = product.update(&*db).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Product updated successfully",
        "product": product,
    }))
    .into_response())
}

/// Products with order history stay; their cart lines go with them otherwise.
async fn delete_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult<Response> {
    if ProductEntity::find_by_id(id).one(&*db).await?.is_none() {
        return Err(ApiError::NotFound("Product not found".into()));
    }

    let ordered = order_item::Entity::find()
        .filter(order_item::Column::ProductId.eq(id))
        .count(&*db)
        .await?;
    if ordered > 0 {
        return Err(ApiError::Conflict(
            "Product is referenced by existing orders and cannot be deleted".into(),
        ));
    }

    let txn = db.begin().await?;
    let result = async {
        cart_item::Entity::delete_many()
            .filter(cart_item::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        ProductEntity::delete_by_id(id).exec(&txn).await
    }
    .await;

    match result {
        Ok(_) => txn.commit().await?,
        Err(err) => {
            txn.rollback().await?;
            return Err(err.into());
        }
    }

    info!(product_id = id, "Product deleted");

    Ok(Json(json!({
        "success": true,
        "message": "Product deleted successfully",
    }))
    .into_response())
}

//structs
#[derive(Deserialize, Validate)]
struct CreateProduct {
    #[validate(length(min = 1, max = 255))]
    name: String,
    description: Option<String>,
    price: Decimal,
    #[validate(length(min = 1, max = 100))]
    category: String,
    image_url: Option<String>,
    #[validate(range(min = 0, message = "stock must not be negative"))]
    stock: i32,
    is_available: Option<bool>,
}

#[derive(Deserialize, Validate)]
struct UpdateProduct {
    #[validate(length(min = 1, max = 255))]
    name: Option<String>,
    description: Option<String>,
    price: Option<Decimal>,
    #[validate(length(min = 1, max = 100))]
    category: Option<String>,
    image_url: Option<String>,
    #[validate(range(min = 0, message = "stock must not be negative"))]
    stock: Option<i32>,
    is_available: Option<bool>,
}
