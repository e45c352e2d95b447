use axum::{
    extract::{Extension, Path, Query},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::entities::product::{self, Entity as ProductEntity};
use crate::error::{ApiError, ApiResult};

pub fn product_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/products", get(get_products))
        .route("/products/:id", get(get_product))
        .layer(Extension(db))
}

async fn get_products(
    Query(params): Query<GetProductsQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult<Response> {
    let mut finder = ProductEntity::find();

    if params.only_available.unwrap_or(false) {
        finder = finder.filter(product::Column::IsAvailable.eq(true));
    }

    //Pagination zone
    let page: u64 = params.page.unwrap_or(1).max(1);
    let page_size: u64 = params.page_size.unwrap_or(20).clamp(1, 100);

    let products = finder
        .order_by_asc(product::Column::Id)
        .limit(page_size)
        .offset((page - 1) * page_size)
        .all(&*db)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Products fetched successfully!",
        "products": products,
    }))
    .into_response())
}

async fn get_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult<Response> {
    let product = ProductEntity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    Ok(Json(json!({
        "success": true,
        "message": "Product fetched successfully!",
        "product": product,
    }))
    .into_response())
}

#[derive(Deserialize)]
struct GetProductsQuery {
    only_available: Option<bool>,
    page: Option<u64>,
    page_size: Option<u64>,
}
