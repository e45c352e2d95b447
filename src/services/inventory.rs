//! Stock reservation.
//!
//! The only place product stock is decremented. Runs inside the caller's
//! transaction and never commits on its own.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{sea_query::Expr, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::debug;

use crate::entities::product;
use crate::error::ApiError;

/// Validates and decrements stock for one line item, returning the unit price
/// read in the same transaction.
///
/// The decrement is a conditional update guarded by `stock >= quantity`, so a
/// concurrent checkout that drained the row in between is reported as
/// `InsufficientStock` instead of driving stock negative.
pub async fn reserve_stock<C>(txn: &C, product_id: i32, quantity: i32) -> Result<Decimal, ApiError>
where
    C: ConnectionTrait,
{
    let product = product::Entity::find_by_id(product_id)
        .one(txn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {product_id} not found")))?;

    if !product.is_available {
        return Err(ApiError::ProductUnavailable { product_id });
    }

    if product.stock < quantity {
        return Err(ApiError::InsufficientStock { product_id });
    }

    let result = product::Entity::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(quantity),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::IsAvailable.eq(true))
        .filter(product::Column::Stock.gte(quantity))
        .exec(txn)
        .await?;

    if result.rows_affected != 1 {
        return Err(ApiError::InsufficientStock { product_id });
    }

    debug!(product_id, quantity, remaining = product.stock - quantity, "Reserved stock");
    Ok(product.price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};

    fn product_row(stock: i32, is_available: bool) -> product::Model {
        let now = Utc::now();
        product::Model {
            id: 1,
            name: "Baranka".into(),
            description: "Fresh".into(),
            price: Decimal::new(1000, 2),
            category: "bakery".into(),
            image_url: String::new(),
            stock,
            is_available,
            created_at: now,
            updated_at: now,
        }
    }

    fn db_with(row: product::Model, rows_affected: u64) -> DatabaseConnection {
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected,
            }])
            .into_connection()
    }

    #[tokio::test]
    async fn reserves_and_returns_unit_price() {
        let db = db_with(product_row(5, true), 1);

        let price = reserve_stock(&db, 1, 4).await.unwrap();
        assert_eq!(price, Decimal::new(1000, 2));
    }

    #[tokio::test]
    async fn lost_race_on_decrement_is_insufficient_stock() {
        // The read still sees 5 units, but another checkout drained the row
        // before the guarded update ran.
        let db = db_with(product_row(5, true), 0);

        let err = reserve_stock(&db, 1, 4).await.unwrap_err();
        assert!(matches!(err, ApiError::InsufficientStock { product_id: 1 }));
    }

    #[tokio::test]
    async fn short_stock_is_rejected_before_any_update() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![product_row(3, true)]])
            .into_connection();

        let err = reserve_stock(&db, 1, 4).await.unwrap_err();
        assert!(matches!(err, ApiError::InsufficientStock { product_id: 1 }));
        assert_eq!(db.into_transaction_log().len(), 1);
    }

    #[tokio::test]
    async fn unavailable_product_is_rejected() {
        let db = db_with(product_row(5, false), 1);

        let err = reserve_stock(&db, 1, 1).await.unwrap_err();
        assert!(matches!(err, ApiError::ProductUnavailable { product_id: 1 }));
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<product::Model>::new()])
            .into_connection();

        let err = reserve_stock(&db, 42, 1).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
