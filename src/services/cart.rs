use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::debug;

use crate::entities::{cart, cart_item, product};
use crate::error::ApiError;

/// Upper bound for the quantity held on one cart line.
pub const MAX_LINE_QUANTITY: i32 = 10_000;

fn check_quantity(quantity: i32) -> Result<(), ApiError> {
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(ApiError::Validation(format!(
            "Quantity should be between 1 and {MAX_LINE_QUANTITY}"
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct CartView {
    #[serde(flatten)]
    pub cart: cart::Model,
    pub items: Vec<CartLine>,
}

#[derive(Debug, Serialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: cart_item::Model,
    pub product: Option<product::Model>,
}

async fn cart_of<C: ConnectionTrait>(db: &C, account_id: i32) -> Result<cart::Model, ApiError> {
    cart::Entity::find()
        .filter(cart::Column::UserId.eq(account_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Cart not found".into()))
}

pub async fn get_cart(db: &DatabaseConnection, account_id: i32) -> Result<CartView, ApiError> {
    let cart = cart_of(db, account_id).await?;

    let items = cart_item::Entity::find()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .find_also_related(product::Entity)
        .order_by_asc(cart_item::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|(item, product)| CartLine { item, product })
        .collect();

    Ok(CartView { cart, items })
}

/// Adds `quantity` of a product; an existing line for the same product grows
/// instead of a second line being created.
pub async fn add_item(
    db: &DatabaseConnection,
    account_id: i32,
    product_id: i32,
    quantity: i32,
) -> Result<cart_item::Model, ApiError> {
    check_quantity(quantity)?;

    let cart = cart_of(db, account_id).await?;
    if product::Entity::find_by_id(product_id).one(db).await?.is_none() {
        return Err(ApiError::NotFound(format!("No product with {product_id} id was found")));
    }

    let txn = db.begin().await?;
    let existing = cart_item::Entity::find()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .filter(cart_item::Column::ProductId.eq(product_id))
        .one(&txn)
        .await?;

    let item = match existing {
        Some(entry) => {
            let merged = match entry.quantity.checked_add(quantity) {
                Some(merged) if merged <= MAX_LINE_QUANTITY => merged,
                _ => {
                    txn.rollback().await?;
                    return Err(ApiError::Validation(format!(
                        "A cart line holds at most {MAX_LINE_QUANTITY} units"
                    )));
                }
            };

            let result = cart_item::Entity::update_many()
                .col_expr(
                    cart_item::Column::Quantity,
                    Expr::col(cart_item::Column::Quantity).add(quantity),
                )
                .filter(cart_item::Column::Id.eq(entry.id))
                .filter(cart_item::Column::Quantity.eq(entry.quantity))
                .exec(&txn)
                .await?;
            if result.rows_affected != 1 {
                txn.rollback().await?;
                return Err(ApiError::Conflict(
                    "Cart line was modified concurrently, retry".into(),
                ));
            }
            cart_item::Model {
                quantity: merged,
                ..entry
            }
        }
        None => cart_item::ActiveModel {
            cart_id: Set(cart.id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|err| ApiError::from_write(err, "Cart line was modified concurrently, retry"))?,
    };

    txn.commit().await?;
    debug!(account_id, product_id, quantity = item.quantity, "Cart line updated");
    Ok(item)
}

/// Loads a cart line and checks it belongs to `account_id`.
async fn owned_item<C: ConnectionTrait>(
    db: &C,
    account_id: i32,
    item_id: i32,
) -> Result<cart_item::Model, ApiError> {
    let item = cart_item::Entity::find_by_id(item_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Cart item not found".into()))?;

    let cart = cart_of(db, account_id).await?;
    if cart.id != item.cart_id {
        return Err(ApiError::Forbidden("Unauthorized access to cart item".into()));
    }

    Ok(item)
}

pub async fn update_quantity(
    db: &DatabaseConnection,
    account_id: i32,
    item_id: i32,
    quantity: i32,
) -> Result<cart_item::Model, ApiError> {
    check_quantity(quantity)?;

    let item = owned_item(db, account_id, item_id).await?;
    let mut item: cart_item::ActiveModel = item.into();
    item.quantity = Set(quantity);
    Ok(item.update(db).await?)
}

pub async fn remove_item(db: &DatabaseConnection, account_id: i32, item_id: i32) -> Result<(), ApiError> {
    let item = owned_item(db, account_id, item_id).await?;
    cart_item::Entity::delete_by_id(item.id).exec(db).await?;
    Ok(())
}
