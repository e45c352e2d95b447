//! Writes the rows that make up one order. Inputs are trusted: the checkout
//! orchestrator and the inventory ledger have already validated them. Only
//! money amounts are checked here, against the order columns' precision.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};

use crate::entities::{
    order::{self, Status},
    order_item, shipping_address,
};
use crate::error::ApiError;
use crate::services::checkout::ShippingAddressInput;

pub async fn create_order<C>(txn: &C, account_id: i32, contact_number: &str) -> Result<order::Model, DbErr>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    order::ActiveModel {
        user_id: Set(account_id),
        status: Set(Status::Pending),
        total_amount: Set(Decimal::ZERO),
        contact_number: Set(contact_number.to_owned()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await
}

pub async fn attach_shipping_address<C>(
    txn: &C,
    order_id: i32,
    address: &ShippingAddressInput,
) -> Result<shipping_address::Model, DbErr>
where
    C: ConnectionTrait,
{
    shipping_address::ActiveModel {
        order_id: Set(order_id),
        street: Set(address.street.clone()),
        city: Set(address.city.clone()),
        state: Set(address.state.clone()),
        country: Set(address.country.clone()),
        zip_code: Set(address.zip_code.clone()),
        notes: Set(address.notes.clone().filter(|notes| !notes.is_empty())),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(txn)
    .await
}

/// Exclusive upper bound of the `Decimal(12, 2)` money columns on orders.
pub fn amount_limit() -> Decimal {
    Decimal::new(10_000_000_000, 0)
}

/// Inserts one order line priced at `unit_price * quantity` and returns that line total.
pub async fn append_item<C>(
    txn: &C,
    order_id: i32,
    product_id: i32,
    quantity: i32,
    unit_price: Decimal,
) -> Result<Decimal, ApiError>
where
    C: ConnectionTrait,
{
    let line_total = line_total(unit_price, quantity).ok_or_else(|| {
        ApiError::Validation(format!(
            "Line total for product {product_id} exceeds the allowed amount"
        ))
    })?;

    order_item::ActiveModel {
        order_id: Set(order_id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        price: Set(line_total),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    Ok(line_total)
}

pub async fn set_total<C>(txn: &C, order: order::Model, total: Decimal) -> Result<order::Model, DbErr>
where
    C: ConnectionTrait,
{
    let mut order: order::ActiveModel = order.into();
    order.total_amount = Set(total);
    order.updated_at = Set(Utc::now());
    order.update(txn).await
}

fn line_total(unit_price: Decimal, quantity: i32) -> Option<Decimal> {
    unit_price
        .checked_mul(Decimal::from(quantity))
        .filter(|total| *total < amount_limit())
}
