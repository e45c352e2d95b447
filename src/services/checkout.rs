//! Order checkout.
//!
//! `Checkout::place_order` turns a validated request into an order inside a
//! single transaction: order row, shipping address, one stock reservation and
//! one priced line per item, then the final total. The transaction is either
//! committed as a whole or rolled back; a panic or a cancelled request drops
//! the open `DatabaseTransaction`, which rolls back as well.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info, warn};
use validator::Validate;

use crate::entities::{product, user};
use crate::error::ApiError;
use crate::services::{inventory, order_builder};

static CONTACT_NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").unwrap());

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct ShippingAddressInput {
    #[validate(length(min = 1, max = 255, message = "street is required"))]
    pub street: String,
    #[validate(length(min = 1, max = 100, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, max = 100, message = "state is required"))]
    pub state: String,
    #[validate(length(min = 1, max = 100, message = "country is required"))]
    pub country: String,
    #[validate(length(min = 1, max = 20, message = "zip_code is required"))]
    pub zip_code: String,
    pub notes: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, Validate)]
pub struct LineItem {
    pub product_id: i32,
    #[validate(range(min = 1, max = 10000, message = "quantity must be between 1 and 10000"))]
    pub quantity: i32,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct PlaceOrder {
    #[validate(nested)]
    pub shipping_address: ShippingAddressInput,
    #[validate(regex(path = *CONTACT_NUMBER_REGEX, message = "contact_number must be 10 digits"))]
    pub contact_number: String,
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<LineItem>,
}

impl PlaceOrder {
    fn check(&self) -> Result<(), ApiError> {
        self.validate()?;
        for item in &self.items {
            item.validate()?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct Checkout {
    db: Arc<DatabaseConnection>,
}

impl Checkout {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Checkout { db }
    }

    /// Places an order for `account_id` and returns the new order id.
    pub async fn place_order(&self, account_id: i32, request: PlaceOrder) -> Result<i32, ApiError> {
        request.check()?;
        self.check_references(account_id, &request).await?;

        let txn = self.db.begin().await?;

        match Self::write_order(&txn, account_id, &request).await {
            Ok((order_id, total)) => {
                txn.commit().await?;
                info!(
                    order_id,
                    account_id,
                    total = %total,
                    items = request.items.len(),
                    "Order placed"
                );
                Ok(order_id)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    error!(account_id, error = %rollback_err, "Failed to roll back checkout");
                }
                warn!(account_id, error = %err, "Checkout aborted");
                Err(err)
            }
        }
    }

    /// Caller and product lookups that can fail without opening a transaction.
    async fn check_references(&self, account_id: i32, request: &PlaceOrder) -> Result<(), ApiError> {
        let account = user::Entity::find_by_id(account_id).one(&*self.db).await?;
        if account.is_none() {
            return Err(ApiError::Unauthenticated("User not authenticated".into()));
        }

        let product_ids: BTreeSet<i32> = request.items.iter().map(|item| item.product_id).collect();
        let found = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids.iter().copied()))
            .count(&*self.db)
            .await?;

        if found != product_ids.len() as u64 {
            return Err(ApiError::NotFound("Product not found".into()));
        }

        Ok(())
    }

    async fn write_order(
        txn: &DatabaseTransaction,
        account_id: i32,
        request: &PlaceOrder,
    ) -> Result<(i32, Decimal), ApiError> {
        let order = order_builder::create_order(txn, account_id, &request.contact_number).await?;
        order_builder::attach_shipping_address(txn, order.id, &request.shipping_address).await?;

        let mut total = Decimal::ZERO;
        for item in &request.items {
            let unit_price = inventory::reserve_stock(txn, item.product_id, item.quantity).await?;
            let line = order_builder::append_item(
                txn,
                order.id,
                item.product_id,
                item.quantity,
                unit_price,
            )
            .await?;
            total = total
                .checked_add(line)
                .filter(|total| *total < order_builder::amount_limit())
                .ok_or_else(|| {
                    ApiError::Validation("Order total exceeds the allowed amount".into())
                })?;
        }

        let order = order_builder::set_total(txn, order, total).await?;
        Ok((order.id, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(contact_number: &str, items: Vec<LineItem>) -> PlaceOrder {
        PlaceOrder {
            shipping_address: ShippingAddressInput {
                street: "1 Main St".into(),
                city: "Springfield".into(),
                state: "IL".into(),
                country: "US".into(),
                zip_code: "62701".into(),
                notes: None,
            },
            contact_number: contact_number.into(),
            items,
        }
    }

    #[test]
    fn accepts_well_formed_request() {
        let req = request("0123456789", vec![LineItem { product_id: 1, quantity: 2 }]);
        assert!(req.check().is_ok());
    }

    #[test]
    fn rejects_short_or_non_numeric_contact_number() {
        let items = vec![LineItem { product_id: 1, quantity: 1 }];
        assert!(matches!(
            request("12345", items.clone()).check(),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            request("12345abcde", items).check(),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn rejects_empty_items_and_zero_quantity() {
        assert!(matches!(
            request("0123456789", vec![]).check(),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            request("0123456789", vec![LineItem { product_id: 1, quantity: 0 }]).check(),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn rejects_blank_address_field() {
        let mut req = request("0123456789", vec![LineItem { product_id: 1, quantity: 1 }]);
        req.shipping_address.city = String::new();
        assert!(matches!(req.check(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn rejects_quantity_above_line_limit() {
        let req = request(
            "0123456789",
            vec![LineItem { product_id: 1, quantity: 10_001 }],
        );
        assert!(matches!(req.check(), Err(ApiError::Validation(_))));

        let req = request(
            "0123456789",
            vec![LineItem { product_id: 1, quantity: 10_000 }],
        );
        assert!(req.check().is_ok());
    }
}
