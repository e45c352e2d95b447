use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::entities::{order, order_item, product, shipping_address};

#[derive(Debug, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: order::Model,
    pub shipping_address: Option<shipping_address::Model>,
    pub items: Vec<OrderItemDetails>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemDetails {
    #[serde(flatten)]
    pub item: order_item::Model,
    pub product: Option<product::Model>,
}

/// Orders matching `filter`, newest first, with address and lines attached.
pub async fn find_orders(
    db: &DatabaseConnection,
    filter: Condition,
) -> Result<Vec<OrderDetails>, DbErr> {
    let orders = order::Entity::find()
        .filter(filter)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await?;

    attach_details(db, orders).await
}

pub async fn find_order(
    db: &DatabaseConnection,
    filter: Condition,
) -> Result<Option<OrderDetails>, DbErr> {
    let Some(order) = order::Entity::find().filter(filter).one(db).await? else {
        return Ok(None);
    };

    Ok(attach_details(db, vec![order]).await?.pop())
}

pub async fn find_order_items(
    db: &DatabaseConnection,
    filter: Condition,
) -> Result<Vec<OrderItemDetails>, DbErr> {
    let items = order_item::Entity::find()
        .filter(filter)
        .find_also_related(product::Entity)
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?;

    Ok(items
        .into_iter()
        .map(|(item, product)| OrderItemDetails { item, product })
        .collect())
}

async fn attach_details(
    db: &DatabaseConnection,
    orders: Vec<order::Model>,
) -> Result<Vec<OrderDetails>, DbErr> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = orders.iter().map(|o| o.id).collect();

    let mut addresses: HashMap<i32, shipping_address::Model> = shipping_address::Entity::find()
        .filter(shipping_address::Column::OrderId.is_in(ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|address| (address.order_id, address))
        .collect();

    let mut items: HashMap<i32, Vec<OrderItemDetails>> = HashMap::new();
    for details in find_order_items(db, Condition::all().add(order_item::Column::OrderId.is_in(ids))).await? {
        items.entry(details.item.order_id).or_default().push(details);
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderDetails {
            shipping_address: addresses.remove(&order.id),
            items: items.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect())
}
