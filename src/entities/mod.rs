pub mod cart;
pub mod cart_item;
pub mod order;
pub mod order_item;
pub mod product;
pub mod shipping_address;
pub mod user;

use chrono::Utc;
use sea_orm::{
    sea_query::Index, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, Schema, Set, TransactionTrait,
};
use tracing::info;

use crate::config::AdminSeed;

/// Creates every table (parents first) and its indexes when missing.
pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    macro_rules! create {
        ($entity:expr) => {{
            let mut table = schema.create_table_from_entity($entity);
            table.if_not_exists();
            db.execute(backend.build(&table)).await?;
            for mut index in schema.create_index_from_entity($entity) {
                index.if_not_exists();
                db.execute(backend.build(&index)).await?;
            }
        }};
    }

    create!(user::Entity);
    create!(product::Entity);
    create!(cart::Entity);
    create!(cart_item::Entity);
    create!(order::Entity);
    create!(shipping_address::Entity);
    create!(order_item::Entity);

    let cart_line_unique = Index::create()
        .name("idx-cart_items-cart_id-product_id")
        .table(cart_item::Entity)
        .col(cart_item::Column::CartId)
        .col(cart_item::Column::ProductId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&cart_line_unique)).await?;

    Ok(())
}

/// Creates the configured admin account (and its cart) unless the email is taken.
pub async fn seed_admin(db: &DatabaseConnection, seed: &AdminSeed) -> Result<(), DbErr> {
    let exists = user::Entity::find()
        .filter(user::Column::Email.eq(seed.email.as_str()))
        .one(db)
        .await?
        .is_some();
    if exists {
        return Ok(());
    }

    let password_hash =
        user::hash_password(&seed.password).map_err(|err| DbErr::Custom(err.to_string()))?;

    let txn = db.begin().await?;
    let now = Utc::now();
    let admin = user::ActiveModel {
        name: Set("admin".to_owned()),
        email: Set(seed.email.clone()),
        password: Set(password_hash),
        role: Set(user::Role::Admin),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    cart::ActiveModel {
        user_id: Set(admin.id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(email = %seed.email, "Seeded admin account");
    Ok(())
}
