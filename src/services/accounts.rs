use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use tracing::info;

use crate::entities::{
    cart, cart_item, order,
    user::{self, hash_password, Role},
};
use crate::error::ApiError;

pub fn hash(password: &str) -> Result<String, ApiError> {
    hash_password(password).map_err(|err| ApiError::Internal(format!("Failed to hash password: {err}")))
}

async fn ensure_email_free(db: &DatabaseConnection, email: &str) -> Result<(), ApiError> {
    let taken = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .count(db)
        .await?;
    if taken > 0 {
        return Err(ApiError::Conflict("User with given email already exists!".into()));
    }
    Ok(())
}

/// Creates an account together with its cart.
pub async fn register(
    db: &DatabaseConnection,
    name: String,
    email: String,
    password: &str,
    role: Role,
) -> Result<user::Model, ApiError> {
    ensure_email_free(db, &email).await?;
    let password = hash(password)?;

    let now = Utc::now();
    let txn = db.begin().await?;

    let account = match (user::ActiveModel {
        name: Set(name),
        email: Set(email),
        password: Set(password),
        role: Set(role),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    })
    .insert(&txn)
    .await
    {
        Ok(account) => account,
        Err(err) => {
            txn.rollback().await?;
            return Err(ApiError::from_write(err, "User with given email already exists!"));
        }
    };

    let created = cart::ActiveModel {
        user_id: Set(account.id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await;
    if let Err(err) = created {
        txn.rollback().await?;
        return Err(err.into());
    }

    txn.commit().await?;
    info!(account_id = account.id, role = %account.role, "Account registered");
    Ok(account)
}

#[derive(Debug, Default)]
pub struct AccountChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

pub async fn update_account(
    db: &DatabaseConnection,
    account_id: i32,
    changes: AccountChanges,
) -> Result<user::Model, ApiError> {
    let existing = user::Entity::find_by_id(account_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let mut account: user::ActiveModel = existing.clone().into();

    if let Some(email) = changes.email.filter(|e| !e.is_empty() && *e != existing.email) {
        ensure_email_free(db, &email).await?;
        account.email = Set(email);
    }
    if let Some(name) = changes.name.filter(|n| !n.is_empty()) {
        account.name = Set(name);
    }
    if let Some(password) = changes.password.filter(|p| !p.is_empty()) {
        account.password = Set(hash(&password)?);
    }
    if let Some(role) = changes.role {
        account.role = Set(role);
    }
    account.updated_at = Set(Utc::now());

    account
        .update(db)
        .await
        .map_err(|err| ApiError::from_write(err, "Email already exists!"))
}

/// Deletes an account and its cart. Accounts with order history are kept.
pub async fn delete_account(db: &DatabaseConnection, account_id: i32) -> Result<(), ApiError> {
    if user::Entity::find_by_id(account_id).one(db).await?.is_none() {
        return Err(ApiError::NotFound("User not found".into()));
    }

    let orders = order::Entity::find()
        .filter(order::Column::UserId.eq(account_id))
        .count(db)
        .await?;
    if orders > 0 {
        return Err(ApiError::Conflict("User has order history and cannot be deleted".into()));
    }

    let txn = db.begin().await?;
    let result = async {
        if let Some(cart) = cart::Entity::find()
            .filter(cart::Column::UserId.eq(account_id))
            .one(&txn)
            .await?
        {
            cart_item::Entity::delete_many()
                .filter(cart_item::Column::CartId.eq(cart.id))
                .exec(&txn)
                .await?;
            cart::Entity::delete_by_id(cart.id).exec(&txn).await?;
        }
        user::Entity::delete_by_id(account_id).exec(&txn).await
    }
    .await;

    match result {
        Ok(_) => {
            txn.commit().await?;
            info!(account_id, "Account deleted");
            Ok(())
        }
        Err(err) => {
            txn.rollback().await?;
            Err(err.into())
        }
    }
}
