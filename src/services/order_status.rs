use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use tracing::info;

use crate::entities::order::{self, Status};
use crate::error::ApiError;

/// Order lifecycle: `pending -> processing -> shipped -> delivered`, plus
/// `pending -> cancelled`. Everything else, staying put included, is illegal.
pub fn is_legal(from: Status, to: Status) -> bool {
    matches!(
        (from, to),
        (Status::Pending, Status::Processing)
            | (Status::Processing, Status::Shipped)
            | (Status::Shipped, Status::Delivered)
            | (Status::Pending, Status::Cancelled)
    )
}

pub fn check_transition(from: Status, to: Status) -> Result<(), ApiError> {
    if is_legal(from, to) {
        Ok(())
    } else {
        Err(ApiError::InvalidStatusTransition { from, to })
    }
}

/// Privileged transition of any order. Role checks happen at the router.
pub async fn update_status(
    db: &DatabaseConnection,
    order_id: i32,
    next: Status,
) -> Result<order::Model, ApiError> {
    let order = order::Entity::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;

    transition(db, order, next).await
}

/// Self-service cancellation; only the owner may cancel, and only while pending.
pub async fn cancel_order(
    db: &DatabaseConnection,
    account_id: i32,
    order_id: i32,
) -> Result<order::Model, ApiError> {
    let order = order::Entity::find_by_id(order_id)
        .filter(order::Column::UserId.eq(account_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;

    transition(db, order, Status::Cancelled).await
}

async fn transition(
    db: &DatabaseConnection,
    order: order::Model,
    next: Status,
) -> Result<order::Model, ApiError> {
    let current = order.status;
    check_transition(current, next)?;

    let now = Utc::now();
    // Conditional on the status we validated against, so racing updates cannot skip a state.
    let result = order::Entity::update_many()
        .col_expr(order::Column::Status, Expr::value(next))
        .col_expr(order::Column::UpdatedAt, Expr::value(now))
        .filter(order::Column::Id.eq(order.id))
        .filter(order::Column::Status.eq(current))
        .exec(db)
        .await?;

    if result.rows_affected != 1 {
        let latest = order::Entity::find_by_id(order.id)
            .one(db)
            .await?
            .map(|o| o.status)
            .unwrap_or(current);
        return Err(ApiError::InvalidStatusTransition {
            from: latest,
            to: next,
        });
    }

    info!(order_id = order.id, from = %current, to = %next, "Order status changed");

    Ok(order::Model {
        status: next,
        updated_at: now,
        ..order
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Status; 5] = [
        Status::Pending,
        Status::Processing,
        Status::Shipped,
        Status::Delivered,
        Status::Cancelled,
    ];

    #[test]
    fn happy_path_moves_forward_one_step_at_a_time() {
        assert!(is_legal(Status::Pending, Status::Processing));
        assert!(is_legal(Status::Processing, Status::Shipped));
        assert!(is_legal(Status::Shipped, Status::Delivered));
        assert!(!is_legal(Status::Pending, Status::Delivered));
        assert!(!is_legal(Status::Pending, Status::Shipped));
    }

    #[test]
    fn cancellation_only_from_pending() {
        for from in ALL {
            assert_eq!(is_legal(from, Status::Cancelled), from == Status::Pending);
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for to in ALL {
            assert!(!is_legal(Status::Cancelled, to));
            assert!(!is_legal(Status::Delivered, to));
        }
    }

    #[test]
    fn no_backwards_or_self_transitions() {
        assert!(!is_legal(Status::Delivered, Status::Processing));
        assert!(!is_legal(Status::Shipped, Status::Pending));
        for status in ALL {
            assert!(!is_legal(status, status));
        }
    }

    #[test]
    fn illegal_transition_reports_both_ends() {
        let err = check_transition(Status::Shipped, Status::Cancelled).unwrap_err();
        assert!(matches!(
            err,
            ApiError::InvalidStatusTransition {
                from: Status::Shipped,
                to: Status::Cancelled
            }
        ));
    }
}
