use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::LockType;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    dto::orders::{OrderWithItems, StaffOrder, StaffOrderList, UpdateOrderStatusRequest},
    entity::{
        Orders, ReturnRequests, Users,
        orders::{ActiveModel as OrderActive, Column as OrderCol, Model as OrderModel},
        return_requests::Column as ReturnCol,
        users::Column as UserCol,
    },
    error::{AppError, AppResult},
    mailer::{self, deliver},
    middleware::auth::{AuthUser, ensure_staff},
    models::{DeliveryOption, Order, OrderStatus, ReturnStatus},
    response::{ApiResponse, Meta},
    routes::params::StaffOrderQuery,
    services::{
        contains_pattern,
        order_service::{order_from_entity, with_items},
        return_service::return_from_entity,
    },
    state::AppState,
};

pub async fn list_active_orders(
    state: &AppState,
    user: &AuthUser,
    query: StaffOrderQuery,
) -> AppResult<ApiResponse<StaffOrderList>> {
    ensure_staff(user)?;
    list_orders_by_completion(state, query, false, "Active orders").await
}

pub async fn list_order_history(
    state: &AppState,
    user: &AuthUser,
    query: StaffOrderQuery,
) -> AppResult<ApiResponse<StaffOrderList>> {
    ensure_staff(user)?;
    list_orders_by_completion(state, query, true, "Order history").await
}

async fn list_orders_by_completion(
    state: &AppState,
    query: StaffOrderQuery,
    completed: bool,
    message: &str,
) -> AppResult<ApiResponse<StaffOrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::IsCompleted.eq(completed));

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        condition = condition.add(order_search(search));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let user_ids: Vec<Uuid> = orders.iter().map(|o| o.user_id).collect();
    let usernames: HashMap<Uuid, String> = if user_ids.is_empty() {
        HashMap::new()
    } else {
        Users::find()
            .filter(UserCol::Id.is_in(user_ids))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect()
    };

    let return_ids: Vec<Uuid> = orders.iter().filter_map(|o| o.return_request_id).collect();
    let mut returns = if return_ids.is_empty() {
        HashMap::new()
    } else {
        ReturnRequests::find()
            .filter(ReturnCol::Id.is_in(return_ids))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|r| (r.id, return_from_entity(r)))
            .collect::<HashMap<_, _>>()
    };

    let items = orders
        .into_iter()
        .map(|order| StaffOrder {
            username: usernames.get(&order.user_id).cloned().unwrap_or_default(),
            return_request: order.return_request_id.and_then(|id| returns.remove(&id)),
            order: order_from_entity(order),
        })
        .collect();

    let pending_returns = ReturnRequests::find()
        .filter(ReturnCol::Status.eq(ReturnStatus::Pending.as_str()))
        .count(&state.orm)
        .await? as i64;

    Ok(ApiResponse::success(
        message,
        StaffOrderList {
            items,
            pending_returns,
        },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Track number, order email, or the customer's username or email.
fn order_search(search: &str) -> Condition {
    let pattern = contains_pattern(search);
    Condition::any()
        .add(Expr::col((Orders, OrderCol::TrackNumber)).ilike(pattern.clone()))
        .add(Expr::col((Orders, OrderCol::Email)).ilike(pattern.clone()))
        .add(Expr::cust_with_values(
            "EXISTS (SELECT 1 FROM users u WHERE u.id = orders.user_id AND (u.username ILIKE $1 OR u.email ILIKE $2))",
            [pattern.clone(), pattern],
        ))
}

pub async fn get_order_staff(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let data = with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("Order found", data, Some(Meta::empty())))
}

/// Statuses an order may be moved into, given its delivery option.
pub fn validate_status_for(order: &OrderModel, status: &str) -> AppResult<OrderStatus> {
    let delivery = DeliveryOption::parse(&order.delivery_option).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "order {} has unknown delivery option {}",
            order.id,
            order.delivery_option
        ))
    })?;
    OrderStatus::parse(status)
        .filter(|s| delivery.allowed_statuses().contains(s))
        .ok_or_else(|| {
            AppError::bad_request(format!(
                "status {status} is not allowed for {} orders",
                delivery.as_str()
            ))
        })
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_staff(user)?;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let status = validate_status_for(&existing, payload.status.trim())?;
    let changed = existing.status != status.as_str();

    let mut active: OrderActive = existing.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    if changed && status.notifies_customer() {
        let username = Users::find_by_id(order.user_id)
            .one(&state.orm)
            .await?
            .map(|u| u.username)
            .unwrap_or_default();
        let order = order_from_entity(order.clone());
        deliver(
            state.mailer.as_ref(),
            mailer::order_status_changed(&order, &username, status),
        )
        .await;
    }

    record_audit(
        state,
        user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub async fn complete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_staff(user)?;
    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: OrderActive = existing.into();
    active.is_completed = Set(true);
    active.status = Set(OrderStatus::Completed.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    record_audit(
        state,
        user.user_id,
        "order_complete",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order completed",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn search_binds_the_username_pattern() {
        let sql = Orders::find()
            .filter(order_search("buyer"))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(!sql.contains('?'), "{sql}");
        assert!(sql.contains("u.username ILIKE '%buyer%'"), "{sql}");
        assert!(sql.contains("u.email ILIKE '%buyer%'"), "{sql}");
    }

    fn order(delivery: &str) -> OrderModel {
        let now = Utc::now();
        OrderModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            email: "buyer@example.com".into(),
            delivery_option: delivery.into(),
            payment_method: "card".into(),
            address: None,
            total_amount: 0,
            track_number: "ABCDEF01".into(),
            status: "pending".into(),
            is_completed: false,
            return_request_id: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn pickup_orders_skip_courier_statuses() {
        let pickup = order("pickup");
        assert_eq!(
            validate_status_for(&pickup, "delivered").unwrap(),
            OrderStatus::Delivered
        );
        assert!(validate_status_for(&pickup, "delivering").is_err());
        assert!(validate_status_for(&pickup, "assembling").is_err());
    }

    #[test]
    fn courier_orders_cannot_be_marked_delivered() {
        let courier = order("courier");
        assert!(validate_status_for(&courier, "delivery_prep").is_ok());
        assert!(validate_status_for(&courier, "delivered").is_err());
        assert!(validate_status_for(&courier, "shipped").is_err());
    }
}
