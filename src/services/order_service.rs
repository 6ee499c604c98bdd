use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, UpdateMany,
};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems},
    entity::{
        CartItems, OrderItems, Orders, Stock,
        cart_items::Column as CartCol,
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Model as OrderModel},
        stock::Column as StockCol,
    },
    error::{AppError, AppResult},
    mailer::{self, deliver},
    middleware::auth::AuthUser,
    models::{DeliveryOption, Order, OrderItem, OrderStatus, PaymentMethod, TransactionType},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{
        cart_service::{cart_total, priced_lines},
        wallet_service::apply_to_balance,
    },
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if !query.include_completed.unwrap_or(false) {
        condition = condition.add(OrderCol::IsCompleted.eq(false));
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let email = payload.email.trim().to_string();
    if !email.contains('@') {
        return Err(AppError::bad_request("a valid email is required"));
    }
    let address = payload
        .address
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());
    if payload.delivery_option == DeliveryOption::Courier && address.is_none() {
        return Err(AppError::bad_request("courier delivery requires an address"));
    }

    let txn = state.orm.begin().await?;

    let lines = priced_lines(&txn, user.user_id, true).await?;
    if lines.is_empty() {
        return Err(AppError::bad_request("Cart is empty"));
    }
    let total_amount = cart_total(&lines)?;

    let order_id = Uuid::new_v4();
    let track_number = build_track_number(order_id);
    let now = Utc::now();

    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        email: Set(email),
        delivery_option: Set(payload.delivery_option.as_str().to_string()),
        payment_method: Set(payload.payment_method.as_str().to_string()),
        address: Set(address),
        total_amount: Set(total_amount),
        track_number: Set(track_number.clone()),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        is_completed: Set(false),
        return_request_id: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            item: Set(line.name.clone()),
            quantity: Set(line.quantity),
            price: Set(line.unit_price),
            component_kind: Set(line.component_kind.map(|k| k.as_str().to_string())),
            component_id: Set(line.component_id),
            build_id: Set(line.build_id),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        order_items.push(order_item_from_entity(item));

        if let Some(component_id) = line.component_id {
            decrement_stock(&txn, component_id, line.quantity).await?;
        }
    }

    if payload.payment_method == PaymentMethod::Balance {
        apply_to_balance(
            &txn,
            user.user_id,
            -total_amount,
            TransactionType::Purchase,
            format!("Order {track_number}"),
        )
        .await?;
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    let order = order_from_entity(order);
    deliver(state.mailer.as_ref(), mailer::order_placed(&order)).await;

    record_audit(
        state,
        user.user_id,
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "track_number": order.track_number }),
    )
    .await;

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithItems {
            order,
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

/// Take `quantity` units out of stock, never going below zero. Components
/// without a stock record are left alone.
async fn decrement_stock<C: ConnectionTrait>(
    conn: &C,
    component_id: Uuid,
    quantity: i32,
) -> AppResult<()> {
    let result = stock_decrement(component_id, quantity).exec(conn).await?;
    if result.rows_affected == 0 {
        tracing::debug!(%component_id, "no stock record, skipping decrement");
    }
    Ok(())
}

fn stock_decrement(component_id: Uuid, quantity: i32) -> UpdateMany<Stock> {
    Stock::update_many()
        .col_expr(
            StockCol::Quantity,
            Expr::cust_with_values("GREATEST(quantity - $1, 0)", [quantity]),
        )
        .col_expr(StockCol::UpdatedAt, Expr::current_timestamp().into())
        .filter(StockCol::ComponentId.eq(component_id))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

pub async fn track_order(
    state: &AppState,
    user: &AuthUser,
    track_number: &str,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::TrackNumber.eq(track_number.trim().to_uppercase())),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

pub(crate) async fn with_items<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderWithItems> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();
    Ok(OrderWithItems {
        order: order_from_entity(order),
        items,
    })
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        email: model.email,
        delivery_option: model.delivery_option,
        payment_method: model.payment_method,
        address: model.address,
        total_amount: model.total_amount,
        track_number: model.track_number,
        status: model.status,
        is_completed: model.is_completed,
        return_request_id: model.return_request_id,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        item: model.item,
        quantity: model.quantity,
        price: model.price,
        component_kind: model.component_kind,
        component_id: model.component_id,
        build_id: model.build_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

/// Eight upper-case hex characters taken from the order id.
fn build_track_number(order_id: Uuid) -> String {
    order_id.simple().to_string()[..8].to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn stock_decrement_is_floored_at_zero() {
        let sql = stock_decrement(Uuid::nil(), 15)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains("GREATEST(quantity - 15, 0)"), "{sql}");
        assert!(!sql.contains('?'), "{sql}");
        assert!(sql.contains(r#""updated_at" = CURRENT_TIMESTAMP"#), "{sql}");
    }

    #[test]
    fn track_numbers_are_eight_upper_hex_chars() {
        let track = build_track_number(Uuid::new_v4());
        assert_eq!(track.len(), 8);
        assert!(
            track
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        );
    }
}
