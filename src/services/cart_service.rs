use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    dto::cart::{AddToCartRequest, CartLine, CartList},
    entity::{
        Builds, CartItems, Components,
        builds::{Column as BuildCol, Model as BuildModel},
        cart_items::{ActiveModel as CartActive, Column as CartCol, Model as CartModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Build, CartItem},
    response::{ApiResponse, Meta},
    services::{build_service::build_from_entity, catalog_service::load_components},
    state::AppState,
};

/// Price every cart line of a user. With `lock` the cart rows are locked for
/// the surrounding transaction.
pub(crate) async fn priced_lines<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    lock: bool,
) -> AppResult<Vec<CartLine>> {
    let mut finder = CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .order_by_asc(CartCol::CreatedAt);
    if lock {
        finder = finder.lock(LockType::Update);
    }
    let items = finder.all(conn).await?;

    let component_ids: Vec<Uuid> = items.iter().filter_map(|i| i.component_id).collect();
    let build_ids: Vec<Uuid> = items.iter().filter_map(|i| i.build_id).collect();
    let components = load_components(conn, &component_ids).await?;
    let builds: HashMap<Uuid, Build> = if build_ids.is_empty() {
        HashMap::new()
    } else {
        Builds::find()
            .filter(BuildCol::Id.is_in(build_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|b: BuildModel| (b.id, build_from_entity(b)))
            .collect()
    };

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let priced = match (item.component_id, item.build_id) {
            (Some(id), _) => components
                .get(&id)
                .map(|c| (c.display_name(), c.price, Some(c.kind))),
            (None, Some(id)) => builds
                .get(&id)
                .map(|b| (b.display_name(), b.total_price, None)),
            (None, None) => None,
        };
        let Some((name, unit_price, component_kind)) = priced else {
            tracing::warn!(cart_item_id = %item.id, "cart item references a missing item");
            continue;
        };
        let line_total = unit_price
            .checked_mul(i64::from(item.quantity))
            .ok_or_else(|| AppError::bad_request(format!("cart line {} is too large", item.id)))?;
        lines.push(CartLine {
            id: item.id,
            component_id: item.component_id,
            build_id: item.build_id,
            component_kind,
            name,
            quantity: item.quantity,
            unit_price,
            line_total,
        });
    }
    Ok(lines)
}

/// Sum of the line totals, rejecting carts whose total does not fit.
pub(crate) fn cart_total(lines: &[CartLine]) -> AppResult<i64> {
    lines
        .iter()
        .try_fold(0i64, |total, line| total.checked_add(line.line_total))
        .ok_or_else(|| AppError::bad_request("cart total is too large"))
}

/// Quantity of a cart line after adding `extra` more units.
fn merged_quantity(current: i32, extra: i32) -> AppResult<i32> {
    current
        .checked_add(extra)
        .ok_or_else(|| AppError::bad_request("quantity is too large"))
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let items = priced_lines(&state.orm, user.user_id, false).await?;
    let total_price = cart_total(&items)?;
    let count = items.len() as i64;

    Ok(ApiResponse::success(
        "OK",
        CartList { items, total_price },
        Some(Meta::new(1, count, count)),
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::bad_request("quantity must be greater than 0"));
    }

    let target = match (payload.component_id, payload.build_id) {
        (Some(component_id), None) => {
            if Components::find_by_id(component_id)
                .one(&state.orm)
                .await?
                .is_none()
            {
                return Err(AppError::bad_request("component not found"));
            }
            CartCol::ComponentId.eq(component_id)
        }
        (None, Some(build_id)) => {
            if Builds::find_by_id(build_id).one(&state.orm).await?.is_none() {
                return Err(AppError::bad_request("build not found"));
            }
            CartCol::BuildId.eq(build_id)
        }
        _ => {
            return Err(AppError::bad_request(
                "exactly one of component_id and build_id is required",
            ));
        }
    };

    let existing = CartItems::find()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user.user_id))
                .add(target),
        )
        .one(&state.orm)
        .await?;

    let item = match existing {
        Some(item) => {
            let quantity = merged_quantity(item.quantity, payload.quantity)?;
            let mut active: CartActive = item.into();
            active.quantity = Set(quantity);
            active.update(&state.orm).await?
        }
        None => {
            CartActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                component_id: Set(payload.component_id),
                build_id: Set(payload.build_id),
                quantity: Set(payload.quantity),
                created_at: Set(Utc::now().into()),
            }
            .insert(&state.orm)
            .await?
        }
    };

    record_audit(
        state,
        user.user_id,
        "cart_add",
        "cart_items",
        serde_json::json!({ "cart_item_id": item.id, "quantity": item.quantity }),
    )
    .await;

    Ok(ApiResponse::success(
        "Added to cart",
        cart_item_from_entity(item),
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let item = CartItems::find()
        .filter(
            Condition::all()
                .add(CartCol::Id.eq(id))
                .add(CartCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    item.delete(&state.orm).await?;

    record_audit(
        state,
        user.user_id,
        "cart_remove",
        "cart_items",
        serde_json::json!({ "cart_item_id": id }),
    )
    .await;

    Ok(ApiResponse::acknowledged("Removed from cart"))
}

fn cart_item_from_entity(model: CartModel) -> CartItem {
    CartItem {
        id: model.id,
        user_id: model.user_id,
        component_id: model.component_id,
        build_id: model.build_id,
        quantity: model.quantity,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(line_total: i64) -> CartLine {
        CartLine {
            id: Uuid::new_v4(),
            component_id: None,
            build_id: Some(Uuid::new_v4()),
            component_kind: None,
            name: "Build".into(),
            quantity: 1,
            unit_price: line_total,
            line_total,
        }
    }

    #[test]
    fn merging_past_i32_max_is_rejected() {
        assert_eq!(merged_quantity(2, 3).unwrap(), 5);
        assert!(matches!(
            merged_quantity(i32::MAX, 1),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn cart_totals_that_overflow_are_rejected() {
        assert_eq!(cart_total(&[line(100), line(250)]).unwrap(), 350);
        assert_eq!(cart_total(&[]).unwrap(), 0);
        assert!(matches!(
            cart_total(&[line(i64::MAX), line(1)]),
            Err(AppError::BadRequest(_))
        ));
    }
}
