use chrono::{DateTime, Utc};
use sea_orm::sea_query::LockType;
use sea_orm::{ActiveModelTrait, EntityTrait, QuerySelect, Set, TransactionTrait};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::record_audit,
    db::pg_pool,
    dto::stock::{StockAdjustRequest, StockList},
    entity::{Stock, stock::ActiveModel as StockActive},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::StockRecord,
    response::{ApiResponse, Meta},
    routes::params::{LowStockQuery, StockQuery},
    services::contains_pattern,
    state::AppState,
};

#[derive(FromRow)]
struct StockRow {
    id: Uuid,
    component_id: Uuid,
    component_kind: String,
    component_name: String,
    quantity: i32,
    updated_at: DateTime<Utc>,
}

impl From<StockRow> for StockRecord {
    fn from(row: StockRow) -> Self {
        StockRecord {
            id: row.id,
            component_id: row.component_id,
            component_kind: row.component_kind,
            component_name: row.component_name,
            quantity: row.quantity,
            updated_at: row.updated_at,
        }
    }
}

pub async fn list_stock(
    state: &AppState,
    user: &AuthUser,
    query: StockQuery,
) -> AppResult<ApiResponse<StockList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination().normalize();
    let search = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let pattern = search.as_deref().map(contains_pattern);
    let pool = pg_pool(&state.orm);

    let rows = sqlx::query_as::<_, StockRow>(
        r#"
        SELECT s.id, s.component_id, c.kind AS component_kind,
               m.name || ' ' || c.model AS component_name,
               s.quantity, s.updated_at
        FROM stock s
        JOIN components c ON c.id = s.component_id
        JOIN manufacturers m ON m.id = c.manufacturer_id
        WHERE $1::text IS NULL
           OR m.name || ' ' || c.model ILIKE $1
           OR s.quantity::text = $2
        ORDER BY s.quantity ASC, component_name ASC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(pattern.as_deref())
    .bind(search.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM stock s
        JOIN components c ON c.id = s.component_id
        JOIN manufacturers m ON m.id = c.manufacturer_id
        WHERE $1::text IS NULL
           OR m.name || ' ' || c.model ILIKE $1
           OR s.quantity::text = $2
        "#,
    )
    .bind(pattern.as_deref())
    .bind(search.as_deref())
    .fetch_one(pool)
    .await?;

    let out_of_stock: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stock WHERE quantity = 0")
        .fetch_one(pool)
        .await?;

    Ok(ApiResponse::success(
        "Stock",
        StockList {
            items: rows.into_iter().map(StockRecord::from).collect(),
            out_of_stock_count: out_of_stock.0,
        },
        Some(Meta::new(page, limit, total.0)),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<StockList>> {
    ensure_staff(user)?;
    let threshold = query.threshold.unwrap_or(5);
    let (page, limit, offset) = query.pagination().normalize();
    let pool = pg_pool(&state.orm);

    let rows = sqlx::query_as::<_, StockRow>(
        r#"
        SELECT s.id, s.component_id, c.kind AS component_kind,
               m.name || ' ' || c.model AS component_name,
               s.quantity, s.updated_at
        FROM stock s
        JOIN components c ON c.id = s.component_id
        JOIN manufacturers m ON m.id = c.manufacturer_id
        WHERE s.quantity <= $1
        ORDER BY s.quantity ASC, s.updated_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(threshold)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stock WHERE quantity <= $1")
        .bind(threshold)
        .fetch_one(pool)
        .await?;
    let out_of_stock: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stock WHERE quantity = 0")
        .fetch_one(pool)
        .await?;

    Ok(ApiResponse::success(
        "Low stock",
        StockList {
            items: rows.into_iter().map(StockRecord::from).collect(),
            out_of_stock_count: out_of_stock.0,
        },
        Some(Meta::new(page, limit, total.0)),
    ))
}

pub async fn replenish(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: StockAdjustRequest,
) -> AppResult<ApiResponse<StockRecord>> {
    let amount = adjustment(state, &payload)?;
    adjust(state, user, id, amount, "stock_replenish").await
}

pub async fn reduce(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: StockAdjustRequest,
) -> AppResult<ApiResponse<StockRecord>> {
    let amount = adjustment(state, &payload)?;
    adjust(state, user, id, -amount, "stock_reduce").await
}

fn adjustment(state: &AppState, payload: &StockAdjustRequest) -> AppResult<i32> {
    let amount = payload.amount.unwrap_or(state.config.stock_adjust_step);
    if amount <= 0 {
        return Err(AppError::bad_request("amount must be greater than 0"));
    }
    Ok(amount)
}

/// Quantity after applying `delta`, floored at zero.
fn adjusted_quantity(current: i32, delta: i32) -> i32 {
    current.saturating_add(delta).max(0)
}

async fn adjust(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    delta: i32,
    action: &str,
) -> AppResult<ApiResponse<StockRecord>> {
    ensure_staff(user)?;

    let txn = state.orm.begin().await?;
    let existing = Stock::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let before = existing.quantity;

    let mut active: StockActive = existing.into();
    active.quantity = Set(adjusted_quantity(before, delta));
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    tracing::debug!(stock_id = %id, before, after = updated.quantity, "stock adjusted");
    record_audit(
        state,
        user.user_id,
        action,
        "stock",
        serde_json::json!({ "stock_id": id, "before": before, "after": updated.quantity }),
    )
    .await;

    let record = stock_record(state, updated.id).await?;
    Ok(ApiResponse::success(
        "Stock updated",
        record,
        Some(Meta::empty()),
    ))
}

async fn stock_record(state: &AppState, id: Uuid) -> AppResult<StockRecord> {
    let row = sqlx::query_as::<_, StockRow>(
        r#"
        SELECT s.id, s.component_id, c.kind AS component_kind,
               m.name || ' ' || c.model AS component_name,
               s.quantity, s.updated_at
        FROM stock s
        JOIN components c ON c.id = s.component_id
        JOIN manufacturers m ON m.id = c.manufacturer_id
        WHERE s.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pg_pool(&state.orm))
    .await?;
    row.map(StockRecord::from).ok_or(AppError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reductions_stop_at_zero() {
        assert_eq!(adjusted_quantity(3, -10), 0);
        assert_eq!(adjusted_quantity(12, -10), 2);
        assert_eq!(adjusted_quantity(0, 10), 10);
    }
}
