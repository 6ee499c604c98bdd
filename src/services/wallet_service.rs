use chrono::{Duration, Utc};
use password_hash::rand_core::{OsRng, RngCore};
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    dto::wallet::{ConfirmTopUpRequest, PendingTopUp, TopUpRequest, WalletOverview},
    entity::{
        BalanceTopups, Balances, Transactions,
        balance_topups::{ActiveModel as TopUpActive, Column as TopUpCol},
        balances::{ActiveModel as BalanceActive, Column as BalanceCol, Model as BalanceModel},
        transactions::{
            ActiveModel as TransactionActive, Column as TransactionCol,
            Model as TransactionModel,
        },
    },
    error::{AppError, AppResult},
    mailer::{self, deliver},
    middleware::auth::AuthUser,
    models::{Balance, Transaction, TransactionType},
    response::{ApiResponse, Meta},
    routes::params::PageQuery,
    state::AppState,
};

/// Largest single top-up, in minor units.
const MAX_TOPUP: i64 = 100_000_000;

/// Balance row of a user, created at zero on first access. Concurrent first
/// accesses race on the insert, so a conflicting insert is a no-op and the row
/// is read back afterwards.
async fn balance_row<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    lock: bool,
) -> AppResult<BalanceModel> {
    Balances::insert(BalanceActive {
        user_id: Set(user_id),
        balance: Set(0),
        updated_at: Set(Utc::now().into()),
    })
    .on_conflict(
        OnConflict::column(BalanceCol::UserId)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    let mut finder = Balances::find_by_id(user_id);
    if lock {
        finder = finder.lock(LockType::Update);
    }
    finder.one(conn).await?.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("balance row for {user_id} missing after insert"))
    })
}

/// Balance after applying `delta`; never negative and never past `i64::MAX`.
fn next_balance(current: i64, delta: i64) -> AppResult<i64> {
    match current.checked_add(delta) {
        Some(next) if next < 0 => Err(AppError::bad_request("insufficient balance")),
        Some(next) => Ok(next),
        None if delta < 0 => Err(AppError::bad_request("insufficient balance")),
        None => Err(AppError::bad_request("balance limit exceeded")),
    }
}

/// Apply `delta` to a user's balance and append the matching ledger entry.
/// Must run inside a transaction; a debit below zero is rejected.
pub(crate) async fn apply_to_balance<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    delta: i64,
    kind: TransactionType,
    description: String,
) -> AppResult<BalanceModel> {
    let row = balance_row(conn, user_id, true).await?;
    let next = next_balance(row.balance, delta)?;

    let mut active: BalanceActive = row.into();
    active.balance = Set(next);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(conn).await?;

    TransactionActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        amount: Set(delta.saturating_abs()),
        transaction_type: Set(kind.as_str().to_string()),
        description: Set(Some(description)),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;

    Ok(updated)
}

pub(crate) async fn current_balance<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<i64> {
    Ok(Balances::find_by_id(user_id)
        .one(conn)
        .await?
        .map(|b| b.balance)
        .unwrap_or(0))
}

pub async fn get_wallet(
    state: &AppState,
    user: &AuthUser,
    query: PageQuery,
) -> AppResult<ApiResponse<WalletOverview>> {
    let (page, limit, offset) = query.pagination().normalize();
    let balance = balance_row(&state.orm, user.user_id, false).await?;

    let finder = Transactions::find()
        .filter(TransactionCol::UserId.eq(user.user_id))
        .order_by_desc(TransactionCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let transactions = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(transaction_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Wallet",
        WalletOverview {
            balance: balance_from_entity(balance),
            transactions,
        },
        Some(Meta::new(page, limit, total)),
    ))
}

fn confirmation_code() -> String {
    format!("{:06}", OsRng.next_u32() % 1_000_000)
}

pub async fn request_topup(
    state: &AppState,
    user: &AuthUser,
    payload: TopUpRequest,
) -> AppResult<ApiResponse<PendingTopUp>> {
    if payload.amount <= 0 || payload.amount > MAX_TOPUP {
        return Err(AppError::bad_request(format!(
            "amount must be between 1 and {MAX_TOPUP}"
        )));
    }
    let email = payload.email.trim().to_string();
    if !email.contains('@') {
        return Err(AppError::bad_request("a valid email is required"));
    }

    let code = confirmation_code();
    let now = Utc::now();
    let expires_at = now + Duration::minutes(state.config.topup_code_ttl_minutes);

    let topup = TopUpActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        amount: Set(payload.amount),
        email: Set(email.clone()),
        code: Set(code.clone()),
        expires_at: Set(expires_at.into()),
        confirmed_at: Set(None),
        created_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    deliver(
        state.mailer.as_ref(),
        mailer::topup_code(&email, payload.amount, &code),
    )
    .await;

    record_audit(
        state,
        user.user_id,
        "topup_request",
        "balance_topups",
        serde_json::json!({ "topup_id": topup.id, "amount": topup.amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Confirmation code sent",
        PendingTopUp {
            id: topup.id,
            amount: topup.amount,
            email: topup.email,
            expires_at: topup.expires_at.with_timezone(&Utc),
        },
        Some(Meta::empty()),
    ))
}

pub async fn confirm_topup(
    state: &AppState,
    user: &AuthUser,
    payload: ConfirmTopUpRequest,
) -> AppResult<ApiResponse<Balance>> {
    let txn = state.orm.begin().await?;
    let now = Utc::now();

    let pending = BalanceTopups::find()
        .filter(
            Condition::all()
                .add(TopUpCol::UserId.eq(user.user_id))
                .add(TopUpCol::ConfirmedAt.is_null())
                .add(TopUpCol::ExpiresAt.gt(now)),
        )
        .order_by_desc(TopUpCol::CreatedAt)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::bad_request("no pending top-up"))?;

    if pending.code != payload.code.trim() {
        return Err(AppError::bad_request("invalid confirmation code"));
    }

    let amount = pending.amount;
    let topup_id = pending.id;
    let balance = apply_to_balance(
        &txn,
        user.user_id,
        amount,
        TransactionType::Deposit,
        "Balance top-up".to_string(),
    )
    .await?;

    let mut active: TopUpActive = pending.into();
    active.confirmed_at = Set(Some(now.into()));
    active.update(&txn).await?;
    txn.commit().await?;

    record_audit(
        state,
        user.user_id,
        "topup_confirm",
        "balance_topups",
        serde_json::json!({ "topup_id": topup_id, "amount": amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Balance topped up",
        balance_from_entity(balance),
        Some(Meta::empty()),
    ))
}

fn balance_from_entity(model: BalanceModel) -> Balance {
    Balance {
        user_id: model.user_id,
        balance: model.balance,
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn transaction_from_entity(model: TransactionModel) -> Transaction {
    Transaction {
        id: model.id,
        user_id: model.user_id,
        amount: model.amount,
        transaction_type: model.transaction_type,
        description: model.description,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_arithmetic_never_overflows() {
        assert_eq!(next_balance(100, -100).unwrap(), 0);
        assert!(matches!(next_balance(100, -101), Err(AppError::BadRequest(_))));
        assert!(matches!(next_balance(i64::MAX, 1), Err(AppError::BadRequest(_))));
        assert!(matches!(next_balance(0, i64::MIN), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn confirmation_codes_are_six_digits() {
        for _ in 0..50 {
            let code = confirmation_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
