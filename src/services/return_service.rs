use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    dto::returns::{CreateReturnRequest, ProcessReturnRequest, ReturnList},
    entity::{
        OrderItems, Orders, ReturnRequests,
        orders::ActiveModel as OrderActive,
        return_requests::{ActiveModel as ReturnActive, Column as ReturnCol, Model as ReturnModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{ReturnRequest, ReturnStatus, TransactionType},
    response::{ApiResponse, Meta},
    routes::params::PageQuery,
    services::wallet_service::apply_to_balance,
    state::AppState,
};

pub async fn create_return(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReturnRequest,
) -> AppResult<ApiResponse<ReturnRequest>> {
    let reason = payload.reason.trim().to_string();
    if reason.is_empty() {
        return Err(AppError::bad_request("reason must not be empty"));
    }

    let txn = state.orm.begin().await?;

    let item = OrderItems::find_by_id(payload.order_item_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let order = Orders::find_by_id(item.order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .filter(|o| o.user_id == user.user_id)
        .ok_or(AppError::NotFound)?;

    if order.return_request_id.is_some() {
        return Err(AppError::bad_request(
            "a return request already exists for this order",
        ));
    }

    let now = Utc::now();
    let request = ReturnActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        order_item_id: Set(item.id),
        reason: Set(reason),
        status: Set(ReturnStatus::Pending.as_str().to_string()),
        comment: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut order: OrderActive = order.into();
    order.return_request_id = Set(Some(request.id));
    order.updated_at = Set(now.into());
    order.update(&txn).await?;

    txn.commit().await?;

    record_audit(
        state,
        user.user_id,
        "return_create",
        "return_requests",
        serde_json::json!({ "return_request_id": request.id, "order_item_id": item.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Return request created",
        return_from_entity(request),
        Some(Meta::empty()),
    ))
}

pub async fn list_my_returns(
    state: &AppState,
    user: &AuthUser,
    query: PageQuery,
) -> AppResult<ApiResponse<ReturnList>> {
    list_returns_for(state, Some(user.user_id), query).await
}

pub async fn list_returns(
    state: &AppState,
    user: &AuthUser,
    query: PageQuery,
) -> AppResult<ApiResponse<ReturnList>> {
    ensure_staff(user)?;
    list_returns_for(state, None, query).await
}

async fn list_returns_for(
    state: &AppState,
    owner: Option<Uuid>,
    query: PageQuery,
) -> AppResult<ApiResponse<ReturnList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut finder = ReturnRequests::find();
    if let Some(owner) = owner {
        finder = finder.filter(ReturnCol::UserId.eq(owner));
    }
    let finder = finder.order_by_desc(ReturnCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(return_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Return requests",
        ReturnList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn process_return(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ProcessReturnRequest,
) -> AppResult<ApiResponse<ReturnRequest>> {
    ensure_staff(user)?;

    let txn = state.orm.begin().await?;
    let existing = ReturnRequests::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let refunding = payload.status == ReturnStatus::Refunded
        && existing.status != ReturnStatus::Refunded.as_str();

    let mut refunded_amount = None;
    if refunding {
        let item = OrderItems::find_by_id(existing.order_item_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        let amount = item
            .price
            .checked_mul(i64::from(item.quantity))
            .ok_or_else(|| AppError::bad_request("refund amount is too large"))?;
        apply_to_balance(
            &txn,
            existing.user_id,
            amount,
            TransactionType::Refund,
            format!("Refund for {}", item.item),
        )
        .await?;
        refunded_amount = Some(amount);
    }

    let mut active: ReturnActive = existing.into();
    active.status = Set(payload.status.as_str().to_string());
    if let Some(comment) = payload.comment.map(|c| c.trim().to_string()) {
        active.comment = Set(Some(comment).filter(|c| !c.is_empty()));
    }
    active.updated_at = Set(Utc::now().into());
    let request = active.update(&txn).await?;
    txn.commit().await?;

    record_audit(
        state,
        user.user_id,
        "return_process",
        "return_requests",
        serde_json::json!({
            "return_request_id": request.id,
            "status": request.status,
            "refunded": refunded_amount,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Return request updated",
        return_from_entity(request),
        Some(Meta::empty()),
    ))
}

pub(crate) fn return_from_entity(model: ReturnModel) -> ReturnRequest {
    ReturnRequest {
        id: model.id,
        user_id: model.user_id,
        order_item_id: model.order_item_id,
        reason: model.reason,
        status: model.status,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
