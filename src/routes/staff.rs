use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::{OrderWithItems, StaffOrderList, UpdateOrderStatusRequest},
        returns::{ProcessReturnRequest, ReturnList},
        stock::{StockAdjustRequest, StockList},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, ReturnRequest, StockRecord},
    response::ApiResponse,
    routes::params::{LowStockQuery, PageQuery, StaffOrderQuery, StockQuery},
    services::{return_service, staff_service, stock_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_active_orders))
        .route("/orders/history", get(list_order_history))
        .route("/orders/{id}", get(get_order_staff))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/orders/{id}/complete", post(complete_order))
        .route("/stock", get(list_stock))
        .route("/stock/low", get(list_low_stock))
        .route("/stock/{id}/replenish", post(replenish_stock))
        .route("/stock/{id}/reduce", post(reduce_stock))
        .route("/returns", get(list_returns))
        .route("/returns/{id}", put(process_return))
}

#[utoipa::path(
    get,
    path = "/api/staff/orders",
    params(StaffOrderQuery),
    responses(
        (status = 200, description = "Orders not yet completed", body = ApiResponse<StaffOrderList>),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn list_active_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<StaffOrderQuery>,
) -> AppResult<Json<ApiResponse<StaffOrderList>>> {
    let resp = staff_service::list_active_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/staff/orders/history",
    params(StaffOrderQuery),
    responses(
        (status = 200, description = "Completed orders with their return requests", body = ApiResponse<StaffOrderList>),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn list_order_history(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<StaffOrderQuery>,
) -> AppResult<Json<ApiResponse<StaffOrderList>>> {
    let resp = staff_service::list_order_history(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/staff/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn get_order_staff(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = staff_service::get_order_staff(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/staff/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<Order>),
        (status = 400, description = "Status not allowed for the delivery option"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = staff_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/staff/orders/{id}/complete",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order moved to history", body = ApiResponse<Order>),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn complete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = staff_service::complete_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/staff/stock",
    params(StockQuery),
    responses(
        (status = 200, description = "Stock records with the out of stock count", body = ApiResponse<StockList>),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn list_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<StockQuery>,
) -> AppResult<Json<ApiResponse<StockList>>> {
    let resp = stock_service::list_stock(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/staff/stock/low",
    params(LowStockQuery),
    responses(
        (status = 200, description = "Stock at or below the threshold", body = ApiResponse<StockList>),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<ApiResponse<StockList>>> {
    let resp = stock_service::list_low_stock(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/staff/stock/{id}/replenish",
    params(("id" = Uuid, Path, description = "Stock record ID")),
    request_body = StockAdjustRequest,
    responses(
        (status = 200, description = "Stock increased", body = ApiResponse<StockRecord>),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn replenish_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<StockAdjustRequest>>,
) -> AppResult<Json<ApiResponse<StockRecord>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let resp = stock_service::replenish(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/staff/stock/{id}/reduce",
    params(("id" = Uuid, Path, description = "Stock record ID")),
    request_body = StockAdjustRequest,
    responses(
        (status = 200, description = "Stock decreased, never below zero", body = ApiResponse<StockRecord>),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn reduce_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<StockAdjustRequest>>,
) -> AppResult<Json<ApiResponse<StockRecord>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let resp = stock_service::reduce(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/staff/returns",
    params(PageQuery),
    responses(
        (status = 200, description = "All return requests, newest first", body = ApiResponse<ReturnList>),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn list_returns(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<ReturnList>>> {
    let resp = return_service::list_returns(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/staff/returns/{id}",
    params(("id" = Uuid, Path, description = "Return request ID")),
    request_body = ProcessReturnRequest,
    responses(
        (status = 200, description = "Return processed; refunds credit the wallet", body = ApiResponse<ReturnRequest>),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn process_return(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProcessReturnRequest>,
) -> AppResult<Json<ApiResponse<ReturnRequest>>> {
    let resp = return_service::process_return(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
