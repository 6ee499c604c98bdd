use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::wallet::{ConfirmTopUpRequest, PendingTopUp, TopUpRequest, WalletOverview},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Balance,
    response::ApiResponse,
    routes::params::PageQuery,
    services::wallet_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(wallet))
        .route("/topup", post(request_topup))
        .route("/topup/confirm", post(confirm_topup))
}

#[utoipa::path(
    get,
    path = "/api/wallet",
    params(PageQuery),
    responses(
        (status = 200, description = "Balance and transactions, newest first", body = ApiResponse<WalletOverview>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn wallet(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<WalletOverview>>> {
    let resp = wallet_service::get_wallet(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/wallet/topup",
    request_body = TopUpRequest,
    responses(
        (status = 200, description = "Confirmation code emailed", body = ApiResponse<PendingTopUp>),
        (status = 400, description = "Invalid amount or email")
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn request_topup(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<TopUpRequest>,
) -> AppResult<Json<ApiResponse<PendingTopUp>>> {
    let resp = wallet_service::request_topup(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/wallet/topup/confirm",
    request_body = ConfirmTopUpRequest,
    responses(
        (status = 200, description = "Balance credited", body = ApiResponse<Balance>),
        (status = 400, description = "No pending top-up or wrong code")
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn confirm_topup(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ConfirmTopUpRequest>,
) -> AppResult<Json<ApiResponse<Balance>>> {
    let resp = wallet_service::confirm_topup(&state, &user, payload).await?;
    Ok(Json(resp))
}
