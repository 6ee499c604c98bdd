use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::returns::{CreateReturnRequest, ReturnList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::ReturnRequest,
    response::ApiResponse,
    routes::params::PageQuery,
    services::return_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_my_returns).post(create_return))
}

#[utoipa::path(
    get,
    path = "/api/returns",
    params(PageQuery),
    responses(
        (status = 200, description = "Return requests of the current user", body = ApiResponse<ReturnList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Returns"
)]
pub async fn list_my_returns(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<ReturnList>>> {
    let resp = return_service::list_my_returns(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/returns",
    request_body = CreateReturnRequest,
    responses(
        (status = 200, description = "Return request created", body = ApiResponse<ReturnRequest>),
        (status = 400, description = "Empty reason or order already has a return"),
        (status = 404, description = "Order item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Returns"
)]
pub async fn create_return(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateReturnRequest>,
) -> AppResult<Json<ApiResponse<ReturnRequest>>> {
    let resp = return_service::create_return(&state, &user, payload).await?;
    Ok(Json(resp))
}
