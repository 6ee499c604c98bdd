use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        builds::{BuildDetail, BuildList, BuildPreview, BuildRequest},
        catalog::ComponentList,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::{CpuLookupQuery, MotherboardLookupQuery, PageQuery},
    services::build_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_builds).post(create_build))
        .route("/preview", post(preview_build))
        .route("/compatible/motherboards", get(compatible_motherboards))
        .route("/compatible/rams", get(compatible_rams))
        .route("/compatible/cpus", get(compatible_cpus))
        .route(
            "/{id}",
            get(get_build).put(update_build).delete(delete_build),
        )
}

#[utoipa::path(
    get,
    path = "/api/builds",
    params(PageQuery),
    responses(
        (status = 200, description = "List builds, newest first", body = ApiResponse<BuildList>)
    ),
    tag = "Builds"
)]
pub async fn list_builds(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<BuildList>>> {
    let resp = build_service::list_builds(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/builds",
    request_body = BuildRequest,
    responses(
        (status = 200, description = "Build created", body = ApiResponse<BuildDetail>),
        (status = 400, description = "Unknown, misplaced or incompatible components")
    ),
    security(("bearer_auth" = [])),
    tag = "Builds"
)]
pub async fn create_build(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BuildRequest>,
) -> AppResult<Json<ApiResponse<BuildDetail>>> {
    let resp = build_service::create_build(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/builds/preview",
    request_body = BuildRequest,
    responses(
        (status = 200, description = "Compatibility report and price without saving", body = ApiResponse<BuildPreview>),
        (status = 400, description = "Unknown or misplaced components")
    ),
    tag = "Builds"
)]
pub async fn preview_build(
    State(state): State<AppState>,
    Json(payload): Json<BuildRequest>,
) -> AppResult<Json<ApiResponse<BuildPreview>>> {
    let resp = build_service::preview_build(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/builds/{id}",
    params(("id" = Uuid, Path, description = "Build ID")),
    responses(
        (status = 200, description = "Build with components and a fresh compatibility check", body = ApiResponse<BuildDetail>),
        (status = 404, description = "Not found")
    ),
    tag = "Builds"
)]
pub async fn get_build(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BuildDetail>>> {
    let resp = build_service::get_build(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/builds/{id}",
    params(("id" = Uuid, Path, description = "Build ID")),
    request_body = BuildRequest,
    responses(
        (status = 200, description = "Build updated", body = ApiResponse<BuildDetail>),
        (status = 400, description = "Unknown, misplaced or incompatible components"),
        (status = 403, description = "Owner or staff only"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Builds"
)]
pub async fn update_build(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<BuildRequest>,
) -> AppResult<Json<ApiResponse<BuildDetail>>> {
    let resp = build_service::update_build(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/builds/{id}",
    params(("id" = Uuid, Path, description = "Build ID")),
    responses(
        (status = 200, description = "Build deleted"),
        (status = 403, description = "Owner or staff only"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Builds"
)]
pub async fn delete_build(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = build_service::delete_build(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/builds/compatible/motherboards",
    params(CpuLookupQuery),
    responses(
        (status = 200, description = "Motherboards sharing the CPU socket", body = ApiResponse<ComponentList>),
        (status = 404, description = "CPU not found")
    ),
    tag = "Builds"
)]
pub async fn compatible_motherboards(
    State(state): State<AppState>,
    Query(query): Query<CpuLookupQuery>,
) -> AppResult<Json<ApiResponse<ComponentList>>> {
    let resp = build_service::compatible_motherboards(&state, query.cpu_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/builds/compatible/rams",
    params(MotherboardLookupQuery),
    responses(
        (status = 200, description = "RAM modules the motherboard supports", body = ApiResponse<ComponentList>),
        (status = 404, description = "Motherboard not found")
    ),
    tag = "Builds"
)]
pub async fn compatible_rams(
    State(state): State<AppState>,
    Query(query): Query<MotherboardLookupQuery>,
) -> AppResult<Json<ApiResponse<ComponentList>>> {
    let resp = build_service::compatible_rams(&state, query.motherboard_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/builds/compatible/cpus",
    params(MotherboardLookupQuery),
    responses(
        (status = 200, description = "CPUs matching the motherboard socket", body = ApiResponse<ComponentList>),
        (status = 404, description = "Motherboard not found")
    ),
    tag = "Builds"
)]
pub async fn compatible_cpus(
    State(state): State<AppState>,
    Query(query): Query<MotherboardLookupQuery>,
) -> AppResult<Json<ApiResponse<ComponentList>>> {
    let resp = build_service::compatible_cpus(&state, query.motherboard_id).await?;
    Ok(Json(resp))
}
