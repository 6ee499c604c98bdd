use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::catalog::{
        ComponentList, CreateComponentRequest, CreateManufacturerRequest, CreateReviewRequest,
        ManufacturerList, ReviewList, UpdateComponentRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Component, Manufacturer, Review},
    response::ApiResponse,
    routes::params::{ComponentQuery, ManufacturerQuery, PageQuery},
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/manufacturers",
            get(list_manufacturers).post(create_manufacturer),
        )
        .route("/manufacturers/{id}", get(get_manufacturer))
        .route("/components", get(list_components).post(create_component))
        .route(
            "/components/{id}",
            get(get_component)
                .put(update_component)
                .delete(delete_component),
        )
        .route(
            "/components/{id}/reviews",
            get(list_reviews).post(create_review),
        )
}

#[utoipa::path(
    get,
    path = "/api/manufacturers",
    params(ManufacturerQuery),
    responses(
        (status = 200, description = "List manufacturers", body = ApiResponse<ManufacturerList>)
    ),
    tag = "Catalog"
)]
pub async fn list_manufacturers(
    State(state): State<AppState>,
    Query(query): Query<ManufacturerQuery>,
) -> AppResult<Json<ApiResponse<ManufacturerList>>> {
    let resp = catalog_service::list_manufacturers(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/manufacturers/{id}",
    params(("id" = Uuid, Path, description = "Manufacturer ID")),
    responses(
        (status = 200, description = "Manufacturer", body = ApiResponse<Manufacturer>),
        (status = 404, description = "Not found")
    ),
    tag = "Catalog"
)]
pub async fn get_manufacturer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Manufacturer>>> {
    let resp = catalog_service::get_manufacturer(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/manufacturers",
    request_body = CreateManufacturerRequest,
    responses(
        (status = 200, description = "Create manufacturer", body = ApiResponse<Manufacturer>),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn create_manufacturer(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateManufacturerRequest>,
) -> AppResult<Json<ApiResponse<Manufacturer>>> {
    let resp = catalog_service::create_manufacturer(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/components",
    params(ComponentQuery),
    responses(
        (status = 200, description = "List components with filters and sorting", body = ApiResponse<ComponentList>)
    ),
    tag = "Catalog"
)]
pub async fn list_components(
    State(state): State<AppState>,
    Query(query): Query<ComponentQuery>,
) -> AppResult<Json<ApiResponse<ComponentList>>> {
    let resp = catalog_service::list_components(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/components/{id}",
    params(("id" = Uuid, Path, description = "Component ID")),
    responses(
        (status = 200, description = "Component with specs and stock", body = ApiResponse<Component>),
        (status = 404, description = "Not found")
    ),
    tag = "Catalog"
)]
pub async fn get_component(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Component>>> {
    let resp = catalog_service::get_component(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/components",
    request_body = CreateComponentRequest,
    responses(
        (status = 200, description = "Create component and its stock record", body = ApiResponse<Component>),
        (status = 400, description = "Invalid component"),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn create_component(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateComponentRequest>,
) -> AppResult<Json<ApiResponse<Component>>> {
    let resp = catalog_service::create_component(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/components/{id}",
    params(("id" = Uuid, Path, description = "Component ID")),
    request_body = UpdateComponentRequest,
    responses(
        (status = 200, description = "Update component", body = ApiResponse<Component>),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn update_component(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateComponentRequest>,
) -> AppResult<Json<ApiResponse<Component>>> {
    let resp = catalog_service::update_component(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/components/{id}",
    params(("id" = Uuid, Path, description = "Component ID")),
    responses(
        (status = 200, description = "Component deleted"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn delete_component(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = catalog_service::delete_component(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/components/{id}/reviews",
    params(
        ("id" = Uuid, Path, description = "Component ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Reviews, newest first", body = ApiResponse<ReviewList>)
    ),
    tag = "Catalog"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    let resp = catalog_service::list_reviews(&state, id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/components/{id}/reviews",
    params(("id" = Uuid, Path, description = "Component ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 200, description = "Review added", body = ApiResponse<Review>),
        (status = 400, description = "Invalid rating or text"),
        (status = 404, description = "Component not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = catalog_service::create_review(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
