use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    dto::catalog::{
        ComponentList, CreateComponentRequest, CreateManufacturerRequest, CreateReviewRequest,
        ManufacturerList, ReviewList, UpdateComponentRequest,
    },
    entity::{
        Components, Manufacturers, Reviews, Stock,
        components::{ActiveModel as ComponentActive, Column as ComponentCol, Model as ComponentModel},
        manufacturers::{
            ActiveModel as ManufacturerActive, Column as ManufacturerCol,
            Model as ManufacturerModel,
        },
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Model as ReviewModel},
        stock::{ActiveModel as StockActive, Column as StockCol},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{Component, ComponentKind, ComponentSpecs, Manufacturer, Review},
    response::{ApiResponse, Meta},
    routes::params::{ComponentQuery, ComponentSortBy, ManufacturerQuery, PageQuery, SortOrder},
    services::contains_pattern,
    state::AppState,
};

pub async fn list_manufacturers(
    state: &AppState,
    query: ManufacturerQuery,
) -> AppResult<ApiResponse<ManufacturerList>> {
    let mut finder = Manufacturers::find();
    if let Some(kind) = query.kind {
        finder = finder.filter(ManufacturerCol::ComponentKind.eq(kind.as_str()));
    }
    let items = finder
        .order_by_asc(ManufacturerCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(manufacturer_from_entity)
        .collect::<Vec<_>>();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Manufacturers",
        ManufacturerList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_manufacturer(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Manufacturer>> {
    let manufacturer = Manufacturers::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(manufacturer_from_entity)
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Manufacturer", manufacturer, None))
}

pub async fn create_manufacturer(
    state: &AppState,
    user: &AuthUser,
    payload: CreateManufacturerRequest,
) -> AppResult<ApiResponse<Manufacturer>> {
    ensure_staff(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    let kind = payload.component_kind.map(|k| k.as_str().to_string());

    let mut duplicate = Condition::all().add(ManufacturerCol::Name.eq(name.clone()));
    duplicate = match &kind {
        Some(kind) => duplicate.add(ManufacturerCol::ComponentKind.eq(kind.clone())),
        None => duplicate.add(ManufacturerCol::ComponentKind.is_null()),
    };
    if Manufacturers::find()
        .filter(duplicate)
        .one(&state.orm)
        .await?
        .is_some()
    {
        return Err(AppError::bad_request("manufacturer already exists"));
    }

    let manufacturer = ManufacturerActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        component_kind: Set(kind),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    record_audit(
        state,
        user.user_id,
        "manufacturer_create",
        "manufacturers",
        serde_json::json!({ "manufacturer_id": manufacturer.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Manufacturer created",
        manufacturer_from_entity(manufacturer),
        Some(Meta::empty()),
    ))
}

/// SQL expression reading a filterable attribute out of `components.specs`.
fn spec_attribute_sql(name: &str) -> Option<&'static str> {
    match name {
        "socket" => Some("components.specs ->> 'socket'"),
        "form_factor" => Some("components.specs ->> 'form_factor'"),
        "memory_type" => Some(
            "COALESCE(components.specs ->> 'memory_type', components.specs ->> 'ram_type')",
        ),
        "interface" => Some("components.specs ->> 'interface'"),
        _ => None,
    }
}

fn component_filter(query: &ComponentQuery) -> Condition {
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col((Components, ComponentCol::Model)).ilike(pattern.clone()))
                .add(Expr::cust_with_values(
                    "EXISTS (SELECT 1 FROM manufacturers m WHERE m.id = components.manufacturer_id AND m.name ILIKE $1)",
                    [pattern],
                )),
        );
    }
    if let Some(kind) = query.kind {
        condition = condition.add(ComponentCol::Kind.eq(kind.as_str()));
    }
    if let Some(manufacturer_id) = query.manufacturer_id {
        condition = condition.add(ComponentCol::ManufacturerId.eq(manufacturer_id));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(ComponentCol::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(ComponentCol::Price.lte(max_price));
    }
    for (name, needle) in query.spec_filters() {
        if let Some(sql) = spec_attribute_sql(name) {
            condition = condition.add(Expr::cust_with_values(
                format!("{sql} ILIKE $1"),
                [contains_pattern(needle)],
            ));
        }
    }
    condition
}

pub async fn list_components(
    state: &AppState,
    query: ComponentQuery,
) -> AppResult<ApiResponse<ComponentList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let condition = component_filter(&query);

    let sort_col = match query.sort_by.unwrap_or(ComponentSortBy::CreatedAt) {
        ComponentSortBy::CreatedAt => ComponentCol::CreatedAt,
        ComponentSortBy::Price => ComponentCol::Price,
        ComponentSortBy::Model => ComponentCol::Model,
    };
    let mut finder = Components::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let rows = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .find_also_related(Manufacturers)
        .all(&state.orm)
        .await?;
    let items = with_stock(&state.orm, rows).await?;

    Ok(ApiResponse::success(
        "Components",
        ComponentList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_component(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Component>> {
    let component = load_component(&state.orm, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Component", component, None))
}

pub async fn create_component(
    state: &AppState,
    user: &AuthUser,
    payload: CreateComponentRequest,
) -> AppResult<ApiResponse<Component>> {
    ensure_staff(user)?;
    validate_component(&payload.model, payload.price, &payload.specs)?;
    ensure_manufacturer(state, payload.manufacturer_id).await?;

    let specs = serde_json::to_value(&payload.specs).map_err(anyhow::Error::from)?;
    let kind = payload.specs.kind();

    let txn = state.orm.begin().await?;
    let component = ComponentActive {
        id: Set(Uuid::new_v4()),
        kind: Set(kind.as_str().to_string()),
        manufacturer_id: Set(payload.manufacturer_id),
        model: Set(payload.model.trim().to_string()),
        price: Set(payload.price),
        image_url: Set(payload.image_url),
        specs: Set(specs),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    StockActive {
        id: Set(Uuid::new_v4()),
        component_id: Set(component.id),
        quantity: Set(state.config.stock_initial_quantity.max(0)),
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    record_audit(
        state,
        user.user_id,
        "component_create",
        "components",
        serde_json::json!({ "component_id": component.id, "kind": kind.as_str() }),
    )
    .await;

    let component = load_component(&state.orm, component.id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Component created",
        component,
        Some(Meta::empty()),
    ))
}

pub async fn update_component(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateComponentRequest,
) -> AppResult<ApiResponse<Component>> {
    ensure_staff(user)?;
    let existing = Components::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let current = component_from_parts(existing.clone(), None, None)?;

    let model = payload.model.unwrap_or_else(|| current.model.clone());
    let price = payload.price.unwrap_or(current.price);
    let specs = payload.specs.unwrap_or_else(|| current.specs.clone());
    if specs.kind() != current.kind {
        return Err(AppError::bad_request(format!(
            "specs must describe a {}",
            current.kind.as_str()
        )));
    }
    validate_component(&model, price, &specs)?;

    let mut active: ComponentActive = existing.into();
    if let Some(manufacturer_id) = payload.manufacturer_id {
        ensure_manufacturer(state, manufacturer_id).await?;
        active.manufacturer_id = Set(manufacturer_id);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    active.model = Set(model.trim().to_string());
    active.price = Set(price);
    active.specs = Set(serde_json::to_value(&specs).map_err(anyhow::Error::from)?);
    let updated = active.update(&state.orm).await?;

    record_audit(
        state,
        user.user_id,
        "component_update",
        "components",
        serde_json::json!({ "component_id": updated.id }),
    )
    .await;

    let component = load_component(&state.orm, updated.id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Component updated",
        component,
        Some(Meta::empty()),
    ))
}

pub async fn delete_component(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;
    let existing = Components::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    existing.delete(&state.orm).await?;

    record_audit(
        state,
        user.user_id,
        "component_delete",
        "components",
        serde_json::json!({ "component_id": id }),
    )
    .await;

    Ok(ApiResponse::acknowledged("Component deleted"))
}

pub async fn list_reviews(
    state: &AppState,
    component_id: Uuid,
    query: PageQuery,
) -> AppResult<ApiResponse<ReviewList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let finder = Reviews::find()
        .filter(ReviewCol::ComponentId.eq(component_id))
        .order_by_desc(ReviewCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    component_id: Uuid,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::bad_request("rating must be between 1 and 5"));
    }
    let text = payload.text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::bad_request("review text must not be empty"));
    }
    if Components::find_by_id(component_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    let now = Utc::now();
    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        component_id: Set(component_id),
        text: Set(text),
        rating: Set(payload.rating),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    record_audit(
        state,
        user.user_id,
        "review_create",
        "reviews",
        serde_json::json!({ "review_id": review.id, "component_id": component_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review added",
        review_from_entity(review),
        Some(Meta::empty()),
    ))
}

fn validate_component(model: &str, price: i64, specs: &ComponentSpecs) -> AppResult<()> {
    if model.trim().is_empty() {
        return Err(AppError::bad_request("model must not be empty"));
    }
    if price < 0 {
        return Err(AppError::bad_request("price must not be negative"));
    }
    specs.validate().map_err(AppError::BadRequest)
}

async fn ensure_manufacturer(state: &AppState, id: Uuid) -> AppResult<()> {
    match Manufacturers::find_by_id(id).one(&state.orm).await? {
        Some(_) => Ok(()),
        None => Err(AppError::bad_request("manufacturer not found")),
    }
}

/// Resolve one component with its manufacturer and stock quantity.
pub(crate) async fn load_component<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<Option<Component>> {
    let mut found = load_components(conn, &[id]).await?;
    Ok(found.remove(&id))
}

/// Resolve a set of components keyed by id; unknown ids are simply absent.
pub(crate) async fn load_components<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Component>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Components::find()
        .filter(ComponentCol::Id.is_in(ids.iter().copied()))
        .find_also_related(Manufacturers)
        .all(conn)
        .await?;
    Ok(with_stock(conn, rows)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect())
}

/// Every catalog component of one kind, cheapest first.
pub(crate) async fn load_components_of_kind<C: ConnectionTrait>(
    conn: &C,
    kind: ComponentKind,
) -> AppResult<Vec<Component>> {
    let rows = Components::find()
        .filter(ComponentCol::Kind.eq(kind.as_str()))
        .order_by_asc(ComponentCol::Price)
        .find_also_related(Manufacturers)
        .all(conn)
        .await?;
    with_stock(conn, rows).await
}

async fn with_stock<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<(ComponentModel, Option<ManufacturerModel>)>,
) -> AppResult<Vec<Component>> {
    let ids: Vec<Uuid> = rows.iter().map(|(c, _)| c.id).collect();
    let quantities: HashMap<Uuid, i32> = if ids.is_empty() {
        HashMap::new()
    } else {
        Stock::find()
            .filter(StockCol::ComponentId.is_in(ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|s| (s.component_id, s.quantity))
            .collect()
    };

    rows.into_iter()
        .map(|(component, manufacturer)| {
            let stock = quantities.get(&component.id).copied();
            component_from_parts(component, manufacturer, stock)
        })
        .collect()
}

pub(crate) fn component_from_parts(
    model: ComponentModel,
    manufacturer: Option<ManufacturerModel>,
    stock: Option<i32>,
) -> AppResult<Component> {
    let kind = ComponentKind::parse(&model.kind).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("unknown component kind {}", model.kind))
    })?;
    let specs: ComponentSpecs = serde_json::from_value(model.specs)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid specs for {}: {e}", model.id)))?;
    Ok(Component {
        id: model.id,
        kind,
        manufacturer_id: model.manufacturer_id,
        manufacturer: manufacturer.map(|m| m.name).unwrap_or_default(),
        model: model.model,
        price: model.price,
        image_url: model.image_url,
        specs,
        stock,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn manufacturer_from_entity(model: ManufacturerModel) -> Manufacturer {
    Manufacturer {
        id: model.id,
        name: model.name,
        component_kind: model.component_kind.as_deref().and_then(ComponentKind::parse),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn review_from_entity(model: ReviewModel) -> Review {
    Review {
        id: model.id,
        user_id: model.user_id,
        component_id: model.component_id,
        text: model.text,
        rating: model.rating,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PsuSpecs;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn search_and_spec_filters_bind_their_values() {
        let query = ComponentQuery {
            q: Some("ryz".into()),
            socket: Some("am5".into()),
            ..Default::default()
        };
        let sql = Components::find()
            .filter(component_filter(&query))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(!sql.contains('?'), "{sql}");
        assert!(sql.contains("m.name ILIKE '%ryz%'"), "{sql}");
        assert!(sql.contains("->> 'socket' ILIKE '%am5%'"), "{sql}");
    }

    #[test]
    fn memory_type_filter_covers_boards_and_modules() {
        let sql = spec_attribute_sql("memory_type").unwrap();
        assert!(sql.contains("'memory_type'") && sql.contains("'ram_type'"));
        assert!(spec_attribute_sql("chipset").is_none());
    }

    #[test]
    fn negative_price_is_rejected() {
        let specs = ComponentSpecs::Psu(PsuSpecs {
            power_w: 650,
            certification: "80+ Gold".into(),
            modular: true,
        });
        assert!(validate_component("RM650", 0, &specs).is_ok());
        assert!(matches!(
            validate_component("RM650", -1, &specs),
            Err(AppError::BadRequest(_))
        ));
        assert!(validate_component("  ", 100, &specs).is_err());
    }
}
