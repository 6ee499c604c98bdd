use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    compatibility::{self, CompatibilityIssue, Incompatibility, Selection},
    dto::{
        builds::{BuildDetail, BuildList, BuildPreview, BuildRequest},
        catalog::ComponentList,
    },
    entity::{
        Builds,
        builds::{ActiveModel as BuildActive, Column as BuildCol, Model as BuildModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_staff},
    models::{Build, Component, ComponentKind, ComponentSpecs},
    response::{ApiResponse, Meta},
    routes::params::PageQuery,
    services::catalog_service::{load_component, load_components, load_components_of_kind},
    state::AppState,
};

/// Resolve the requested ids into a selection, rejecting unknown ids and ids
/// placed in the wrong slot.
pub(crate) async fn resolve_selection<C: ConnectionTrait>(
    conn: &C,
    payload: &BuildRequest,
) -> AppResult<Selection> {
    let slots = payload.slots();
    let ids: Vec<Uuid> = slots.iter().map(|(_, id)| *id).collect();
    let mut found = load_components(conn, &ids).await?;

    let mut selection = Selection::default();
    for (kind, id) in slots {
        let component = found
            .remove(&id)
            .ok_or_else(|| AppError::bad_request(format!("{} {id} not found", kind.as_str())))?;
        if component.kind != kind {
            return Err(AppError::bad_request(format!(
                "component {id} is a {}, not a {}",
                component.kind.as_str(),
                kind.as_str()
            )));
        }
        *selection.slot_mut(kind) = Some(component);
    }
    Ok(selection)
}

/// Components currently referenced by a stored build. Slots whose component
/// was deleted are empty.
async fn selection_for_build<C: ConnectionTrait>(
    conn: &C,
    build: &BuildModel,
) -> AppResult<Selection> {
    let slots = slot_ids(build);
    let ids: Vec<Uuid> = slots.iter().filter_map(|(_, id)| *id).collect();
    let mut found = load_components(conn, &ids).await?;

    let mut selection = Selection::default();
    for (kind, id) in slots {
        if let Some(component) = id.and_then(|id| found.remove(&id)) {
            *selection.slot_mut(kind) = Some(component);
        }
    }
    Ok(selection)
}

fn slot_ids(build: &BuildModel) -> [(ComponentKind, Option<Uuid>); 8] {
    [
        (ComponentKind::Cpu, build.cpu_id),
        (ComponentKind::Gpu, build.gpu_id),
        (ComponentKind::Motherboard, build.motherboard_id),
        (ComponentKind::Ram, build.ram_id),
        (ComponentKind::Storage, build.storage_id),
        (ComponentKind::Psu, build.psu_id),
        (ComponentKind::Case, build.case_id),
        (ComponentKind::Cooler, build.cooler_id),
    ]
}

fn issues_of(incompatibilities: &[Incompatibility]) -> Vec<CompatibilityIssue> {
    incompatibilities.iter().map(CompatibilityIssue::from).collect()
}

/// Resolve and check a selection that is about to be stored.
async fn validated_selection(state: &AppState, payload: &BuildRequest) -> AppResult<Selection> {
    let selection = resolve_selection(&state.orm, payload).await?;
    if selection.is_empty() {
        return Err(AppError::bad_request("a build needs at least one component"));
    }
    let incompatibilities = compatibility::check(&selection);
    if !incompatibilities.is_empty() {
        let messages: Vec<String> = incompatibilities.iter().map(|i| i.to_string()).collect();
        return Err(AppError::bad_request(format!(
            "incompatible components: {}",
            messages.join("; ")
        )));
    }
    Ok(selection)
}

fn normalized_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

pub async fn preview_build(
    state: &AppState,
    payload: BuildRequest,
) -> AppResult<ApiResponse<BuildPreview>> {
    let selection = resolve_selection(&state.orm, &payload).await?;
    let issues = issues_of(&compatibility::check(&selection));
    let total_price = selection.total_price();

    Ok(ApiResponse::success(
        "Build preview",
        BuildPreview {
            compatible: issues.is_empty(),
            issues,
            total_price,
            components: selection.into(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn create_build(
    state: &AppState,
    user: &AuthUser,
    payload: BuildRequest,
) -> AppResult<ApiResponse<BuildDetail>> {
    let selection = validated_selection(state, &payload).await?;
    let now = Utc::now();

    let build = BuildActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        name: Set(normalized_name(payload.name)),
        cpu_id: Set(payload.cpu_id),
        gpu_id: Set(payload.gpu_id),
        motherboard_id: Set(payload.motherboard_id),
        ram_id: Set(payload.ram_id),
        storage_id: Set(payload.storage_id),
        psu_id: Set(payload.psu_id),
        case_id: Set(payload.case_id),
        cooler_id: Set(payload.cooler_id),
        total_price: Set(selection.total_price()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    record_audit(
        state,
        user.user_id,
        "build_create",
        "builds",
        serde_json::json!({ "build_id": build.id, "total_price": build.total_price }),
    )
    .await;

    Ok(ApiResponse::success(
        "Build created",
        detail(build, selection),
        Some(Meta::empty()),
    ))
}

pub async fn update_build(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: BuildRequest,
) -> AppResult<ApiResponse<BuildDetail>> {
    let existing = Builds::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner_or_staff(user, existing.user_id)?;

    let selection = validated_selection(state, &payload).await?;
    let name = normalized_name(payload.name).or_else(|| existing.name.clone());

    let mut active: BuildActive = existing.into();
    active.name = Set(name);
    active.cpu_id = Set(payload.cpu_id);
    active.gpu_id = Set(payload.gpu_id);
    active.motherboard_id = Set(payload.motherboard_id);
    active.ram_id = Set(payload.ram_id);
    active.storage_id = Set(payload.storage_id);
    active.psu_id = Set(payload.psu_id);
    active.case_id = Set(payload.case_id);
    active.cooler_id = Set(payload.cooler_id);
    active.total_price = Set(selection.total_price());
    active.updated_at = Set(Utc::now().into());
    let build = active.update(&state.orm).await?;

    record_audit(
        state,
        user.user_id,
        "build_update",
        "builds",
        serde_json::json!({ "build_id": build.id, "total_price": build.total_price }),
    )
    .await;

    Ok(ApiResponse::success(
        "Build updated",
        detail(build, selection),
        Some(Meta::empty()),
    ))
}

pub async fn get_build(state: &AppState, id: Uuid) -> AppResult<ApiResponse<BuildDetail>> {
    let build = Builds::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let selection = selection_for_build(&state.orm, &build).await?;
    Ok(ApiResponse::success(
        "Build",
        detail(build, selection),
        Some(Meta::empty()),
    ))
}

pub async fn list_builds(state: &AppState, query: PageQuery) -> AppResult<ApiResponse<BuildList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let finder = Builds::find().order_by_desc(BuildCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(build_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Builds",
        BuildList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn delete_build(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = Builds::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner_or_staff(user, existing.user_id)?;
    existing.delete(&state.orm).await?;

    record_audit(
        state,
        user.user_id,
        "build_delete",
        "builds",
        serde_json::json!({ "build_id": id }),
    )
    .await;

    Ok(ApiResponse::acknowledged("Build deleted"))
}

async fn anchor(state: &AppState, id: Uuid, kind: ComponentKind) -> AppResult<Component> {
    let component = load_component(&state.orm, id)
        .await?
        .ok_or(AppError::NotFound)?;
    if component.kind != kind {
        return Err(AppError::bad_request(format!(
            "component {id} is not a {}",
            kind.as_str()
        )));
    }
    Ok(component)
}

fn lookup_response(items: Vec<&Component>) -> ApiResponse<ComponentList> {
    let items: Vec<Component> = items.into_iter().cloned().collect();
    let total = items.len() as i64;
    ApiResponse::success(
        "Compatible components",
        ComponentList { items },
        Some(Meta::new(1, total, total)),
    )
}

pub async fn compatible_motherboards(
    state: &AppState,
    cpu_id: Uuid,
) -> AppResult<ApiResponse<ComponentList>> {
    let cpu = anchor(state, cpu_id, ComponentKind::Cpu).await?;
    let ComponentSpecs::Cpu(cpu) = &cpu.specs else {
        return Err(AppError::bad_request("component is not a cpu"));
    };
    let boards = load_components_of_kind(&state.orm, ComponentKind::Motherboard).await?;
    Ok(lookup_response(compatibility::compatible_motherboards(
        cpu, &boards,
    )))
}

pub async fn compatible_rams(
    state: &AppState,
    motherboard_id: Uuid,
) -> AppResult<ApiResponse<ComponentList>> {
    let board = anchor(state, motherboard_id, ComponentKind::Motherboard).await?;
    let ComponentSpecs::Motherboard(board) = &board.specs else {
        return Err(AppError::bad_request("component is not a motherboard"));
    };
    let modules = load_components_of_kind(&state.orm, ComponentKind::Ram).await?;
    Ok(lookup_response(compatibility::compatible_rams(
        board, &modules,
    )))
}

pub async fn compatible_cpus(
    state: &AppState,
    motherboard_id: Uuid,
) -> AppResult<ApiResponse<ComponentList>> {
    let board = anchor(state, motherboard_id, ComponentKind::Motherboard).await?;
    let ComponentSpecs::Motherboard(board) = &board.specs else {
        return Err(AppError::bad_request("component is not a motherboard"));
    };
    let cpus = load_components_of_kind(&state.orm, ComponentKind::Cpu).await?;
    Ok(lookup_response(compatibility::compatible_cpus(board, &cpus)))
}

fn detail(build: BuildModel, selection: Selection) -> BuildDetail {
    let issues = issues_of(&compatibility::check(&selection));
    BuildDetail {
        build: build_from_entity(build),
        compatible: issues.is_empty(),
        issues,
        components: selection.into(),
    }
}

pub(crate) fn build_from_entity(model: BuildModel) -> Build {
    Build {
        id: model.id,
        user_id: model.user_id,
        name: model.name,
        cpu_id: model.cpu_id,
        gpu_id: model.gpu_id,
        motherboard_id: model.motherboard_id,
        ram_id: model.ram_id,
        storage_id: model.storage_id,
        psu_id: model.psu_id,
        case_id: model.case_id,
        cooler_id: model.cooler_id,
        total_price: model.total_price,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_dropped() {
        assert_eq!(normalized_name(Some("  ".into())), None);
        assert_eq!(normalized_name(Some(" Gaming ".into())), Some("Gaming".into()));
        assert_eq!(normalized_name(None), None);
    }
}
