#![allow(dead_code)]

use std::sync::Arc;

use pc_storefront::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::catalog::{CreateComponentRequest, CreateManufacturerRequest},
    entity::users::ActiveModel as UserActive,
    mailer::MemoryMailer,
    middleware::auth::AuthUser,
    models::{Component, ComponentSpecs},
    services::catalog_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

/// Database URL for integration tests, `None` when the environment has none.
pub fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            None
        }
    }
}

pub async fn setup_state(database_url: &str) -> anyhow::Result<(AppState, MemoryMailer)> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE balance_topups, transactions, balances, return_requests, order_items, orders, cart_items, builds, reviews, stock, components, manufacturers, audit_logs, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    let mailer = MemoryMailer::new();
    let state = AppState::new(
        orm,
        AppConfig::with_database_url(database_url),
        Arc::new(mailer.clone()),
    );
    Ok((state, mailer))
}

pub async fn create_user(state: &AppState, username: &str, role: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(format!("{username}@example.com")),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn create_component(
    state: &AppState,
    staff: &AuthUser,
    manufacturer: &str,
    model: &str,
    price: i64,
    specs: ComponentSpecs,
) -> anyhow::Result<Component> {
    let manufacturer = catalog_service::create_manufacturer(
        state,
        staff,
        CreateManufacturerRequest {
            name: format!("{manufacturer} {}", Uuid::new_v4().simple()),
            component_kind: Some(specs.kind()),
        },
    )
    .await?
    .data
    .expect("manufacturer");

    let component = catalog_service::create_component(
        state,
        staff,
        CreateComponentRequest {
            manufacturer_id: manufacturer.id,
            model: model.to_string(),
            price,
            image_url: None,
            specs,
        },
    )
    .await?
    .data
    .expect("component");
    Ok(component)
}
