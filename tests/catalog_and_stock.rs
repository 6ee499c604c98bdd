mod common;

use pc_storefront::{
    dto::{
        auth::{LoginRequest, PasswordResetRequest, RegisterRequest},
        catalog::{CreateReviewRequest, UpdateComponentRequest},
        stock::StockAdjustRequest,
    },
    error::AppError,
    models::{ComponentKind, ComponentSpecs, CpuSpecs, MotherboardSpecs, RamSpecs},
    routes::params::{ComponentQuery, ComponentSortBy, LowStockQuery, PageQuery, SortOrder, StockQuery},
    services::{auth_service, catalog_service, stock_service},
};

use common::{create_component, create_user, database_url, setup_state};

fn cpu(socket: &str) -> ComponentSpecs {
    ComponentSpecs::Cpu(CpuSpecs {
        cores: 6,
        frequency_ghz: 3.8,
        tdp_w: 65,
        socket: socket.into(),
        integrated_graphics: false,
    })
}

#[tokio::test]
async fn catalog_reviews_stock_and_accounts() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let (state, mailer) = setup_state(&url).await?;
    let staff = create_user(&state, "keeper", "staff").await?;
    let customer = create_user(&state, "reader", "user").await?;

    let am5 = create_component(&state, &staff, "AMD", "Ryzen 5 7600", 21_000, cpu("AM5")).await?;
    let lga = create_component(&state, &staff, "Intel", "Core i5-13400F", 19_000, cpu("LGA1700")).await?;
    create_component(
        &state,
        &staff,
        "MSI",
        "B650 Tomahawk",
        22_000,
        ComponentSpecs::Motherboard(MotherboardSpecs {
            form_factor: "ATX".into(),
            socket: "AM5".into(),
            chipset: "B650".into(),
            ram_slots: 4,
            ram_type: "DDR5".into(),
            max_ram_frequency_mhz: 6400,
            expansion_slots: String::new(),
            wifi: false,
        }),
    )
    .await?;
    create_component(
        &state,
        &staff,
        "G.Skill",
        "Trident Z5",
        12_000,
        ComponentSpecs::Ram(RamSpecs {
            capacity_gb: 32,
            frequency_mhz: 6000,
            memory_type: "DDR5".into(),
            rgb: true,
        }),
    )
    .await?;

    // Filters
    let cpus = catalog_service::list_components(
        &state,
        ComponentQuery {
            kind: Some(ComponentKind::Cpu),
            sort_by: Some(ComponentSortBy::Price),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(cpus.meta.as_ref().and_then(|m| m.total), Some(2));
    let cpus = cpus.data.expect("cpus");
    assert_eq!(cpus.items[0].id, lga.id);
    assert_eq!(cpus.items[1].id, am5.id);

    let am5_parts = catalog_service::list_components(
        &state,
        ComponentQuery {
            socket: Some("AM5".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("am5");
    assert_eq!(am5_parts.items.len(), 2);

    let ddr5 = catalog_service::list_components(
        &state,
        ComponentQuery {
            memory_type: Some("ddr5".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("ddr5");
    assert_eq!(ddr5.items.len(), 2);

    let searched = catalog_service::list_components(
        &state,
        ComponentQuery {
            q: Some("intel".into()),
            max_price: Some(20_000),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("search");
    assert_eq!(searched.items.len(), 1);
    assert_eq!(searched.items[0].id, lga.id);

    // A CPU cannot be turned into a motherboard
    let kind_change = catalog_service::update_component(
        &state,
        &staff,
        am5.id,
        UpdateComponentRequest {
            specs: Some(ComponentSpecs::Ram(RamSpecs {
                capacity_gb: 8,
                frequency_mhz: 3200,
                memory_type: "DDR4".into(),
                rgb: false,
            })),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(kind_change, Err(AppError::BadRequest(_))));
    let repriced = catalog_service::update_component(
        &state,
        &staff,
        am5.id,
        UpdateComponentRequest {
            price: Some(20_500),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("component");
    assert_eq!(repriced.price, 20_500);
    assert_eq!(repriced.model, "Ryzen 5 7600");

    // Reviews
    let bad_rating = catalog_service::create_review(
        &state,
        &customer,
        am5.id,
        CreateReviewRequest {
            text: "great".into(),
            rating: 6,
        },
    )
    .await;
    assert!(matches!(bad_rating, Err(AppError::BadRequest(_))));
    catalog_service::create_review(
        &state,
        &customer,
        am5.id,
        CreateReviewRequest {
            text: "Runs cool".into(),
            rating: 5,
        },
    )
    .await?;
    let reviews = catalog_service::list_reviews(&state, am5.id, PageQuery::default())
        .await?
        .data
        .expect("reviews");
    assert_eq!(reviews.items.len(), 1);
    assert_eq!(reviews.items[0].rating, 5);

    // Stock
    let stock = stock_service::list_stock(&state, &staff, StockQuery::default())
        .await?
        .data
        .expect("stock");
    assert_eq!(stock.items.len(), 4);
    assert_eq!(stock.out_of_stock_count, 0);
    let record = stock
        .items
        .iter()
        .find(|s| s.component_id == lga.id)
        .expect("stock record");

    let reduced = stock_service::reduce(
        &state,
        &staff,
        record.id,
        StockAdjustRequest { amount: Some(25) },
    )
    .await?
    .data
    .expect("reduced");
    assert_eq!(reduced.quantity, 0);

    let low = stock_service::list_low_stock(&state, &staff, LowStockQuery::default())
        .await?
        .data
        .expect("low");
    assert_eq!(low.items.len(), 1);
    assert_eq!(low.out_of_stock_count, 1);
    assert_eq!(low.items[0].component_id, lga.id);

    let replenished =
        stock_service::replenish(&state, &staff, record.id, StockAdjustRequest::default())
            .await?
            .data
            .expect("replenished");
    assert_eq!(replenished.quantity, 10);

    let zero = stock_service::replenish(
        &state,
        &staff,
        record.id,
        StockAdjustRequest { amount: Some(0) },
    )
    .await;
    assert!(matches!(zero, Err(AppError::BadRequest(_))));
    let customer_view = stock_service::list_stock(&state, &customer, StockQuery::default()).await;
    assert!(matches!(customer_view, Err(AppError::Forbidden)));

    // Accounts
    // SAFETY: this test binary runs a single test and sets the variable before any reads.
    unsafe { std::env::set_var("JWT_SECRET", "integration-secret") };

    let short = auth_service::register_user(
        &state,
        RegisterRequest {
            username: "newbie".into(),
            email: "Newbie@Example.com".into(),
            password: "short".into(),
        },
    )
    .await;
    assert!(matches!(short, Err(AppError::BadRequest(_))));

    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            username: "newbie".into(),
            email: "Newbie@Example.com".into(),
            password: "long enough".into(),
        },
    )
    .await?
    .data
    .expect("user");
    assert_eq!(registered.email, "newbie@example.com");
    assert_eq!(registered.role, "user");

    let duplicate = auth_service::register_user(
        &state,
        RegisterRequest {
            username: "newbie".into(),
            email: "other@example.com".into(),
            password: "long enough".into(),
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let token = auth_service::login_user(
        &state,
        LoginRequest {
            login: "newbie".into(),
            password: "long enough".into(),
        },
    )
    .await?
    .data
    .expect("token");
    assert!(token.token.starts_with("Bearer "));

    let wrong = auth_service::login_user(
        &state,
        LoginRequest {
            login: "newbie@example.com".into(),
            password: "not it at all".into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::BadRequest(_))));

    let unknown = auth_service::reset_password(
        &state,
        PasswordResetRequest {
            email: "nobody@example.com".into(),
        },
    )
    .await;
    assert!(matches!(unknown, Err(AppError::NotFound)));

    auth_service::reset_password(
        &state,
        PasswordResetRequest {
            email: "newbie@example.com".into(),
        },
    )
    .await?;
    let reset_mail = mailer
        .sent()
        .into_iter()
        .rev()
        .find(|m| m.subject == "Password reset")
        .expect("reset email");
    let new_password = reset_mail
        .body
        .lines()
        .find_map(|line| line.strip_prefix("Your new password is: "))
        .expect("password line")
        .to_string();

    let relogin = auth_service::login_user(
        &state,
        LoginRequest {
            login: "newbie".into(),
            password: new_password,
        },
    )
    .await;
    assert!(relogin.is_ok());

    Ok(())
}
