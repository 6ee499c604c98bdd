mod common;

use pc_storefront::{
    dto::{
        builds::BuildRequest,
        cart::AddToCartRequest,
        orders::{CheckoutRequest, UpdateOrderStatusRequest},
        returns::{CreateReturnRequest, ProcessReturnRequest},
        wallet::{ConfirmTopUpRequest, TopUpRequest},
    },
    error::AppError,
    models::{
        ComponentSpecs, CpuSpecs, DeliveryOption, GpuSpecs, MotherboardSpecs, PaymentMethod,
        PsuSpecs, RamSpecs, ReturnStatus,
    },
    routes::params::{OrderListQuery, PageQuery},
    services::{
        build_service, cart_service, catalog_service, order_service, return_service,
        staff_service, wallet_service,
    },
};

use common::{create_component, create_user, database_url, setup_state};

#[tokio::test]
async fn build_cart_checkout_return_and_topup_flow() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let (state, mailer) = setup_state(&url).await?;

    let staff = create_user(&state, "staff", "staff").await?;
    let customer = create_user(&state, "buyer", "user").await?;

    let cpu = create_component(
        &state,
        &staff,
        "AMD",
        "Ryzen 7 7700X",
        32_000,
        ComponentSpecs::Cpu(CpuSpecs {
            cores: 8,
            frequency_ghz: 4.5,
            tdp_w: 105,
            socket: "AM5".into(),
            integrated_graphics: true,
        }),
    )
    .await?;
    let board = create_component(
        &state,
        &staff,
        "ASUS",
        "TUF B650-Plus",
        19_000,
        ComponentSpecs::Motherboard(MotherboardSpecs {
            form_factor: "ATX".into(),
            socket: "AM5".into(),
            chipset: "B650".into(),
            ram_slots: 4,
            ram_type: "DDR5".into(),
            max_ram_frequency_mhz: 6400,
            expansion_slots: String::new(),
            wifi: true,
        }),
    )
    .await?;
    let ddr5 = create_component(
        &state,
        &staff,
        "Kingston",
        "Fury Beast 32GB",
        10_000,
        ComponentSpecs::Ram(RamSpecs {
            capacity_gb: 32,
            frequency_mhz: 6000,
            memory_type: "DDR5".into(),
            rgb: false,
        }),
    )
    .await?;
    let ddr4 = create_component(
        &state,
        &staff,
        "Crucial",
        "Ballistix 16GB",
        5_000,
        ComponentSpecs::Ram(RamSpecs {
            capacity_gb: 16,
            frequency_mhz: 3200,
            memory_type: "DDR4".into(),
            rgb: false,
        }),
    )
    .await?;
    let gpu = create_component(
        &state,
        &staff,
        "NVIDIA",
        "RTX 4070",
        60_000,
        ComponentSpecs::Gpu(GpuSpecs {
            memory_gb: 12,
            frequency_ghz: 2.5,
            tdp_w: 200,
            interface: "PCIe x16".into(),
            ray_tracing: true,
        }),
    )
    .await?;
    let psu = create_component(
        &state,
        &staff,
        "Seasonic",
        "Focus GX-750",
        12_000,
        ComponentSpecs::Psu(PsuSpecs {
            power_w: 750,
            certification: "80+ Gold".into(),
            modular: true,
        }),
    )
    .await?;
    assert_eq!(cpu.stock, Some(10));

    // Customers cannot touch the catalog
    let denied = catalog_service::delete_component(&state, &customer, cpu.id).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    // Incompatible RAM is reported on preview and rejected on save
    let incompatible = BuildRequest {
        name: Some("budget".into()),
        cpu_id: Some(cpu.id),
        motherboard_id: Some(board.id),
        ram_id: Some(ddr4.id),
        ..Default::default()
    };
    let preview = build_service::preview_build(&state, incompatible.clone())
        .await?
        .data
        .expect("preview");
    assert!(!preview.compatible);
    assert_eq!(preview.issues.len(), 1);
    assert_eq!(preview.issues[0].code, "ram_motherboard");
    let rejected = build_service::create_build(&state, &customer, incompatible).await;
    assert!(matches!(rejected, Err(AppError::BadRequest(_))));

    // A component in the wrong slot is a bad request
    let wrong_slot = build_service::preview_build(
        &state,
        BuildRequest {
            cpu_id: Some(board.id),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(wrong_slot, Err(AppError::BadRequest(_))));

    let build = build_service::create_build(
        &state,
        &customer,
        BuildRequest {
            name: Some("gaming".into()),
            cpu_id: Some(cpu.id),
            motherboard_id: Some(board.id),
            ram_id: Some(ddr5.id),
            gpu_id: Some(gpu.id),
            psu_id: Some(psu.id),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("build");
    assert!(build.compatible);
    let build_price = 32_000 + 19_000 + 10_000 + 60_000 + 12_000;
    assert_eq!(build.build.total_price, build_price);

    let compatible_rams = build_service::compatible_rams(&state, board.id)
        .await?
        .data
        .expect("rams");
    assert_eq!(compatible_rams.items.len(), 1);
    assert_eq!(compatible_rams.items[0].id, ddr5.id);

    // Cart: repeated adds accumulate, builds are separate lines
    for quantity in [2, 1] {
        cart_service::add_to_cart(
            &state,
            &customer,
            AddToCartRequest {
                component_id: Some(cpu.id),
                build_id: None,
                quantity,
            },
        )
        .await?;
    }
    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            component_id: None,
            build_id: Some(build.build.id),
            quantity: 1,
        },
    )
    .await?;
    let both = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            component_id: Some(cpu.id),
            build_id: Some(build.build.id),
            quantity: 1,
        },
    )
    .await;
    assert!(matches!(both, Err(AppError::BadRequest(_))));

    let cart = cart_service::list_cart(&state, &customer)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 2);
    let cpu_line = cart
        .items
        .iter()
        .find(|line| line.component_id == Some(cpu.id))
        .expect("cpu line");
    assert_eq!(cpu_line.quantity, 3);
    let expected_total = 3 * 32_000 + build_price;
    assert_eq!(cart.total_price, expected_total);

    // Courier delivery needs an address
    let missing_address = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            email: "buyer@example.com".into(),
            delivery_option: DeliveryOption::Courier,
            payment_method: PaymentMethod::Card,
            address: None,
        },
    )
    .await;
    assert!(matches!(missing_address, Err(AppError::BadRequest(_))));

    let placed = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            email: "buyer@example.com".into(),
            delivery_option: DeliveryOption::Courier,
            payment_method: PaymentMethod::Card,
            address: Some("1 Main St".into()),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(placed.order.status, "pending");
    assert_eq!(placed.order.total_amount, expected_total);
    assert_eq!(placed.order.track_number.len(), 8);
    assert_eq!(placed.items.len(), 2);

    // Component lines leave stock, build lines do not
    let cpu_after = catalog_service::get_component(&state, cpu.id)
        .await?
        .data
        .expect("cpu");
    assert_eq!(cpu_after.stock, Some(7));
    let gpu_after = catalog_service::get_component(&state, gpu.id)
        .await?
        .data
        .expect("gpu");
    assert_eq!(gpu_after.stock, Some(10));

    let cart = cart_service::list_cart(&state, &customer)
        .await?
        .data
        .expect("cart");
    assert!(cart.items.is_empty());
    let empty = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            email: "buyer@example.com".into(),
            delivery_option: DeliveryOption::Pickup,
            payment_method: PaymentMethod::Cash,
            address: None,
        },
    )
    .await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    assert!(
        mailer
            .sent()
            .iter()
            .any(|m| m.to == "buyer@example.com" && m.body.contains(&placed.order.track_number))
    );

    let tracked = order_service::track_order(
        &state,
        &customer,
        &placed.order.track_number.to_lowercase(),
    )
    .await?
    .data
    .expect("tracked");
    assert_eq!(tracked.order.id, placed.order.id);

    // Staff status changes respect the delivery option
    let pickup_only = staff_service::update_order_status(
        &state,
        &staff,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: "delivered".into(),
        },
    )
    .await;
    assert!(matches!(pickup_only, Err(AppError::BadRequest(_))));

    let sent_before = mailer.sent().len();
    let delivering = staff_service::update_order_status(
        &state,
        &staff,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: "delivering".into(),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(delivering.status, "delivering");
    let sent = mailer.sent();
    assert_eq!(sent.len(), sent_before + 1);
    assert!(sent[sent.len() - 1].subject.contains("within 3 hours"));

    let not_staff = staff_service::update_order_status(
        &state,
        &customer,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: "confirmed".into(),
        },
    )
    .await;
    assert!(matches!(not_staff, Err(AppError::Forbidden)));

    // Return the CPUs and refund them to the wallet
    let cpu_item = placed
        .items
        .iter()
        .find(|item| item.component_id == Some(cpu.id))
        .expect("cpu item");
    let request = return_service::create_return(
        &state,
        &customer,
        CreateReturnRequest {
            order_item_id: cpu_item.id,
            reason: "changed my mind".into(),
        },
    )
    .await?
    .data
    .expect("return");
    assert_eq!(request.status, "pending");

    let second = return_service::create_return(
        &state,
        &customer,
        CreateReturnRequest {
            order_item_id: cpu_item.id,
            reason: "again".into(),
        },
    )
    .await;
    assert!(matches!(second, Err(AppError::BadRequest(_))));

    let active = staff_service::list_active_orders(&state, &staff, Default::default())
        .await?
        .data
        .expect("active orders");
    assert_eq!(active.pending_returns, 1);
    assert_eq!(active.items.len(), 1);
    assert_eq!(active.items[0].username, "buyer");
    assert!(active.items[0].return_request.is_some());

    for _ in 0..2 {
        return_service::process_return(
            &state,
            &staff,
            request.id,
            ProcessReturnRequest {
                status: ReturnStatus::Refunded,
                comment: Some("accepted".into()),
            },
        )
        .await?;
    }
    let wallet = wallet_service::get_wallet(&state, &customer, PageQuery::default())
        .await?
        .data
        .expect("wallet");
    assert_eq!(wallet.balance.balance, 3 * 32_000);
    assert_eq!(wallet.transactions.len(), 1);
    assert_eq!(wallet.transactions[0].transaction_type, "refund");

    // Top-up is credited only with the emailed code
    wallet_service::request_topup(
        &state,
        &customer,
        TopUpRequest {
            amount: 50_000,
            email: "buyer@example.com".into(),
        },
    )
    .await?;
    let code_mail = mailer
        .sent()
        .into_iter()
        .rev()
        .find(|m| m.subject == "Confirm balance top-up")
        .expect("top-up email");
    let code = code_mail.body[code_mail.body.len() - 6..].to_string();
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    let wrong = wallet_service::confirm_topup(
        &state,
        &customer,
        ConfirmTopUpRequest {
            code: if code == "000000" { "111111" } else { "000000" }.into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::BadRequest(_))));

    let balance = wallet_service::confirm_topup(
        &state,
        &customer,
        ConfirmTopUpRequest { code: code.clone() },
    )
    .await?
    .data
    .expect("balance");
    assert_eq!(balance.balance, 3 * 32_000 + 50_000);

    // A confirmed code cannot be used twice
    let reused = wallet_service::confirm_topup(&state, &customer, ConfirmTopUpRequest { code }).await;
    assert!(matches!(reused, Err(AppError::BadRequest(_))));

    let huge_topup = wallet_service::request_topup(
        &state,
        &customer,
        TopUpRequest {
            amount: i64::MAX,
            email: "buyer@example.com".into(),
        },
    )
    .await;
    assert!(matches!(huge_topup, Err(AppError::BadRequest(_))));

    // Paying from the wallet debits it, overspending is refused
    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            component_id: Some(gpu.id),
            build_id: None,
            quantity: 2,
        },
    )
    .await?;
    let paid = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            email: "buyer@example.com".into(),
            delivery_option: DeliveryOption::Pickup,
            payment_method: PaymentMethod::Balance,
            address: None,
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(paid.order.total_amount, 120_000);
    let wallet = wallet_service::get_wallet(&state, &customer, PageQuery::default())
        .await?
        .data
        .expect("wallet");
    assert_eq!(wallet.balance.balance, 3 * 32_000 + 50_000 - 120_000);

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            component_id: Some(gpu.id),
            build_id: None,
            quantity: 1,
        },
    )
    .await?;
    let overspent = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            email: "buyer@example.com".into(),
            delivery_option: DeliveryOption::Pickup,
            payment_method: PaymentMethod::Balance,
            address: None,
        },
    )
    .await;
    assert!(matches!(overspent, Err(AppError::BadRequest(_))));
    // The failed checkout rolled back, so the cart is still there
    let cart = cart_service::list_cart(&state, &customer)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 1);

    // Completed orders drop out of the default listing
    staff_service::complete_order(&state, &staff, placed.order.id).await?;
    let open = order_service::list_orders(&state, &customer, OrderListQuery::default())
        .await?
        .data
        .expect("orders");
    assert_eq!(open.items.len(), 1);
    assert_eq!(open.items[0].id, paid.order.id);
    let history = staff_service::list_order_history(&state, &staff, Default::default())
        .await?
        .data
        .expect("history");
    assert_eq!(history.items.len(), 1);
    assert_eq!(history.items[0].order.id, placed.order.id);

    // Cart quantities that would overflow are refused
    let overflow = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            component_id: Some(gpu.id),
            build_id: None,
            quantity: i32::MAX,
        },
    )
    .await;
    assert!(matches!(overflow, Err(AppError::BadRequest(_))));

    // Ordering more than is on hand empties the stock instead of going negative
    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            component_id: Some(ddr4.id),
            build_id: None,
            quantity: 15,
        },
    )
    .await?;
    order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            email: "buyer@example.com".into(),
            delivery_option: DeliveryOption::Pickup,
            payment_method: PaymentMethod::Card,
            address: None,
        },
    )
    .await?;
    let ddr4_after = catalog_service::get_component(&state, ddr4.id)
        .await?
        .data
        .expect("ddr4");
    assert_eq!(ddr4_after.stock, Some(0));

    Ok(())
}
