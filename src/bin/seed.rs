use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use pc_storefront::{
    config::AppConfig,
    db::{create_orm_conn, pg_pool, run_migrations},
    models::{
        CaseSpecs, ComponentKind, ComponentSpecs, CoolerSpecs, CoolerType, CpuSpecs, GpuSpecs,
        MotherboardSpecs, PsuSpecs, ROLE_STAFF, ROLE_USER, RamSpecs, StorageSpecs,
    },
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let pool = pg_pool(&orm);

    let staff_id = ensure_user(pool, "staff", "staff@example.com", "staff12345", ROLE_STAFF).await?;
    let user_id = ensure_user(pool, "customer", "user@example.com", "user12345", ROLE_USER).await?;
    seed_catalog(pool, config.stock_initial_quantity).await?;

    println!("Seed completed. Staff ID: {staff_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_manufacturer(
    pool: &sqlx::PgPool,
    name: &str,
    kind: ComponentKind,
) -> anyhow::Result<Uuid> {
    sqlx::query(
        r#"
        INSERT INTO manufacturers (id, name, component_kind)
        VALUES ($1, $2, $3)
        ON CONFLICT (name, COALESCE(component_kind, '')) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(kind.as_str())
    .execute(pool)
    .await?;

    let (id,): (Uuid,) =
        sqlx::query_as("SELECT id FROM manufacturers WHERE name = $1 AND component_kind = $2")
            .bind(name)
            .bind(kind.as_str())
            .fetch_one(pool)
            .await?;
    Ok(id)
}

async fn ensure_component(
    pool: &sqlx::PgPool,
    manufacturer: &str,
    model: &str,
    price: i64,
    specs: ComponentSpecs,
    quantity: i32,
) -> anyhow::Result<()> {
    let kind = specs.kind();
    let manufacturer_id = ensure_manufacturer(pool, manufacturer, kind).await?;

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM components WHERE manufacturer_id = $1 AND model = $2")
            .bind(manufacturer_id)
            .bind(model)
            .fetch_optional(pool)
            .await?;
    let component_id = match existing {
        Some((id,)) => id,
        None => {
            let (id,): (Uuid,) = sqlx::query_as(
                r#"
                INSERT INTO components (id, kind, manufacturer_id, model, price, specs)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(kind.as_str())
            .bind(manufacturer_id)
            .bind(model)
            .bind(price)
            .bind(serde_json::to_value(&specs)?)
            .fetch_one(pool)
            .await?;
            id
        }
    };

    sqlx::query(
        r#"
        INSERT INTO stock (id, component_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (component_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(component_id)
    .bind(quantity)
    .execute(pool)
    .await?;

    Ok(())
}

async fn seed_catalog(pool: &sqlx::PgPool, quantity: i32) -> anyhow::Result<()> {
    let catalog: Vec<(&str, &str, i64, ComponentSpecs)> = vec![
        (
            "AMD",
            "Ryzen 7 7800X3D",
            3_899_000,
            ComponentSpecs::Cpu(CpuSpecs {
                cores: 8,
                frequency_ghz: 4.2,
                tdp_w: 120,
                socket: "AM5".into(),
                integrated_graphics: true,
            }),
        ),
        (
            "Intel",
            "Core i5-12400F",
            1_299_000,
            ComponentSpecs::Cpu(CpuSpecs {
                cores: 6,
                frequency_ghz: 2.5,
                tdp_w: 65,
                socket: "LGA1700".into(),
                integrated_graphics: false,
            }),
        ),
        (
            "ASUS",
            "TUF Gaming B650-Plus",
            1_999_000,
            ComponentSpecs::Motherboard(MotherboardSpecs {
                form_factor: "ATX".into(),
                socket: "AM5".into(),
                chipset: "B650".into(),
                ram_slots: 4,
                ram_type: "DDR5".into(),
                max_ram_frequency_mhz: 6400,
                expansion_slots: "2x PCIe x16, 1x PCIe x1".into(),
                wifi: true,
            }),
        ),
        (
            "MSI",
            "PRO B660M-A DDR4",
            1_199_000,
            ComponentSpecs::Motherboard(MotherboardSpecs {
                form_factor: "Micro-ATX".into(),
                socket: "LGA1700".into(),
                chipset: "B660".into(),
                ram_slots: 4,
                ram_type: "DDR4".into(),
                max_ram_frequency_mhz: 4800,
                expansion_slots: "1x PCIe x16, 1x PCIe x1".into(),
                wifi: false,
            }),
        ),
        (
            "Kingston",
            "FURY Beast 32GB DDR5-6000",
            1_049_000,
            ComponentSpecs::Ram(RamSpecs {
                capacity_gb: 32,
                frequency_mhz: 6000,
                memory_type: "DDR5".into(),
                rgb: false,
            }),
        ),
        (
            "Corsair",
            "Vengeance LPX 16GB DDR4-3200",
            449_000,
            ComponentSpecs::Ram(RamSpecs {
                capacity_gb: 16,
                frequency_mhz: 3200,
                memory_type: "DDR4".into(),
                rgb: false,
            }),
        ),
        (
            "NVIDIA",
            "GeForce RTX 4070",
            5_999_000,
            ComponentSpecs::Gpu(GpuSpecs {
                memory_gb: 12,
                frequency_ghz: 2.48,
                tdp_w: 200,
                interface: "PCIe 4.0 x16".into(),
                ray_tracing: true,
            }),
        ),
        (
            "Samsung",
            "990 PRO 1TB",
            999_000,
            ComponentSpecs::Storage(StorageSpecs {
                capacity_gb: 1000,
                storage_type: "SSD".into(),
                interface: "PCIe 4.0 x4".into(),
                read_speed_mbps: 7450,
                write_speed_mbps: 6900,
                nvme: true,
            }),
        ),
        (
            "be quiet!",
            "Pure Power 12 M 750W",
            1_099_000,
            ComponentSpecs::Psu(PsuSpecs {
                power_w: 750,
                certification: "80+ Gold".into(),
                modular: true,
            }),
        ),
        (
            "Fractal Design",
            "North",
            1_399_000,
            ComponentSpecs::Case(CaseSpecs {
                form_factor: "Mid Tower".into(),
                dimensions: "469 x 215 x 447 mm".into(),
                supported_motherboard_form_factors: vec![
                    "ATX".into(),
                    "Micro-ATX".into(),
                    "Mini-ITX".into(),
                ],
                side_panel_window: true,
            }),
        ),
        (
            "Noctua",
            "NH-D15",
            1_099_000,
            ComponentSpecs::Cooler(CoolerSpecs {
                cooler_type: CoolerType::Air,
                fan_size_mm: Some(140),
                radiator_size: None,
                rgb: false,
            }),
        ),
    ];

    for (manufacturer, model, price, specs) in catalog {
        ensure_component(pool, manufacturer, model, price, specs, quantity).await?;
    }

    println!("Seeded catalog");
    Ok(())
}
