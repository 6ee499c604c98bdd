use chrono::Utc;
use pc_storefront::{
    compatibility::{self, CompatibilityIssue, Incompatibility, Selection},
    models::{
        Component, ComponentSpecs, CoolerSpecs, CoolerType, CpuSpecs, GpuSpecs, MotherboardSpecs,
        PsuSpecs, RamSpecs,
    },
};
use uuid::Uuid;

fn component(model: &str, price: i64, specs: ComponentSpecs) -> Component {
    Component {
        id: Uuid::new_v4(),
        kind: specs.kind(),
        manufacturer_id: Uuid::new_v4(),
        manufacturer: "Acme".into(),
        model: model.into(),
        price,
        image_url: None,
        specs,
        stock: Some(10),
        created_at: Utc::now(),
    }
}

fn cpu(socket: &str) -> Component {
    component(
        &format!("CPU {socket}"),
        30_000,
        ComponentSpecs::Cpu(CpuSpecs {
            cores: 8,
            frequency_ghz: 4.2,
            tdp_w: 105,
            socket: socket.into(),
            integrated_graphics: false,
        }),
    )
}

fn board(socket: &str, ram_type: &str, max_freq: i32) -> Component {
    component(
        &format!("Board {socket}"),
        20_000,
        ComponentSpecs::Motherboard(MotherboardSpecs {
            form_factor: "ATX".into(),
            socket: socket.into(),
            chipset: "X".into(),
            ram_slots: 4,
            ram_type: ram_type.into(),
            max_ram_frequency_mhz: max_freq,
            expansion_slots: String::new(),
            wifi: true,
        }),
    )
}

fn ram(memory_type: &str, freq: i32) -> Component {
    component(
        &format!("{memory_type}-{freq}"),
        9_000,
        ComponentSpecs::Ram(RamSpecs {
            capacity_gb: 32,
            frequency_mhz: freq,
            memory_type: memory_type.into(),
            rgb: false,
        }),
    )
}

fn gpu(tdp: i32) -> Component {
    component(
        "GPU",
        60_000,
        ComponentSpecs::Gpu(GpuSpecs {
            memory_gb: 12,
            frequency_ghz: 2.5,
            tdp_w: tdp,
            interface: "PCIe x16".into(),
            ray_tracing: true,
        }),
    )
}

fn psu(power: i32) -> Component {
    component(
        &format!("PSU {power}"),
        11_000,
        ComponentSpecs::Psu(PsuSpecs {
            power_w: power,
            certification: "80+ Gold".into(),
            modular: true,
        }),
    )
}

fn cooler() -> Component {
    component(
        "Tower",
        4_000,
        ComponentSpecs::Cooler(CoolerSpecs {
            cooler_type: CoolerType::Air,
            fan_size_mm: Some(120),
            radiator_size: None,
            rgb: false,
        }),
    )
}

#[test]
fn matching_parts_have_no_issues() {
    let selection = Selection {
        cpu: Some(cpu("AM5")),
        motherboard: Some(board("AM5", "DDR5", 6400)),
        ram: Some(ram("DDR5", 6000)),
        gpu: Some(gpu(200)),
        psu: Some(psu(750)),
        cooler: Some(cooler()),
        ..Default::default()
    };

    assert!(compatibility::check(&selection).is_empty());
    assert_eq!(
        selection.total_price(),
        30_000 + 20_000 + 9_000 + 60_000 + 11_000 + 4_000
    );
}

#[test]
fn every_failing_pair_is_reported() {
    let selection = Selection {
        cpu: Some(cpu("LGA1700")),
        motherboard: Some(board("AM5", "DDR5", 6400)),
        ram: Some(ram("DDR4", 3200)),
        gpu: Some(gpu(320)),
        psu: Some(psu(300)),
        ..Default::default()
    };

    let codes: Vec<&str> = compatibility::check(&selection)
        .iter()
        .map(Incompatibility::code)
        .collect();
    assert_eq!(codes, ["cpu_motherboard", "ram_motherboard", "psu_gpu"]);
}

#[test]
fn ram_faster_than_the_board_allows_is_rejected() {
    let selection = Selection {
        motherboard: Some(board("AM5", "DDR5", 5600)),
        ram: Some(ram("DDR5", 6000)),
        ..Default::default()
    };

    let issues = compatibility::check(&selection);
    assert_eq!(issues.len(), 1);
    let issue = CompatibilityIssue::from(&issues[0]);
    assert_eq!(issue.code, "ram_motherboard");
    assert!(issue.message.contains("6000"));
}

#[test]
fn psu_exactly_at_gpu_tdp_is_enough() {
    let selection = Selection {
        gpu: Some(gpu(450)),
        psu: Some(psu(450)),
        ..Default::default()
    };
    assert!(compatibility::check(&selection).is_empty());
}

#[test]
fn pairs_with_a_missing_side_are_skipped() {
    let selection = Selection {
        cpu: Some(cpu("AM4")),
        ram: Some(ram("DDR4", 3200)),
        gpu: Some(gpu(320)),
        ..Default::default()
    };
    assert!(compatibility::check(&selection).is_empty());
    assert!(!selection.is_empty());
    assert!(Selection::default().is_empty());
    assert_eq!(Selection::default().total_price(), 0);
}

#[test]
fn lookups_filter_candidates_of_the_other_kind() {
    let am5 = cpu("AM5");
    let candidates = vec![
        board("AM5", "DDR5", 6400),
        board("LGA1700", "DDR4", 3600),
        ram("DDR5", 6000),
        ram("DDR4", 3200),
        ram("DDR5", 7200),
        cpu("AM5"),
        cpu("LGA1700"),
    ];

    let ComponentSpecs::Cpu(cpu_specs) = &am5.specs else {
        panic!("expected cpu specs");
    };
    let boards = compatibility::compatible_motherboards(cpu_specs, &candidates);
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].model, "Board AM5");

    let ComponentSpecs::Motherboard(board_specs) = &candidates[0].specs else {
        panic!("expected motherboard specs");
    };
    let rams: Vec<&str> = compatibility::compatible_rams(board_specs, &candidates)
        .into_iter()
        .map(|c| c.model.as_str())
        .collect();
    assert_eq!(rams, ["DDR5-6000"]);

    let cpus = compatibility::compatible_cpus(board_specs, &candidates);
    assert_eq!(cpus.len(), 1);
    assert_eq!(cpus[0].model, "CPU AM5");
}
