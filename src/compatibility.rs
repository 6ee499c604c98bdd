//! Pairwise compatibility predicates and price aggregation for builds.
//!
//! Everything here is pure: callers resolve components from the database
//! and hand them over as a [`Selection`].

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::{
    Component, ComponentKind, ComponentSpecs, CoolerSpecs, CpuSpecs, GpuSpecs, MotherboardSpecs,
    PsuSpecs, RamSpecs,
};

pub fn cpu_fits_motherboard(cpu: &CpuSpecs, board: &MotherboardSpecs) -> bool {
    cpu.socket == board.socket
}

pub fn ram_fits_motherboard(ram: &RamSpecs, board: &MotherboardSpecs) -> bool {
    ram.memory_type == board.ram_type && ram.frequency_mhz <= board.max_ram_frequency_mhz
}

pub fn psu_powers_gpu(psu: &PsuSpecs, gpu: &GpuSpecs) -> bool {
    gpu.tdp_w <= psu.power_w
}

// TODO: compare cooler TDP rating and socket support once coolers carry those attributes.
pub fn cooler_fits_cpu(_cooler: &CoolerSpecs, _cpu: &CpuSpecs) -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Incompatibility {
    #[error("CPU socket {cpu_socket} does not match motherboard socket {board_socket}")]
    CpuMotherboard {
        cpu_socket: String,
        board_socket: String,
    },

    #[error(
        "RAM {ram_type} {ram_frequency} MHz is not supported by the motherboard ({board_type}, up to {board_max_frequency} MHz)"
    )]
    RamMotherboard {
        ram_type: String,
        ram_frequency: i32,
        board_type: String,
        board_max_frequency: i32,
    },

    #[error("PSU power {psu_power} W is not enough for GPU TDP {gpu_tdp} W")]
    PsuGpu { psu_power: i32, gpu_tdp: i32 },

    #[error("cooler is not compatible with the CPU")]
    CoolerCpu,
}

impl Incompatibility {
    pub fn code(&self) -> &'static str {
        match self {
            Incompatibility::CpuMotherboard { .. } => "cpu_motherboard",
            Incompatibility::RamMotherboard { .. } => "ram_motherboard",
            Incompatibility::PsuGpu { .. } => "psu_gpu",
            Incompatibility::CoolerCpu => "cooler_cpu",
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompatibilityIssue {
    pub code: String,
    pub message: String,
}

impl From<&Incompatibility> for CompatibilityIssue {
    fn from(value: &Incompatibility) -> Self {
        Self {
            code: value.code().to_string(),
            message: value.to_string(),
        }
    }
}

/// At most one component per kind.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub cpu: Option<Component>,
    pub gpu: Option<Component>,
    pub motherboard: Option<Component>,
    pub ram: Option<Component>,
    pub storage: Option<Component>,
    pub psu: Option<Component>,
    pub case: Option<Component>,
    pub cooler: Option<Component>,
}

impl Selection {
    pub fn slot(&self, kind: ComponentKind) -> Option<&Component> {
        match kind {
            ComponentKind::Cpu => self.cpu.as_ref(),
            ComponentKind::Gpu => self.gpu.as_ref(),
            ComponentKind::Motherboard => self.motherboard.as_ref(),
            ComponentKind::Ram => self.ram.as_ref(),
            ComponentKind::Storage => self.storage.as_ref(),
            ComponentKind::Psu => self.psu.as_ref(),
            ComponentKind::Case => self.case.as_ref(),
            ComponentKind::Cooler => self.cooler.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, kind: ComponentKind) -> &mut Option<Component> {
        match kind {
            ComponentKind::Cpu => &mut self.cpu,
            ComponentKind::Gpu => &mut self.gpu,
            ComponentKind::Motherboard => &mut self.motherboard,
            ComponentKind::Ram => &mut self.ram,
            ComponentKind::Storage => &mut self.storage,
            ComponentKind::Psu => &mut self.psu,
            ComponentKind::Case => &mut self.case,
            ComponentKind::Cooler => &mut self.cooler,
        }
    }

    pub fn parts(&self) -> impl Iterator<Item = &Component> {
        ComponentKind::ALL
            .into_iter()
            .filter_map(move |kind| self.slot(kind))
    }

    pub fn is_empty(&self) -> bool {
        self.parts().next().is_none()
    }

    pub fn total_price(&self) -> i64 {
        self.parts().map(|c| c.price).sum()
    }
}

fn cpu(component: Option<&Component>) -> Option<&CpuSpecs> {
    match component.map(|c| &c.specs) {
        Some(ComponentSpecs::Cpu(specs)) => Some(specs),
        _ => None,
    }
}

fn motherboard(component: Option<&Component>) -> Option<&MotherboardSpecs> {
    match component.map(|c| &c.specs) {
        Some(ComponentSpecs::Motherboard(specs)) => Some(specs),
        _ => None,
    }
}

fn ram(component: Option<&Component>) -> Option<&RamSpecs> {
    match component.map(|c| &c.specs) {
        Some(ComponentSpecs::Ram(specs)) => Some(specs),
        _ => None,
    }
}

fn gpu(component: Option<&Component>) -> Option<&GpuSpecs> {
    match component.map(|c| &c.specs) {
        Some(ComponentSpecs::Gpu(specs)) => Some(specs),
        _ => None,
    }
}

fn psu(component: Option<&Component>) -> Option<&PsuSpecs> {
    match component.map(|c| &c.specs) {
        Some(ComponentSpecs::Psu(specs)) => Some(specs),
        _ => None,
    }
}

fn cooler(component: Option<&Component>) -> Option<&CoolerSpecs> {
    match component.map(|c| &c.specs) {
        Some(ComponentSpecs::Cooler(specs)) => Some(specs),
        _ => None,
    }
}

/// Evaluate every predicate whose two components are both selected.
pub fn check(selection: &Selection) -> Vec<Incompatibility> {
    let mut issues = Vec::new();
    let cpu = cpu(selection.cpu.as_ref());
    let board = motherboard(selection.motherboard.as_ref());

    if let (Some(cpu), Some(board)) = (cpu, board) {
        if !cpu_fits_motherboard(cpu, board) {
            issues.push(Incompatibility::CpuMotherboard {
                cpu_socket: cpu.socket.clone(),
                board_socket: board.socket.clone(),
            });
        }
    }

    if let (Some(board), Some(ram)) = (board, ram(selection.ram.as_ref())) {
        if !ram_fits_motherboard(ram, board) {
            issues.push(Incompatibility::RamMotherboard {
                ram_type: ram.memory_type.clone(),
                ram_frequency: ram.frequency_mhz,
                board_type: board.ram_type.clone(),
                board_max_frequency: board.max_ram_frequency_mhz,
            });
        }
    }

    if let (Some(psu), Some(gpu)) = (psu(selection.psu.as_ref()), gpu(selection.gpu.as_ref())) {
        if !psu_powers_gpu(psu, gpu) {
            issues.push(Incompatibility::PsuGpu {
                psu_power: psu.power_w,
                gpu_tdp: gpu.tdp_w,
            });
        }
    }

    if let (Some(cooler), Some(cpu)) = (cooler(selection.cooler.as_ref()), cpu) {
        if !cooler_fits_cpu(cooler, cpu) {
            issues.push(Incompatibility::CoolerCpu);
        }
    }

    issues
}

pub fn compatible_motherboards<'a>(
    cpu: &CpuSpecs,
    candidates: &'a [Component],
) -> Vec<&'a Component> {
    candidates
        .iter()
        .filter(|c| matches!(&c.specs, ComponentSpecs::Motherboard(board) if cpu_fits_motherboard(cpu, board)))
        .collect()
}

pub fn compatible_rams<'a>(
    board: &MotherboardSpecs,
    candidates: &'a [Component],
) -> Vec<&'a Component> {
    candidates
        .iter()
        .filter(|c| matches!(&c.specs, ComponentSpecs::Ram(ram) if ram_fits_motherboard(ram, board)))
        .collect()
}

pub fn compatible_cpus<'a>(
    board: &MotherboardSpecs,
    candidates: &'a [Component],
) -> Vec<&'a Component> {
    candidates
        .iter()
        .filter(|c| matches!(&c.specs, ComponentSpecs::Cpu(cpu) if cpu_fits_motherboard(cpu, board)))
        .collect()
}
