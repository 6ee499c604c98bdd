use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    compatibility::{CompatibilityIssue, Selection},
    models::{Build, Component, ComponentKind},
};

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct BuildRequest {
    pub name: Option<String>,
    pub cpu_id: Option<Uuid>,
    pub gpu_id: Option<Uuid>,
    pub motherboard_id: Option<Uuid>,
    pub ram_id: Option<Uuid>,
    pub storage_id: Option<Uuid>,
    pub psu_id: Option<Uuid>,
    pub case_id: Option<Uuid>,
    pub cooler_id: Option<Uuid>,
}

impl BuildRequest {
    /// Requested component ids with the slot they were given for.
    pub fn slots(&self) -> Vec<(ComponentKind, Uuid)> {
        [
            (ComponentKind::Cpu, self.cpu_id),
            (ComponentKind::Gpu, self.gpu_id),
            (ComponentKind::Motherboard, self.motherboard_id),
            (ComponentKind::Ram, self.ram_id),
            (ComponentKind::Storage, self.storage_id),
            (ComponentKind::Psu, self.psu_id),
            (ComponentKind::Case, self.case_id),
            (ComponentKind::Cooler, self.cooler_id),
        ]
        .into_iter()
        .filter_map(|(kind, id)| id.map(|id| (kind, id)))
        .collect()
    }
}

/// Components of a build keyed by slot.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct BuildComponents {
    pub cpu: Option<Component>,
    pub gpu: Option<Component>,
    pub motherboard: Option<Component>,
    pub ram: Option<Component>,
    pub storage: Option<Component>,
    pub psu: Option<Component>,
    pub case: Option<Component>,
    pub cooler: Option<Component>,
}

impl From<Selection> for BuildComponents {
    fn from(value: Selection) -> Self {
        Self {
            cpu: value.cpu,
            gpu: value.gpu,
            motherboard: value.motherboard,
            ram: value.ram,
            storage: value.storage,
            psu: value.psu,
            case: value.case,
            cooler: value.cooler,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BuildDetail {
    pub build: Build,
    pub components: BuildComponents,
    pub compatible: bool,
    pub issues: Vec<CompatibilityIssue>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BuildPreview {
    pub components: BuildComponents,
    pub compatible: bool,
    pub issues: Vec<CompatibilityIssue>,
    pub total_price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BuildList {
    pub items: Vec<Build>,
}
