use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::ComponentKind;

/// Exactly one of `component_id` and `build_id` must be set.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub component_id: Option<Uuid>,
    pub build_id: Option<Uuid>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub component_id: Option<Uuid>,
    pub build_id: Option<Uuid>,
    pub component_kind: Option<ComponentKind>,
    pub name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub items: Vec<CartLine>,
    pub total_price: i64,
}
