use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Component, ComponentKind, ComponentSpecs, Manufacturer, Review};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateManufacturerRequest {
    pub name: String,
    pub component_kind: Option<ComponentKind>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ManufacturerList {
    pub items: Vec<Manufacturer>,
}

/// The component kind is taken from `specs.kind`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateComponentRequest {
    pub manufacturer_id: Uuid,
    pub model: String,
    pub price: i64,
    pub image_url: Option<String>,
    pub specs: ComponentSpecs,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateComponentRequest {
    pub manufacturer_id: Option<Uuid>,
    pub model: Option<String>,
    pub price: Option<i64>,
    pub image_url: Option<String>,
    /// Must keep the component's kind.
    pub specs: Option<ComponentSpecs>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentList {
    pub items: Vec<Component>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub text: String,
    pub rating: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewList {
    pub items: Vec<Review>,
}
