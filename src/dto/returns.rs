use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{ReturnRequest, ReturnStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReturnRequest {
    pub order_item_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProcessReturnRequest {
    pub status: ReturnStatus,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReturnList {
    pub items: Vec<ReturnRequest>,
}
