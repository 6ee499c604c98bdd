use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::StockRecord;

#[derive(Debug, Serialize, ToSchema)]
pub struct StockList {
    pub items: Vec<StockRecord>,
    pub out_of_stock_count: i64,
}

/// Omitted amount falls back to the configured step.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StockAdjustRequest {
    pub amount: Option<i32>,
}
