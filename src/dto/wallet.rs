use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Balance, Transaction};

#[derive(Debug, Deserialize, ToSchema)]
pub struct TopUpRequest {
    pub amount: i64,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PendingTopUp {
    pub id: Uuid,
    pub amount: i64,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmTopUpRequest {
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WalletOverview {
    pub balance: Balance,
    pub transactions: Vec<Transaction>,
}
