use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{DeliveryOption, Order, OrderItem, PaymentMethod, ReturnRequest};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub email: String,
    pub delivery_option: DeliveryOption,
    pub payment_method: PaymentMethod,
    /// Required for courier delivery.
    pub address: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StaffOrder {
    pub order: Order,
    pub username: String,
    pub return_request: Option<ReturnRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StaffOrderList {
    pub items: Vec<StaffOrder>,
    pub pending_returns: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}
