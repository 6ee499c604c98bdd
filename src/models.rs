use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const ROLE_USER: &str = "user";
pub const ROLE_STAFF: &str = "staff";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Cpu,
    Gpu,
    Motherboard,
    Ram,
    Storage,
    Psu,
    Case,
    Cooler,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 8] = [
        ComponentKind::Cpu,
        ComponentKind::Gpu,
        ComponentKind::Motherboard,
        ComponentKind::Ram,
        ComponentKind::Storage,
        ComponentKind::Psu,
        ComponentKind::Case,
        ComponentKind::Cooler,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Cpu => "cpu",
            ComponentKind::Gpu => "gpu",
            ComponentKind::Motherboard => "motherboard",
            ComponentKind::Ram => "ram",
            ComponentKind::Storage => "storage",
            ComponentKind::Psu => "psu",
            ComponentKind::Case => "case",
            ComponentKind::Cooler => "cooler",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CoolerType {
    Air,
    Liquid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CpuSpecs {
    pub cores: i32,
    pub frequency_ghz: f64,
    pub tdp_w: i32,
    pub socket: String,
    #[serde(default)]
    pub integrated_graphics: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GpuSpecs {
    pub memory_gb: i32,
    pub frequency_ghz: f64,
    pub tdp_w: i32,
    #[serde(default = "default_gpu_interface")]
    pub interface: String,
    #[serde(default)]
    pub ray_tracing: bool,
}

fn default_gpu_interface() -> String {
    "PCIe x16".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MotherboardSpecs {
    pub form_factor: String,
    pub socket: String,
    pub chipset: String,
    pub ram_slots: i32,
    /// DDR4, DDR5, ...
    pub ram_type: String,
    pub max_ram_frequency_mhz: i32,
    #[serde(default)]
    pub expansion_slots: String,
    #[serde(default)]
    pub wifi: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RamSpecs {
    pub capacity_gb: i32,
    pub frequency_mhz: i32,
    pub memory_type: String,
    #[serde(default)]
    pub rgb: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StorageSpecs {
    pub capacity_gb: i32,
    /// SSD or HDD.
    pub storage_type: String,
    pub interface: String,
    pub read_speed_mbps: i32,
    pub write_speed_mbps: i32,
    #[serde(default)]
    pub nvme: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PsuSpecs {
    pub power_w: i32,
    pub certification: String,
    #[serde(default)]
    pub modular: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CaseSpecs {
    pub form_factor: String,
    pub dimensions: String,
    #[serde(default = "default_case_form_factors")]
    pub supported_motherboard_form_factors: Vec<String>,
    #[serde(default)]
    pub side_panel_window: bool,
}

fn default_case_form_factors() -> Vec<String> {
    vec!["ATX".into(), "Micro-ATX".into(), "Mini-ITX".into()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CoolerSpecs {
    pub cooler_type: CoolerType,
    /// Air coolers only.
    pub fan_size_mm: Option<i32>,
    /// Liquid coolers only.
    pub radiator_size: Option<String>,
    #[serde(default)]
    pub rgb: bool,
}

/// Technical attributes of a component, tagged by its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentSpecs {
    Cpu(CpuSpecs),
    Gpu(GpuSpecs),
    Motherboard(MotherboardSpecs),
    Ram(RamSpecs),
    Storage(StorageSpecs),
    Psu(PsuSpecs),
    Case(CaseSpecs),
    Cooler(CoolerSpecs),
}

impl ComponentSpecs {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentSpecs::Cpu(_) => ComponentKind::Cpu,
            ComponentSpecs::Gpu(_) => ComponentKind::Gpu,
            ComponentSpecs::Motherboard(_) => ComponentKind::Motherboard,
            ComponentSpecs::Ram(_) => ComponentKind::Ram,
            ComponentSpecs::Storage(_) => ComponentKind::Storage,
            ComponentSpecs::Psu(_) => ComponentKind::Psu,
            ComponentSpecs::Case(_) => ComponentKind::Case,
            ComponentSpecs::Cooler(_) => ComponentKind::Cooler,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        fn positive(name: &str, value: i32) -> Result<(), String> {
            if value > 0 {
                Ok(())
            } else {
                Err(format!("{name} must be greater than 0"))
            }
        }
        fn filled(name: &str, value: &str) -> Result<(), String> {
            if value.trim().is_empty() {
                Err(format!("{name} must not be empty"))
            } else {
                Ok(())
            }
        }

        match self {
            ComponentSpecs::Cpu(s) => {
                positive("cores", s.cores)?;
                positive("tdp_w", s.tdp_w)?;
                filled("socket", &s.socket)?;
                if s.frequency_ghz <= 0.0 {
                    return Err("frequency_ghz must be greater than 0".into());
                }
            }
            ComponentSpecs::Gpu(s) => {
                positive("memory_gb", s.memory_gb)?;
                positive("tdp_w", s.tdp_w)?;
                if s.frequency_ghz <= 0.0 {
                    return Err("frequency_ghz must be greater than 0".into());
                }
            }
            ComponentSpecs::Motherboard(s) => {
                filled("socket", &s.socket)?;
                filled("ram_type", &s.ram_type)?;
                filled("form_factor", &s.form_factor)?;
                positive("ram_slots", s.ram_slots)?;
                positive("max_ram_frequency_mhz", s.max_ram_frequency_mhz)?;
            }
            ComponentSpecs::Ram(s) => {
                positive("capacity_gb", s.capacity_gb)?;
                positive("frequency_mhz", s.frequency_mhz)?;
                filled("memory_type", &s.memory_type)?;
            }
            ComponentSpecs::Storage(s) => {
                positive("capacity_gb", s.capacity_gb)?;
                filled("storage_type", &s.storage_type)?;
            }
            ComponentSpecs::Psu(s) => positive("power_w", s.power_w)?,
            ComponentSpecs::Case(s) => filled("form_factor", &s.form_factor)?,
            ComponentSpecs::Cooler(s) => {
                if let Some(fan) = s.fan_size_mm {
                    positive("fan_size_mm", fan)?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Manufacturer {
    pub id: Uuid,
    pub name: String,
    pub component_kind: Option<ComponentKind>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Component {
    pub id: Uuid,
    pub kind: ComponentKind,
    pub manufacturer_id: Uuid,
    pub manufacturer: String,
    pub model: String,
    pub price: i64,
    pub image_url: Option<String>,
    pub specs: ComponentSpecs,
    /// On-hand quantity, `None` when no stock record exists.
    pub stock: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Component {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.manufacturer, self.model)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub component_id: Uuid,
    pub text: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Build {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: Option<String>,
    pub cpu_id: Option<Uuid>,
    pub gpu_id: Option<Uuid>,
    pub motherboard_id: Option<Uuid>,
    pub ram_id: Option<Uuid>,
    pub storage_id: Option<Uuid>,
    pub psu_id: Option<Uuid>,
    pub case_id: Option<Uuid>,
    pub cooler_id: Option<Uuid>,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Build {
    pub fn display_name(&self) -> String {
        match self.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => format!("Build {name}"),
            None => format!("Build {}", &self.id.to_string()[..8]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub component_id: Option<Uuid>,
    pub build_id: Option<Uuid>,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Assembling,
    DeliveryPrep,
    Delivering,
    Delivered,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Assembling => "assembling",
            OrderStatus::DeliveryPrep => "delivery_prep",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Assembling,
            OrderStatus::DeliveryPrep,
            OrderStatus::Delivering,
            OrderStatus::Delivered,
            OrderStatus::Completed,
        ]
        .into_iter()
        .find(|status| status.as_str() == value)
    }

    /// Customer facing description used in notifications.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Order is under review",
            OrderStatus::Confirmed => "Order confirmed",
            OrderStatus::Assembling => "Order is being assembled",
            OrderStatus::DeliveryPrep => "Order is being prepared for delivery",
            OrderStatus::Delivering => "Order will be delivered within 3 hours",
            OrderStatus::Delivered => "Order delivered, ready for pickup",
            OrderStatus::Completed => "Order completed",
        }
    }

    /// Statuses that notify the customer by email when entered.
    pub fn notifies_customer(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Delivering)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOption {
    Pickup,
    Courier,
}

impl DeliveryOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOption::Pickup => "pickup",
            DeliveryOption::Courier => "courier",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pickup" => Some(DeliveryOption::Pickup),
            "courier" => Some(DeliveryOption::Courier),
            _ => None,
        }
    }

    /// Statuses staff may put an order with this delivery option into.
    pub fn allowed_statuses(&self) -> &'static [OrderStatus] {
        match self {
            DeliveryOption::Courier => &[
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Assembling,
                OrderStatus::DeliveryPrep,
                OrderStatus::Delivering,
                OrderStatus::Completed,
            ],
            DeliveryOption::Pickup => &[
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Delivered,
                OrderStatus::Completed,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Cash,
    Balance,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Balance => "balance",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub delivery_option: String,
    pub payment_method: String,
    pub address: Option<String>,
    pub total_amount: i64,
    pub track_number: String,
    pub status: String,
    pub is_completed: bool,
    pub return_request_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub item: String,
    pub quantity: i32,
    /// Unit price at checkout.
    pub price: i64,
    pub component_kind: Option<String>,
    pub component_id: Option<Uuid>,
    pub build_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    Pending,
    Approved,
    Rejected,
    Returned,
    Refunded,
}

impl ReturnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::Pending => "pending",
            ReturnStatus::Approved => "approved",
            ReturnStatus::Rejected => "rejected",
            ReturnStatus::Returned => "returned",
            ReturnStatus::Refunded => "refunded",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReturnRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_item_id: Uuid,
    pub reason: String,
    pub status: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockRecord {
    pub id: Uuid,
    pub component_id: Uuid,
    pub component_kind: String,
    pub component_name: String,
    pub quantity: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Purchase,
    Refund,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Purchase => "purchase",
            TransactionType::Refund => "refund",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Balance {
    pub user_id: Uuid,
    pub balance: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub transaction_type: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Render minor currency units as `major.minor`.
pub fn format_amount(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
