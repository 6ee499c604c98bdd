pub mod audit_logs;
pub mod balance_topups;
pub mod balances;
pub mod builds;
pub mod cart_items;
pub mod components;
pub mod manufacturers;
pub mod order_items;
pub mod orders;
pub mod return_requests;
pub mod reviews;
pub mod stock;
pub mod transactions;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use balance_topups::Entity as BalanceTopups;
pub use balances::Entity as Balances;
pub use builds::Entity as Builds;
pub use cart_items::Entity as CartItems;
pub use components::Entity as Components;
pub use manufacturers::Entity as Manufacturers;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use return_requests::Entity as ReturnRequests;
pub use reviews::Entity as Reviews;
pub use stock::Entity as Stock;
pub use transactions::Entity as Transactions;
pub use users::Entity as Users;
