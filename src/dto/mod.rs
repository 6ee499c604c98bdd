pub mod auth;
pub mod builds;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod returns;
pub mod stock;
pub mod wallet;
