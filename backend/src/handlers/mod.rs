//! HTTP handlers for the pizzeria back-office API

pub mod expenses;
pub mod health;
pub mod ledger;
pub mod orders;
pub mod products;
pub mod stock;

pub use expenses::*;
pub use health::*;
pub use ledger::*;
pub use orders::*;
pub use products::*;
pub use stock::*;
