//! Domain models for the pizzeria back-office engine

mod finance;
mod order;
mod product;
mod stock;

pub use finance::*;
pub use order::*;
pub use product::*;
pub use stock::*;
