//! Shared types and models for the pizzeria back-office platform
//!
//! This crate contains the domain types shared between the backend service
//! and other components of the system, plus the pure engine arithmetic
//! (unit conversion, recurrence dates) so it stays testable without a
//! database.

pub mod conversion;
pub mod models;
pub mod recurrence;
pub mod types;
pub mod validation;

pub use conversion::{convert_price_cents, convert_quantity, ConversionError};
pub use models::*;
pub use types::*;
pub use validation::*;
