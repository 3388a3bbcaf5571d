//! Database models for the pizzeria back-office platform
//!
//! Re-exports models from the shared crate.

pub use shared::models::*;
