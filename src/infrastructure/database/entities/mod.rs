//! Database entities module

pub mod dispenser;
pub mod dispenser_usage;
