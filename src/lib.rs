//! # Beer Tap Dispenser Service
//!
//! Tracks beer tap dispensers as they are opened and closed, keeps every
//! open/close interval as a usage session, and bills each session by flow
//! volume, elapsed time and price per liter.
//!
//! ## Architecture
//!
//! - **domain**: dispenser state machine, usage sessions, billing, repository trait
//! - **application**: `DispenserService` and the per-dispenser lock registry
//! - **infrastructure**: SeaORM/SQLite persistence and the in-memory registry
//! - **interfaces**: REST API with Swagger documentation, health and metrics
//! - **shared**: errors, time handling, graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use infrastructure::{init_database, DatabaseConfig};

pub use interfaces::http::create_api_router;
