//! Dispenser aggregate
//!
//! Contains the Dispenser state machine, its usage sessions, the flow
//! volume value object and the repository interface.

pub mod flow_volume;
pub mod model;
pub mod repository;
pub mod usage;

pub use flow_volume::FlowVolume;
pub use model::{Dispenser, DispenserStatus, StatusAction};
pub use repository::DispenserRepository;
pub use usage::UsageSession;
