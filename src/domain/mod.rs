pub mod billing;
pub mod dispenser;

// Re-export commonly used types
pub use billing::{BillingCalculator, SpendingReport, UsageSpend};
pub use dispenser::{
    Dispenser, DispenserRepository, DispenserStatus, FlowVolume, StatusAction, UsageSession,
};

// Re-export DomainError from shared for convenience
pub use crate::shared::errors::{DomainError, DomainResult};
