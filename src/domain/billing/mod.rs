//! Billing of dispenser usage

pub mod calculator;

pub use calculator::{BillingCalculator, SpendingReport, UsageSpend};
