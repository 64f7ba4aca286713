pub mod dispensers;
pub mod health;
pub mod metrics;
