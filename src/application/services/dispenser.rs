//! Dispenser business logic service

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use super::locks::DispenserLocks;
use crate::domain::{
    BillingCalculator, Dispenser, DispenserRepository, DispenserStatus, DomainError, DomainResult,
    FlowVolume, SpendingReport, StatusAction,
};

/// Service for dispenser operations
pub struct DispenserService {
    repo: Arc<dyn DispenserRepository>,
    billing: BillingCalculator,
    locks: DispenserLocks,
}

impl DispenserService {
    pub fn new(repo: Arc<dyn DispenserRepository>, billing: BillingCalculator) -> Self {
        Self {
            repo,
            billing,
            locks: DispenserLocks::new(),
        }
    }

    /// Register a dispenser with the given flow volume (liters/second)
    pub async fn create(&self, flow_volume: Decimal) -> DomainResult<Dispenser> {
        let flow_volume = FlowVolume::parse(flow_volume)?;
        let dispenser = self.repo.create(flow_volume).await?;
        info!(
            dispenser_id = %dispenser.id,
            flow_volume = %dispenser.flow_volume,
            "Dispenser created"
        );
        Ok(dispenser)
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<Dispenser> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::dispenser_not_found(id))
    }

    /// Move the dispenser to `target` at the caller-supplied instant.
    ///
    /// Load, transition and save happen under the dispenser's lock, so
    /// concurrent requests for the same id are applied one at a time.
    pub async fn set_status(
        &self,
        id: Uuid,
        target: DispenserStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<Dispenser> {
        let action = StatusAction::from(target);
        let guard = self.locks.lock(id).await;
        let result = self.apply(id, action, at).await;
        drop(guard);
        if matches!(result, Err(DomainError::NotFound { .. })) {
            self.locks.forget(id);
        }

        let outcome = match &result {
            Ok(_) => "ok",
            Err(DomainError::Conflict(_)) => "conflict",
            Err(DomainError::Validation { .. }) => "invalid",
            Err(DomainError::NotFound { .. }) => "not_found",
            Err(_) => "error",
        };
        metrics::counter!(
            "dispenser_transitions_total",
            "action" => action.as_str(),
            "outcome" => outcome
        )
        .increment(1);

        match &result {
            Ok(d) => info!(
                dispenser_id = %id,
                action = action.as_str(),
                at = %at,
                usages = d.usages().len(),
                "Dispenser status changed to {}",
                d.status()
            ),
            Err(e @ DomainError::Consistency(_)) | Err(e @ DomainError::Storage(_)) => {
                warn!(dispenser_id = %id, action = action.as_str(), "Status change failed: {}", e)
            }
            Err(e) => info!(dispenser_id = %id, action = action.as_str(), "Status change rejected: {}", e),
        }

        result
    }

    async fn apply(
        &self,
        id: Uuid,
        action: StatusAction,
        at: DateTime<Utc>,
    ) -> DomainResult<Dispenser> {
        let mut dispenser = self.get(id).await?;
        dispenser.execute(action, at)?;
        self.repo.save(&mut dispenser).await?;
        Ok(dispenser)
    }

    /// Spend per usage session and in total, computed at read time
    pub async fn spending(&self, id: Uuid) -> DomainResult<SpendingReport> {
        let dispenser = self.get(id).await?;
        Ok(self.billing.spending_report(&dispenser))
    }
}

// ── Tests ──────────────────────────────────────────────────────
