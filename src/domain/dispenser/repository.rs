//! Dispenser repository interface

use async_trait::async_trait;
use uuid::Uuid;

use super::flow_volume::FlowVolume;
use super::model::Dispenser;
use crate::shared::errors::DomainResult;

#[async_trait]
pub trait DispenserRepository: Send + Sync {
    /// Register a new closed dispenser.
    async fn create(&self, flow_volume: FlowVolume) -> DomainResult<Dispenser>;

    /// Load a dispenser with its usage sessions in creation order.
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Dispenser>>;

    /// Persist status plus new or updated sessions as one unit.
    ///
    /// Sequence numbers assigned to new sessions are written back into
    /// `dispenser`.
    async fn save(&self, dispenser: &mut Dispenser) -> DomainResult<()>;
}
