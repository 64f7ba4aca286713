//! In-memory dispenser registry for development and testing

use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::{Dispenser, DispenserRepository, DomainError, DomainResult, FlowVolume};

pub struct InMemoryDispenserRepository {
    dispensers: DashMap<Uuid, Dispenser>,
    usage_counter: AtomicI32,
}

impl InMemoryDispenserRepository {
    pub fn new() -> Self {
        Self {
            dispensers: DashMap::new(),
            usage_counter: AtomicI32::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.dispensers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dispensers.is_empty()
    }
}

impl Default for InMemoryDispenserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DispenserRepository for InMemoryDispenserRepository {
    async fn create(&self, flow_volume: FlowVolume) -> DomainResult<Dispenser> {
        let dispenser = Dispenser::new(flow_volume, Utc::now());
        self.dispensers.insert(dispenser.id, dispenser.clone());
        Ok(dispenser)
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Dispenser>> {
        Ok(self.dispensers.get(&id).map(|d| d.value().clone()))
    }

    async fn save(&self, dispenser: &mut Dispenser) -> DomainResult<()> {
        let mut stored = self
            .dispensers
            .get_mut(&dispenser.id)
            .ok_or_else(|| DomainError::dispenser_not_found(dispenser.id))?;

        let unsaved: Vec<usize> = dispenser
            .usages()
            .iter()
            .enumerate()
            .filter(|(_, u)| !u.is_persisted())
            .map(|(i, _)| i)
            .collect();
        for index in unsaved {
            let id = self.usage_counter.fetch_add(1, Ordering::SeqCst);
            dispenser.record_usage_id(index, id);
        }

        *stored = dispenser.clone();
        Ok(())
    }
}
