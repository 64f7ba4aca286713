//! Usage session entity

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::flow_volume::FlowVolume;

/// One open/close interval of a dispenser
#[derive(Debug, Clone, PartialEq)]
pub struct UsageSession {
    /// Store-assigned sequence number; `None` until first saved
    pub id: Option<i32>,
    pub dispenser_id: Uuid,
    pub opened_at: DateTime<Utc>,
    /// `None` while the tap is still running
    pub closed_at: Option<DateTime<Utc>>,
    /// Dispenser flow volume at the moment the session was opened
    pub flow_volume: FlowVolume,
}

impl UsageSession {
    pub fn new(dispenser_id: Uuid, opened_at: DateTime<Utc>, flow_volume: FlowVolume) -> Self {
        Self {
            id: None,
            dispenser_id,
            opened_at,
            closed_at: None,
            flow_volume,
        }
    }

    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
