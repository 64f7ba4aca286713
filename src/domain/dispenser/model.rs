//! Dispenser aggregate
//!
//! The dispenser owns its status and the ordered list of usage sessions.
//! Every transition validates first and mutates only on success, so a
//! rejected call leaves the aggregate untouched.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::flow_volume::FlowVolume;
use super::usage::UsageSession;
use crate::shared::errors::{DomainError, DomainResult};

pub const ALREADY_OPENED_OR_CLOSED: &str = "Dispenser is already opened/closed";
pub const CLOSE_BEFORE_OPEN: &str = "updated_at value must be greater than opened_at";

/// Tap position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispenserStatus {
    Open,
    #[default]
    Closed,
}

impl DispenserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for DispenserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transition requested against a dispenser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Open,
    Close,
}

impl StatusAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
        }
    }
}

impl From<DispenserStatus> for StatusAction {
    /// The action that moves a dispenser into `target`.
    fn from(target: DispenserStatus) -> Self {
        match target {
            DispenserStatus::Open => Self::Open,
            DispenserStatus::Closed => Self::Close,
        }
    }
}

/// Beer tap dispenser
#[derive(Debug, Clone, PartialEq)]
pub struct Dispenser {
    pub id: Uuid,
    pub flow_volume: FlowVolume,
    pub created_at: DateTime<Utc>,
    status: DispenserStatus,
    usages: Vec<UsageSession>,
}

impl Dispenser {
    /// A fresh, closed dispenser with no history.
    pub fn new(flow_volume: FlowVolume, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            flow_volume,
            created_at,
            status: DispenserStatus::Closed,
            usages: Vec::new(),
        }
    }

    /// Rebuild from storage. `usages` must be in creation order.
    pub fn restore(
        id: Uuid,
        flow_volume: FlowVolume,
        status: DispenserStatus,
        usages: Vec<UsageSession>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            flow_volume,
            created_at,
            status,
            usages,
        }
    }

    pub fn status(&self) -> DispenserStatus {
        self.status
    }

    /// Sessions in creation order
    pub fn usages(&self) -> &[UsageSession] {
        &self.usages
    }

    /// Most recently created session
    pub fn last_usage(&self) -> Option<&UsageSession> {
        self.usages.last()
    }

    pub fn has_open_usage(&self) -> bool {
        self.usages.iter().any(UsageSession::is_open)
    }

    /// Store the sequence number assigned to the session at `index`.
    pub fn record_usage_id(&mut self, index: usize, id: i32) {
        if let Some(usage) = self.usages.get_mut(index) {
            usage.id = Some(id);
        }
    }

    pub fn execute(&mut self, action: StatusAction, at: DateTime<Utc>) -> DomainResult<()> {
        match action {
            StatusAction::Open => self.open(at),
            StatusAction::Close => self.close(at),
        }
    }

    pub fn open(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status == DispenserStatus::Open {
            if self.has_open_usage() {
                return Err(DomainError::Conflict(ALREADY_OPENED_OR_CLOSED.to_string()));
            }
            return Err(DomainError::Consistency(format!(
                "dispenser {} is open without an active usage session",
                self.id
            )));
        }

        self.status = DispenserStatus::Open;
        self.usages
            .push(UsageSession::new(self.id, at, self.flow_volume));
        Ok(())
    }

    pub fn close(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status == DispenserStatus::Closed {
            return Err(DomainError::Conflict(ALREADY_OPENED_OR_CLOSED.to_string()));
        }

        let id = self.id;
        let last = match self.usages.last_mut() {
            Some(last) if last.is_open() => last,
            _ => {
                return Err(DomainError::Consistency(format!(
                    "dispenser {} is open but its last usage session is not",
                    id
                )))
            }
        };

        if at <= last.opened_at {
            return Err(DomainError::validation("updated_at", CLOSE_BEFORE_OPEN));
        }

        last.closed_at = Some(at);
        self.status = DispenserStatus::Closed;
        Ok(())
    }

    /// Status/session agreement: open iff exactly one session is unclosed.
    pub fn check_invariants(&self) -> DomainResult<()> {
        let open_sessions = self.usages.iter().filter(|u| u.is_open()).count();
        let consistent = match self.status {
            DispenserStatus::Open => open_sessions == 1,
            DispenserStatus::Closed => open_sessions == 0,
        };
        if consistent {
            Ok(())
        } else {
            Err(DomainError::Consistency(format!(
                "dispenser {} is {} with {} open usage sessions",
                self.id, self.status, open_sessions
            )))
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 1, 2, 0, 0).unwrap()
    }

    fn sample() -> Dispenser {
        Dispenser::new("0.0653".parse().unwrap(), t0())
    }

    #[test]
    fn new_dispenser_is_closed_without_history() {
        let d = sample();
        assert_eq!(d.status(), DispenserStatus::Closed);
        assert!(d.usages().is_empty());
        assert!(d.check_invariants().is_ok());
    }

    #[test]
    fn open_appends_session_with_flow_snapshot() {
        let mut d = sample();
        d.open(t0()).unwrap();

        assert_eq!(d.status(), DispenserStatus::Open);
        assert_eq!(d.usages().len(), 1);
        let usage = d.last_usage().unwrap();
        assert_eq!(usage.opened_at, t0());
        assert_eq!(usage.closed_at, None);
        assert_eq!(usage.flow_volume, d.flow_volume);
        assert_eq!(usage.dispenser_id, d.id);
        assert!(d.check_invariants().is_ok());
    }

    #[test]
    fn open_while_open_is_conflict_and_leaves_state() {
        let mut d = sample();
        d.open(t0()).unwrap();
        let before = d.clone();

        let err = d.open(t0() + Duration::seconds(10)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ref m) if m == ALREADY_OPENED_OR_CLOSED));
        assert_eq!(d, before);
    }

    #[test]
    fn open_on_corrupted_state_is_consistency_error() {
        let flow = "0.0653".parse().unwrap();
        let id = Uuid::new_v4();
        let mut closed = UsageSession::new(id, t0(), flow);
        closed.closed_at = Some(t0() + Duration::seconds(5));
        let mut d = Dispenser::restore(id, flow, DispenserStatus::Open, vec![closed], t0());
        let before = d.clone();

        let err = d.open(t0() + Duration::seconds(60)).unwrap_err();
        assert!(matches!(err, DomainError::Consistency(_)));
        assert_eq!(d, before);
    }

    #[test]
    fn close_sets_closed_at_on_last_session() {
        let mut d = sample();
        d.open(t0()).unwrap();
        d.close(t0() + Duration::seconds(50)).unwrap();

        assert_eq!(d.status(), DispenserStatus::Closed);
        assert_eq!(d.usages().len(), 1);
        assert_eq!(
            d.last_usage().unwrap().closed_at,
            Some(t0() + Duration::seconds(50))
        );
        assert!(d.check_invariants().is_ok());
    }

    #[test]
    fn close_while_closed_is_conflict() {
        let mut d = sample();
        let err = d.close(t0()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        d.open(t0()).unwrap();
        d.close(t0() + Duration::seconds(1)).unwrap();
        let before = d.clone();
        let err = d.close(t0() + Duration::seconds(2)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(d, before);
    }

    #[test]
    fn close_not_after_open_is_validation_error() {
        let mut d = sample();
        d.open(t0()).unwrap();
        let before = d.clone();

        for at in [t0(), t0() - Duration::hours(1)] {
            let err = d.close(at).unwrap_err();
            match err {
                DomainError::Validation { field, message } => {
                    assert_eq!(field, "updated_at");
                    assert_eq!(message, CLOSE_BEFORE_OPEN);
                }
                other => panic!("unexpected error: {other:?}"),
            }
            assert_eq!(d, before);
        }
    }

    #[test]
    fn close_targets_most_recent_session_only() {
        let mut d = sample();
        d.open(t0()).unwrap();
        d.close(t0() + Duration::seconds(50)).unwrap();
        d.open(t0() + Duration::minutes(8)).unwrap();
        d.close(t0() + Duration::minutes(8) + Duration::seconds(22)).unwrap();

        let usages = d.usages();
        assert_eq!(usages.len(), 2);
        assert_eq!(usages[0].closed_at, Some(t0() + Duration::seconds(50)));
        assert_eq!(
            usages[1].closed_at,
            Some(t0() + Duration::minutes(8) + Duration::seconds(22))
        );
    }

    #[test]
    fn execute_routes_by_action() {
        let mut d = sample();
        d.execute(StatusAction::from(DispenserStatus::Open), t0())
            .unwrap();
        assert_eq!(d.status(), DispenserStatus::Open);
        d.execute(
            StatusAction::from(DispenserStatus::Closed),
            t0() + Duration::seconds(3),
        )
        .unwrap();
        assert_eq!(d.status(), DispenserStatus::Closed);
    }

    #[test]
    fn repeated_rejections_never_mutate() {
        let mut d = sample();
        d.open(t0()).unwrap();
        let snapshot = d.clone();
        for i in 0..5 {
            let _ = d.open(t0() + Duration::seconds(i));
            let _ = d.close(t0() - Duration::seconds(i));
        }
        assert_eq!(d, snapshot);
    }

    #[test]
    fn status_string_roundtrip() {
        assert_eq!(DispenserStatus::parse("open"), Some(DispenserStatus::Open));
        assert_eq!(DispenserStatus::parse("closed"), Some(DispenserStatus::Closed));
        assert_eq!(DispenserStatus::parse("OPEN"), None);
        assert_eq!(DispenserStatus::Closed.to_string(), "closed");
    }

    #[test]
    fn record_usage_id_ignores_out_of_range() {
        let mut d = sample();
        d.open(t0()).unwrap();
        d.record_usage_id(0, 7);
        d.record_usage_id(3, 9);
        assert_eq!(d.last_usage().unwrap().id, Some(7));
    }
}
