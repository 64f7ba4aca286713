//! Spend calculation for usage sessions
//!
//! `spend = price_per_liter * flow_volume * elapsed_seconds`, rounded to
//! three places with midpoint-away-from-zero. The aggregate for a dispenser
//! sums the unrounded session amounts and rounds once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::dispenser::{Dispenser, UsageSession};
use crate::shared::types::Clock;

pub const SPEND_DECIMAL_PLACES: u32 = 3;

/// Spend of a single usage session
#[derive(Debug, Clone, PartialEq)]
pub struct UsageSpend {
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub flow_volume: Decimal,
    pub total_spent: Decimal,
}

/// Aggregate spend of a dispenser
#[derive(Debug, Clone, PartialEq)]
pub struct SpendingReport {
    pub amount: Decimal,
    pub usages: Vec<UsageSpend>,
}

#[derive(Clone)]
pub struct BillingCalculator {
    price_per_liter: Decimal,
    clock: Arc<dyn Clock>,
}

impl BillingCalculator {
    pub fn new(price_per_liter: Decimal, clock: Arc<dyn Clock>) -> Self {
        Self {
            price_per_liter,
            clock,
        }
    }

    pub fn price_per_liter(&self) -> Decimal {
        self.price_per_liter
    }

    /// Whole seconds the tap ran, never negative. Open sessions run until now.
    pub fn elapsed_seconds(&self, usage: &UsageSession) -> i64 {
        elapsed_seconds_at(usage, self.clock.now())
    }

    pub fn session_spend(&self, usage: &UsageSession) -> Decimal {
        round_spend(self.raw_spend(usage, self.clock.now()))
    }

    pub fn dispenser_spend(&self, dispenser: &Dispenser) -> Decimal {
        let now = self.clock.now();
        let total = dispenser
            .usages()
            .iter()
            .map(|u| self.raw_spend(u, now))
            .sum::<Decimal>();
        round_spend(total)
    }

    /// Per-session lines plus the total, all evaluated at the same instant.
    pub fn spending_report(&self, dispenser: &Dispenser) -> SpendingReport {
        let now = self.clock.now();
        let mut total = Decimal::ZERO;
        let usages = dispenser
            .usages()
            .iter()
            .map(|u| {
                let raw = self.raw_spend(u, now);
                total += raw;
                UsageSpend {
                    opened_at: u.opened_at,
                    closed_at: u.closed_at,
                    flow_volume: u.flow_volume.value(),
                    total_spent: round_spend(raw),
                }
            })
            .collect();

        SpendingReport {
            amount: round_spend(total),
            usages,
        }
    }

    fn raw_spend(&self, usage: &UsageSession, now: DateTime<Utc>) -> Decimal {
        let seconds = Decimal::from(elapsed_seconds_at(usage, now));
        self.price_per_liter * usage.flow_volume.value() * seconds
    }
}

fn elapsed_seconds_at(usage: &UsageSession, now: DateTime<Utc>) -> i64 {
    let end = usage.closed_at.unwrap_or(now);
    (end - usage.opened_at).num_seconds().max(0)
}

fn round_spend(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SPEND_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dispenser::{DispenserStatus, FlowVolume};
    use crate::shared::types::FixedClock;
    use chrono::{Duration, TimeZone};
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 1, 3, 0, 0).unwrap()
    }

    fn calculator(clock: Arc<FixedClock>) -> BillingCalculator {
        BillingCalculator::new(dec("12.25"), clock)
    }

    fn session(flow: &str, opened: DateTime<Utc>, closed: Option<DateTime<Utc>>) -> UsageSession {
        let mut s = UsageSession::new(Uuid::new_v4(), opened, FlowVolume::from_str(flow).unwrap());
        s.closed_at = closed;
        s
    }

    #[test]
    fn closed_session_fifty_seconds() {
        let calc = calculator(Arc::new(FixedClock::new(now())));
        let t0 = now() - Duration::hours(1);
        let s = session("0.0653", t0, Some(t0 + Duration::seconds(50)));

        assert_eq!(calc.elapsed_seconds(&s), 50);
        // 12.25 * 0.0653 * 50 = 39.99625
        assert_eq!(calc.session_spend(&s), dec("39.996"));
    }

    #[test]
    fn sub_second_remainder_is_truncated() {
        let calc = calculator(Arc::new(FixedClock::new(now())));
        let t0 = now() - Duration::hours(1);
        let s = session(
            "0.0653",
            t0,
            Some(t0 + Duration::seconds(50) + Duration::milliseconds(999)),
        );
        assert_eq!(calc.elapsed_seconds(&s), 50);
    }

    #[test]
    fn elapsed_counts_whole_days() {
        let calc = calculator(Arc::new(FixedClock::new(now())));
        let t0 = now() - Duration::days(3);
        let s = session("1.0", t0, Some(t0 + Duration::days(2) + Duration::seconds(5)));
        assert_eq!(calc.elapsed_seconds(&s), 2 * 86_400 + 5);
    }

    #[test]
    fn open_session_bills_until_now() {
        let clock = Arc::new(FixedClock::new(now()));
        let calc = calculator(clock.clone());
        let s = session("0.0653", now() - Duration::seconds(10), None);

        assert_eq!(calc.elapsed_seconds(&s), 10);
        let first = calc.session_spend(&s);
        clock.advance(Duration::seconds(5));
        let second = calc.session_spend(&s);
        assert!(second > first);
        assert_eq!(calc.elapsed_seconds(&s), 15);
    }

    #[test]
    fn never_negative() {
        let calc = calculator(Arc::new(FixedClock::new(now())));
        let s = session("0.0653", now() + Duration::seconds(30), None);
        assert_eq!(calc.elapsed_seconds(&s), 0);
        assert_eq!(calc.session_spend(&s), Decimal::ZERO);
    }

    #[test]
    fn midpoint_rounds_away_from_zero() {
        // 1 * 0.0001 * 5 = 0.0005 -> 0.001 (half-even would give 0.000)
        let calc = BillingCalculator::new(Decimal::ONE, Arc::new(FixedClock::new(now())));
        let t0 = now() - Duration::minutes(1);
        let s = session("0.0001", t0, Some(t0 + Duration::seconds(5)));
        assert_eq!(calc.session_spend(&s), dec("0.001"));
    }

    #[test]
    fn aggregate_rounds_sum_not_parts() {
        // each session: 1 * 0.0001 * 4 = 0.0004 -> rounds to 0.000
        // sum of raw amounts: 0.0008 -> 0.001
        let calc = BillingCalculator::new(Decimal::ONE, Arc::new(FixedClock::new(now())));
        let flow = FlowVolume::from_str("0.0001").unwrap();
        let t0 = now() - Duration::minutes(10);
        let mut first = UsageSession::new(Uuid::new_v4(), t0, flow);
        first.closed_at = Some(t0 + Duration::seconds(4));
        let mut second = UsageSession::new(Uuid::new_v4(), t0 + Duration::minutes(1), flow);
        second.closed_at = Some(t0 + Duration::minutes(1) + Duration::seconds(4));
        let d = Dispenser::restore(
            Uuid::new_v4(),
            flow,
            DispenserStatus::Closed,
            vec![first.clone(), second.clone()],
            t0,
        );

        assert_eq!(calc.session_spend(&first), dec("0.000"));
        assert_eq!(calc.dispenser_spend(&d), dec("0.001"));
    }

    #[test]
    fn report_matches_reference_scenario() {
        // 50s + 22s closed, one opened right now: 12.25 * 0.0654 * 72 = 57.6828
        let current = now();
        let calc = calculator(Arc::new(FixedClock::new(current)));
        let flow = FlowVolume::from_str("0.0654").unwrap();
        let first_at = current - Duration::hours(1);
        let id = Uuid::new_v4();

        let mut a = UsageSession::new(id, first_at, flow);
        a.closed_at = Some(first_at + Duration::seconds(50));
        let mut b = UsageSession::new(id, first_at + Duration::minutes(8), flow);
        b.closed_at = Some(first_at + Duration::minutes(8) + Duration::seconds(22));
        let c = UsageSession::new(id, current, flow);

        let d = Dispenser::restore(id, flow, DispenserStatus::Open, vec![a, b, c], first_at);
        let report = calc.spending_report(&d);

        assert_eq!(report.amount, dec("57.683"));
        assert_eq!(report.amount, calc.dispenser_spend(&d));
        assert_eq!(report.usages.len(), 3);
        assert_eq!(report.usages[0].total_spent, dec("40.058"));
        assert_eq!(report.usages[1].total_spent, dec("17.625"));
        assert_eq!(report.usages[2].total_spent, Decimal::ZERO);
        assert!(report.usages.iter().any(|u| u.closed_at.is_none()));
        assert_eq!(report.usages[0].flow_volume, dec("0.0654"));
    }

    #[test]
    fn empty_dispenser_spends_nothing() {
        let calc = calculator(Arc::new(FixedClock::new(now())));
        let d = Dispenser::new(FlowVolume::from_str("0.5").unwrap(), now());
        assert_eq!(calc.dispenser_spend(&d), Decimal::ZERO);
        assert!(calc.spending_report(&d).usages.is_empty());
    }
}
