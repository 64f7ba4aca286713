//! Time source and timestamp wire format
//!
//! Billing of a still-open usage session depends on "now". The [`Clock`]
//! trait lets the service read the system time in production while tests
//! pin it with [`FixedClock`].

use std::sync::RwLock;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Format used when timestamps leave the service
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Naive layouts accepted on input, tried in order. Naive values are UTC.
const NAIVE_INPUT_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.write() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.write() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Parse `YYYY-MM-DDTHH:MM[:SS[.fff]]` with an optional `Z`/offset suffix.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// `#[serde(with = "...")]` adapter writing [`TIMESTAMP_FORMAT`]
pub mod timestamp_format {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_timestamp(dt))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::Serializer;

        pub fn serialize<S: Serializer>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => s.serialize_str(&super::super::format_timestamp(dt)),
                None => s.serialize_none(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_minutes_precision() {
        let dt = parse_timestamp("2022-01-01T02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2022, 1, 1, 2, 0, 0).unwrap());
    }

    #[test]
    fn parses_seconds_and_fraction() {
        let dt = parse_timestamp("2022-01-01T02:00:50").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2022, 1, 1, 2, 0, 50).unwrap());

        let dt = parse_timestamp("2022-11-17T20:21:31.082").unwrap();
        assert_eq!(dt.timestamp_subsec_millis(), 82);
    }

    #[test]
    fn parses_zulu_and_offsets() {
        let dt = parse_timestamp("2022-11-17T20:21:31.082Z").unwrap();
        assert_eq!(format_timestamp(&dt), "2022-11-17T20:21:31");

        let dt = parse_timestamp("2022-11-17T22:21:31+02:00").unwrap();
        assert_eq!(format_timestamp(&dt), "2022-11-17T20:21:31");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2022-13-01T00:00").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn fixed_clock_advances() {
        let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), start + Duration::seconds(90));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
