//! Flow volume value object
//!
//! Liters per second, stored with exactly four fractional digits and at
//! most five significant digits overall (so the range is `0.0001..=9.9999`).

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::shared::errors::{DomainError, DomainResult};

pub const MAX_DIGITS: u32 = 5;
pub const DECIMAL_PLACES: u32 = 4;
const MAX_WHOLE_DIGITS: u32 = MAX_DIGITS - DECIMAL_PLACES;

const FIELD: &str = "flow_volume";
pub const INVALID_NUMBER: &str = "A valid number is required.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlowVolume(Decimal);

impl FlowVolume {
    /// Validate and normalize a raw decimal.
    pub fn parse(raw: Decimal) -> DomainResult<Self> {
        let digits = DigitProfile::of(&raw);

        if digits.total > MAX_DIGITS {
            return Err(DomainError::validation(
                FIELD,
                format!("Ensure that there are no more than {MAX_DIGITS} digits in total."),
            ));
        }
        if digits.fractional > DECIMAL_PLACES {
            return Err(DomainError::validation(
                FIELD,
                format!("Ensure that there are no more than {DECIMAL_PLACES} decimal places."),
            ));
        }
        if digits.whole > MAX_WHOLE_DIGITS {
            return Err(DomainError::validation(
                FIELD,
                format!(
                    "Ensure that there are no more than {MAX_WHOLE_DIGITS} digits before the decimal point."
                ),
            ));
        }
        if raw <= Decimal::ZERO {
            return Err(DomainError::validation(
                FIELD,
                "Ensure this value is greater than 0.",
            ));
        }

        let mut value = raw;
        value.rescale(DECIMAL_PLACES);
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl FromStr for FlowVolume {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let raw = Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .map_err(|_| DomainError::validation(FIELD, INVALID_NUMBER))?;
        Self::parse(raw)
    }
}

impl fmt::Display for FlowVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<FlowVolume> for Decimal {
    fn from(v: FlowVolume) -> Self {
        v.0
    }
}

/// Digit counts of a decimal as written, trailing zeros included.
#[derive(Debug, PartialEq, Eq)]
struct DigitProfile {
    total: u32,
    whole: u32,
    fractional: u32,
}

impl DigitProfile {
    fn of(value: &Decimal) -> Self {
        let scale = value.scale();
        let mantissa_digits = count_digits(value.mantissa().unsigned_abs());

        if scale == 0 {
            Self {
                total: mantissa_digits,
                whole: mantissa_digits,
                fractional: 0,
            }
        } else if mantissa_digits > scale {
            Self {
                total: mantissa_digits,
                whole: mantissa_digits - scale,
                fractional: scale,
            }
        } else {
            Self {
                total: scale,
                whole: 0,
                fractional: scale,
            }
        }
    }
}

fn count_digits(mut n: u128) -> u32 {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn message(err: DomainError) -> String {
        match err {
            DomainError::Validation { field, message } => {
                assert_eq!(field, "flow_volume");
                message
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_and_rescales_to_four_places() {
        let v = FlowVolume::parse(dec("0.0653")).unwrap();
        assert_eq!(v.to_string(), "0.0653");

        let v = FlowVolume::parse(dec("1.2")).unwrap();
        assert_eq!(v.to_string(), "1.2000");
        assert_eq!(v.value(), dec("1.2"));

        let v = FlowVolume::parse(dec("9.9999")).unwrap();
        assert_eq!(v.to_string(), "9.9999");
    }

    #[test]
    fn rejects_six_digits_in_total() {
        let err = FlowVolume::parse(dec("123.123")).unwrap_err();
        assert_eq!(
            message(err),
            "Ensure that there are no more than 5 digits in total."
        );

        let err = FlowVolume::parse(dec("1.23456")).unwrap_err();
        assert_eq!(
            message(err),
            "Ensure that there are no more than 5 digits in total."
        );
    }

    #[test]
    fn rejects_too_many_decimal_places() {
        let err = FlowVolume::parse(dec("0.000001")).unwrap_err();
        assert_eq!(
            message(err),
            "Ensure that there are no more than 5 digits in total."
        );

        // five fractional digits but only five digits overall
        let err = FlowVolume::parse(dec("0.00001")).unwrap_err();
        assert_eq!(
            message(err),
            "Ensure that there are no more than 4 decimal places."
        );
    }

    #[test]
    fn rejects_whole_digits_overflow() {
        let err = FlowVolume::parse(dec("12.5")).unwrap_err();
        assert_eq!(
            message(err),
            "Ensure that there are no more than 1 digits before the decimal point."
        );
    }

    #[test]
    fn rejects_non_positive() {
        assert!(FlowVolume::parse(Decimal::ZERO).is_err());
        assert!(FlowVolume::parse(dec("-0.5")).is_err());
    }

    #[test]
    fn parses_from_string() {
        let v: FlowVolume = "0.0654".parse().unwrap();
        assert_eq!(v.value(), dec("0.0654"));
        assert_eq!(message("abc".parse::<FlowVolume>().unwrap_err()), INVALID_NUMBER);
        let tiny: FlowVolume = "5e-4".parse().unwrap();
        assert_eq!(tiny.to_string(), "0.0005");
    }

    #[test]
    fn digit_profile_follows_written_form() {
        assert_eq!(
            DigitProfile::of(&dec("0.0653")),
            DigitProfile { total: 4, whole: 0, fractional: 4 }
        );
        assert_eq!(
            DigitProfile::of(&dec("1.20")),
            DigitProfile { total: 3, whole: 1, fractional: 2 }
        );
        assert_eq!(
            DigitProfile::of(&dec("10")),
            DigitProfile { total: 2, whole: 2, fractional: 0 }
        );
        assert_eq!(
            DigitProfile::of(&Decimal::ZERO),
            DigitProfile { total: 1, whole: 1, fractional: 0 }
        );
    }
}
