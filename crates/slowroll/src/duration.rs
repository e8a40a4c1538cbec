//! Compact duration strings such as `"1h"`, `"1h 30m"`, `"-1s"` or `"250ms"`.
//!
//! Grammar:
//!
//! ```text
//! duration := ws* (token ws*)*
//! token    := number ws* unit
//! number   := "-"? [0-9.]+
//! unit     := "ms" | "d" | "h" | "m" | "s"
//! ```
//!
//! Units are matched longest first, so `"ms"` is milliseconds and never
//! minutes followed by a stray `s`. Each unit may appear at most once, and the
//! whole input must be consumed. An empty or blank input is a zero duration.

use chrono::TimeDelta;

use crate::error::{RolloutError, RolloutResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Days,
    Hours,
    Minutes,
    Seconds,
    Millis,
}

impl Unit {
    fn micros(self) -> f64 {
        match self {
            Unit::Days => 86_400_000_000.0,
            Unit::Hours => 3_600_000_000.0,
            Unit::Minutes => 60_000_000.0,
            Unit::Seconds => 1_000_000.0,
            Unit::Millis => 1_000.0,
        }
    }
}

/// Unit suffixes in match order: two-character suffixes before their
/// one-character prefixes.
const UNITS: [(&str, Unit); 5] = [
    ("ms", Unit::Millis),
    ("d", Unit::Days),
    ("h", Unit::Hours),
    ("m", Unit::Minutes),
    ("s", Unit::Seconds),
];

/// Parse a compact duration string.
///
/// Fractional and negative amounts are allowed (`"1.5h"`, `"-1s"`). The
/// result is rounded to the nearest microsecond, ties to even.
pub fn parse_duration(input: &str) -> RolloutResult<TimeDelta> {
    let mut rest = input.trim();
    let mut seen: Vec<&'static str> = Vec::with_capacity(UNITS.len());
    let mut total_micros = 0.0_f64;

    while !rest.is_empty() {
        let (amount, after) =
            take_number(rest).ok_or_else(|| malformed(input, format!("expected a number at {rest:?}")))?;
        let after = after.trim_start();
        let (symbol, unit, after) =
            take_unit(after).ok_or_else(|| malformed(input, format!("expected a unit at {after:?}")))?;

        if seen.contains(&symbol) {
            return Err(RolloutError::DuplicateUnit {
                unit: symbol,
                input: input.to_string(),
            });
        }
        seen.push(symbol);

        total_micros += amount * unit.micros();
        rest = after.trim_start();
    }

    let micros = total_micros.round_ties_even();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return Err(malformed(input, "out of range".to_string()));
    }
    Ok(TimeDelta::microseconds(micros as i64))
}

/// Split a leading `-?[0-9.]+` off `s` and parse it.
fn take_number(s: &str) -> Option<(f64, &str)> {
    let sign = usize::from(s.starts_with('-'));
    let digits = s[sign..]
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len() - sign);
    if digits == 0 {
        return None;
    }
    let (number, rest) = s.split_at(sign + digits);
    number.parse::<f64>().ok().map(|amount| (amount, rest))
}

fn take_unit(s: &str) -> Option<(&'static str, Unit, &str)> {
    UNITS
        .iter()
        .find(|(symbol, _)| s.starts_with(symbol))
        .map(|&(symbol, unit)| (symbol, unit, &s[symbol.len()..]))
}

fn malformed(input: &str, reason: String) -> RolloutError {
    RolloutError::MalformedDuration {
        input: input.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_units() {
        assert_eq!(parse_duration("1ms").unwrap(), TimeDelta::microseconds(1000));
        assert_eq!(parse_duration("1  ms  ").unwrap(), TimeDelta::microseconds(1000));
        assert_eq!(parse_duration("1s").unwrap(), TimeDelta::seconds(1));
        assert_eq!(parse_duration("1  s  ").unwrap(), TimeDelta::seconds(1));
        assert_eq!(parse_duration("1m").unwrap(), TimeDelta::minutes(1));
        assert_eq!(parse_duration("1h").unwrap(), TimeDelta::seconds(3600));
        assert_eq!(parse_duration("1  h  ").unwrap(), TimeDelta::seconds(3600));
        assert_eq!(parse_duration("2d").unwrap(), TimeDelta::days(2));
    }

    #[test]
    fn parses_negative_and_fractional() {
        assert_eq!(parse_duration("-1s").unwrap(), TimeDelta::seconds(-1));
        assert_eq!(parse_duration("1.5h").unwrap(), TimeDelta::minutes(90));
        assert_eq!(parse_duration(".5s").unwrap(), TimeDelta::milliseconds(500));
    }

    #[test]
    fn parses_compound() {
        assert_eq!(
            parse_duration("1h 30m").unwrap(),
            TimeDelta::minutes(90)
        );
        assert_eq!(
            parse_duration("1d2h3m4s5ms").unwrap(),
            TimeDelta::days(1)
                + TimeDelta::hours(2)
                + TimeDelta::minutes(3)
                + TimeDelta::seconds(4)
                + TimeDelta::milliseconds(5)
        );
        // Order does not matter.
        assert_eq!(parse_duration("30m 1h").unwrap(), TimeDelta::minutes(90));
    }

    #[test]
    fn ms_is_not_minutes() {
        assert_eq!(parse_duration("5ms").unwrap(), TimeDelta::milliseconds(5));
        assert_eq!(
            parse_duration("5m 5ms").unwrap(),
            TimeDelta::minutes(5) + TimeDelta::milliseconds(5)
        );
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(parse_duration("").unwrap(), TimeDelta::zero());
        assert_eq!(parse_duration(" ").unwrap(), TimeDelta::zero());
        assert_eq!(parse_duration("\t\n").unwrap(), TimeDelta::zero());
    }

    #[test]
    fn rejects_unknown_unit() {
        let err = parse_duration("1z").unwrap_err();
        assert!(matches!(err, RolloutError::MalformedDuration { .. }), "{err:?}");
    }

    #[test]
    fn rejects_leftovers() {
        for bad in ["1h junk", "h", "1", "1m s", "1h-", ".h", "1.2.3s", "- 1s"] {
            let err = parse_duration(bad).unwrap_err();
            assert!(
                matches!(err, RolloutError::MalformedDuration { .. }),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn rejects_duplicate_units() {
        let err = parse_duration("1m 2m").unwrap_err();
        assert_eq!(
            err,
            RolloutError::DuplicateUnit {
                unit: "m",
                input: "1m 2m".to_string(),
            }
        );
        // "ms" and "m" are distinct units.
        assert!(parse_duration("1m 1ms").is_ok());
    }
}
