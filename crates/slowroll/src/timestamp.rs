//! Restricted UTC timestamps.
//!
//! Only `Z`-suffixed, space-separated forms are accepted, so every client
//! reads the same instant without needing timezone data.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};

use crate::error::{RolloutError, RolloutResult};

/// Accepted formats, tried in order.
const UTC_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%MZ",
    "%Y-%m-%d %H:%M:%SZ",
    "%Y-%m-%d %H:%M:%S%.fZ",
];

/// Longest fractional-second part accepted (microseconds).
const MAX_FRACTION_DIGITS: usize = 6;

/// Parse `YYYY-MM-DD HH:MMZ`, `YYYY-MM-DD HH:MM:SSZ` or
/// `YYYY-MM-DD HH:MM:SS.ffffffZ` into a UTC instant.
pub fn parse_timestamp(input: &str) -> RolloutResult<DateTime<Utc>> {
    let malformed = || RolloutError::MalformedTimestamp(input.to_string());
    if !has_plain_year(input) || fraction_digits(input) > MAX_FRACTION_DIGITS {
        return Err(malformed());
    }
    let naive = UTC_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .ok_or_else(malformed)?;
    // chrono represents `:60` as a leap second; it is not a valid instant here.
    if naive.nanosecond() >= 1_000_000_000 {
        return Err(malformed());
    }
    Ok(naive.and_utc())
}

/// Exactly four ASCII digits before the first `-`: no sign, no padding.
fn has_plain_year(input: &str) -> bool {
    let bytes = input.as_bytes();
    bytes.len() > 4 && bytes[..4].iter().all(u8::is_ascii_digit) && bytes[4] == b'-'
}

fn fraction_digits(input: &str) -> usize {
    input
        .rsplit_once('.')
        .map(|(_, tail)| tail.trim_end_matches('Z').len())
        .unwrap_or(0)
}
