//! Inspection helpers: buckets, durations and timestamps.

use anyhow::Result;
use chrono::{SecondsFormat, TimeDelta};
use slowroll::{Bucketer, Sha1Bucketer, scalar_position};

pub fn bucket(identity: &str) -> Result<()> {
    println!("{}", describe_bucket(identity));
    Ok(())
}

pub fn parse_duration(text: &str) -> Result<()> {
    let delta = slowroll::parse_duration(text)?;
    println!("{}", describe_duration(delta));
    Ok(())
}

pub fn parse_time(text: &str) -> Result<()> {
    let t = slowroll::parse_timestamp(text)?;
    println!("{}", t.to_rfc3339_opts(SecondsFormat::AutoSi, true));
    Ok(())
}

fn describe_bucket(identity: &str) -> String {
    let bucket = Sha1Bucketer.bucket(identity);
    format!(
        "bucket:   {bucket}\nposition: {:.6}",
        scalar_position(bucket)
    )
}

fn describe_duration(delta: TimeDelta) -> String {
    let micros = delta.num_microseconds().unwrap_or(i64::MAX);
    format!(
        "seconds:      {}\nmicroseconds: {micros}",
        micros as f64 / 1_000_000.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_description() {
        assert_eq!(describe_bucket("abc"), "bucket:   2630932637\nposition: 0.612562");
    }

    #[test]
    fn duration_description() {
        assert_eq!(
            describe_duration(slowroll::parse_duration("1m 1ms").unwrap()),
            "seconds:      60.001\nmicroseconds: 60001000"
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_duration("1z").is_err());
        assert!(parse_time("2023-01-01").is_err());
        assert!(parse_time("2023-01-01 00:00Z").is_ok());
    }
}
