//! Rollout decider — turns an entry, an identity and a time into a variant.
//!
//! Identities are laid out on the same normalized `[0, 1)` line as the
//! percentage window. An identity's flip time is interpolated linearly from
//! where its position sits relative to the window start:
//!
//! ```text
//! start_time = end_time - duration
//! my_time    = start_time + duration * (scalar_position - start_pct / 100)
//! ```
//!
//! The identity is on `new` from `my_time` onward (inclusive).
//!
//! Positions outside `[start_pct, end_pct)` are not clamped. An identity
//! below `start_pct` gets a flip time before `start_time`, so it is on `new`
//! as soon as the entry is published. `end_pct` only bounds validation and
//! never moves a flip time, so identities above it keep flipping past the
//! point where the window nominally reached `end_pct`. Existing rollouts
//! depend on this exact placement; it must not be clamped.

use chrono::{DateTime, Offset, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bucket::{Bucketer, Sha1Bucketer, scalar_position};
use crate::duration::parse_duration;
use crate::entry::RolloutEntry;
use crate::error::{RolloutError, RolloutResult};
use crate::timestamp::parse_timestamp;

/// Which side of a rollout applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Stable,
    New,
}

/// Why a variant was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// The entry has no `new` value.
    NoRollout,
    /// The identity is listed in `early_adopters`.
    EarlyAdopter,
    /// The identity's flip time was compared against `now`.
    Ramp,
}

/// Outcome of evaluating one entry for one identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub variant: Variant,
    pub reason: Reason,
    /// The identity's personal flip time, when the ramp was evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flip_time: Option<DateTime<Utc>>,
}

impl Decision {
    fn fixed(variant: Variant, reason: Reason) -> Self {
        Self {
            variant,
            reason,
            flip_time: None,
        }
    }
}

/// Evaluates rollout entries with a pluggable bucketer.
#[derive(Debug, Clone, Default)]
pub struct Decider<B = Sha1Bucketer> {
    bucketer: B,
}

impl<B: Bucketer> Decider<B> {
    pub fn new(bucketer: B) -> Self {
        Self { bucketer }
    }

    pub fn bucketer(&self) -> &B {
        &self.bucketer
    }

    /// Select the value `identity` should see at `now`.
    pub fn decide<'e, V, Tz>(
        &self,
        identity: &str,
        entry: &'e RolloutEntry<V>,
        now: &DateTime<Tz>,
    ) -> RolloutResult<&'e V>
    where
        Tz: TimeZone,
    {
        let decision = self.evaluate(identity, entry, now)?;
        Ok(match (decision.variant, entry.new.as_ref()) {
            (Variant::New, Some(new)) => new,
            _ => &entry.stable,
        })
    }

    /// Like [`Decider::decide`], but reports the variant, the reason and the
    /// computed flip time instead of the value.
    pub fn evaluate<V, Tz>(
        &self,
        identity: &str,
        entry: &RolloutEntry<V>,
        now: &DateTime<Tz>,
    ) -> RolloutResult<Decision>
    where
        Tz: TimeZone,
    {
        if entry.new.is_none() {
            return Ok(Decision::fixed(Variant::Stable, Reason::NoRollout));
        }
        if entry.is_early_adopter(identity) {
            return Ok(Decision::fixed(Variant::New, Reason::EarlyAdopter));
        }

        let my_time = self.flip_time(identity, entry)?;
        let now = require_utc("now", now)?;
        debug!(identity, %my_time, %now, "evaluated rollout position");

        let variant = if now >= my_time {
            Variant::New
        } else {
            Variant::Stable
        };
        Ok(Decision {
            variant,
            reason: Reason::Ramp,
            flip_time: Some(my_time),
        })
    }

    /// Compute the instant from which `identity` is on `new`.
    ///
    /// Early adopters and entries without `new` are not special-cased here:
    /// this is the raw ramp position.
    pub fn flip_time<V>(&self, identity: &str, entry: &RolloutEntry<V>) -> RolloutResult<DateTime<Utc>> {
        let end_time = entry
            .end_time
            .as_deref()
            .ok_or(RolloutError::MissingField("end_time"))
            .and_then(parse_timestamp)?;
        let end_time = require_utc("end_time", &end_time)?;
        let duration = entry
            .duration
            .as_deref()
            .ok_or(RolloutError::MissingField("duration"))
            .and_then(parse_duration)?;
        let start_time = end_time
            .checked_sub_signed(duration)
            .ok_or(RolloutError::TimeOverflow("start_time"))?;

        if !(0..=100).contains(&entry.start_pct)
            || !(0..=100).contains(&entry.end_pct)
            || entry.end_pct <= entry.start_pct
        {
            return Err(RolloutError::InvalidPercentRange {
                start_pct: entry.start_pct,
                end_pct: entry.end_pct,
            });
        }

        let position = scalar_position(self.bucketer.bucket(identity));
        let start_scalar = entry.start_pct as f64 / 100.0;
        let end_scalar = entry.end_pct as f64 / 100.0;
        debug!(
            %start_time,
            start_scalar,
            %end_time,
            end_scalar,
            position,
            "resolved rollout window"
        );

        let offset = scale(duration, position - start_scalar)?;
        start_time
            .checked_add_signed(offset)
            .ok_or(RolloutError::TimeOverflow("flip_time"))
    }
}

/// Decide with the default SHA-1 bucketer.
pub fn decide<'e, V, Tz>(
    identity: &str,
    entry: &'e RolloutEntry<V>,
    now: &DateTime<Tz>,
) -> RolloutResult<&'e V>
where
    Tz: TimeZone,
{
    Decider::<Sha1Bucketer>::default().decide(identity, entry, now)
}

fn require_utc<Tz: TimeZone>(what: &'static str, t: &DateTime<Tz>) -> RolloutResult<DateTime<Utc>> {
    let offset_secs = t.offset().fix().local_minus_utc();
    if offset_secs != 0 {
        return Err(RolloutError::TimezoneError { what, offset_secs });
    }
    Ok(t.with_timezone(&Utc))
}

/// `duration * factor`, rounded to the nearest microsecond (ties to even).
fn scale(duration: TimeDelta, factor: f64) -> RolloutResult<TimeDelta> {
    let micros = duration
        .num_microseconds()
        .ok_or(RolloutError::TimeOverflow("duration"))?;
    let scaled = (micros as f64 * factor).round_ties_even();
    if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
        return Err(RolloutError::TimeOverflow("flip offset"));
    }
    Ok(TimeDelta::microseconds(scaled as i64))
}
