//! Slowroll core — deterministic, time-ramped two-variant rollouts.
//!
//! Many independent clients share one published rollout document and must
//! agree, without talking to each other, on whether a given identity sees the
//! `stable` or the `new` variant at a given moment. Each identity hashes to a
//! fixed position on `[0, 1)`; that position is mapped onto the rollout's time
//! window to yield a personal flip time, after which the identity is on `new`.
//!
//! # Components
//!
//! - **`bucket`** — identity → 32-bit bucket (`Bucketer`, default SHA-1)
//! - **`duration`** — compact duration strings (`"1h 30m"`, `"500ms"`)
//! - **`timestamp`** — restricted UTC timestamps (`"2023-01-01 00:00Z"`)
//! - **`entry`** — `RolloutEntry`, one configured rollout
//! - **`decider`** — the ramp algorithm (`Decider::decide`, `Decider::evaluate`)
//!
//! Everything here is pure and synchronous. Fetching and caching the rollout
//! document lives in `slowroll-client`.
//!
//! # Known limitation
//!
//! Positions and percentages are `f64` ratios, so identities sitting exactly on
//! a window boundary are subject to rounding noise.

pub mod bucket;
pub mod decider;
pub mod duration;
pub mod entry;
pub mod error;
pub mod timestamp;

pub use bucket::{BUCKET_SPACE, Bucketer, Sha1Bucketer, scalar_position};
pub use decider::{Decider, Decision, Reason, Variant, decide};
pub use duration::parse_duration;
pub use entry::RolloutEntry;
pub use error::{RolloutError, RolloutResult};
pub use timestamp::parse_timestamp;
