//! Identity bucketing — maps an identity string onto a fixed 32-bit bucket.
//!
//! The default algorithm must never change: every client, in every release,
//! has to place the same identity in the same bucket or in-flight rollouts
//! reshuffle.

use sha1::{Digest, Sha1};

/// Number of distinct buckets (`2^32`), as a float for normalization.
pub const BUCKET_SPACE: f64 = 4_294_967_296.0;

/// Maps an identity to a bucket in `[0, 2^32)`.
///
/// Implementations must be pure functions of the identity. Any
/// `Fn(&str) -> u32` closure is a `Bucketer`, which is how tests pin an
/// identity to a known position.
pub trait Bucketer {
    fn bucket(&self, identity: &str) -> u32;
}

impl<F> Bucketer for F
where
    F: Fn(&str) -> u32,
{
    fn bucket(&self, identity: &str) -> u32 {
        self(identity)
    }
}

/// Default bucketer: SHA-1 of the UTF-8 identity, last four digest bytes
/// read as a big-endian `u32`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha1Bucketer;

impl Bucketer for Sha1Bucketer {
    fn bucket(&self, identity: &str) -> u32 {
        let digest = Sha1::digest(identity.as_bytes());
        let tail: [u8; 4] = [digest[16], digest[17], digest[18], digest[19]];
        u32::from_be_bytes(tail)
    }
}

/// Normalize a bucket onto `[0, 1)`.
pub fn scalar_position(bucket: u32) -> f64 {
    f64::from(bucket) / BUCKET_SPACE
}
