//! Rollout entries — one configured `stable`/`new` pair and its ramp.

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::decider::Variant;
use crate::error::{RolloutError, RolloutResult};

fn default_start_pct() -> i64 {
    0
}

fn default_end_pct() -> i64 {
    100
}

fn absent<V>() -> Option<V> {
    None
}

/// A present `new` key is a rollout even when its value is `null`.
fn present<'de, D, V>(deserializer: D) -> Result<Option<V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    V::deserialize(deserializer).map(Some)
}

/// A single rollout as it appears in the published document.
///
/// ```json
/// {
///     "stable": "1.0", "new": "1.1a",
///     "start_pct": 0, "end_pct": 100,
///     "duration": "1h", "end_time": "2023-01-01 00:00Z",
///     "early_adopters": ["alice", "bob"]
/// }
/// ```
///
/// `end_time` and `duration` are kept as the raw strings and only parsed
/// when a decision actually needs them, so an entry without `new`, or an
/// early adopter, never trips over a malformed ramp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolloutEntry<V = serde_json::Value> {
    /// Value served before the identity's flip time.
    pub stable: V,
    /// Value served after the flip time. `None` (key absent) pins the entry
    /// to `stable`; an explicit `null` is served like any other value.
    #[serde(
        default = "absent",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub new: Option<V>,
    #[serde(default = "default_start_pct")]
    pub start_pct: i64,
    #[serde(default = "default_end_pct")]
    pub end_pct: i64,
    /// Ramp end, in one of the accepted UTC timestamp formats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Ramp length; the ramp starts at `end_time - duration`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Identities that always get `new`.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub early_adopters: BTreeSet<String>,
}

impl<V> RolloutEntry<V> {
    /// An entry with no rollout defined.
    pub fn pinned(stable: V) -> Self {
        Self {
            stable,
            new: None,
            start_pct: default_start_pct(),
            end_pct: default_end_pct(),
            end_time: None,
            duration: None,
            early_adopters: BTreeSet::new(),
        }
    }

    /// An entry ramping from `stable` to `new` over `duration`, ending at
    /// `end_time`, across the full 0–100% range.
    pub fn ramp(stable: V, new: V, end_time: &str, duration: &str) -> Self {
        Self {
            new: Some(new),
            end_time: Some(end_time.to_string()),
            duration: Some(duration.to_string()),
            ..Self::pinned(stable)
        }
    }

    /// Restrict the ramp to `[start_pct, end_pct]`.
    pub fn with_percent_range(mut self, start_pct: i64, end_pct: i64) -> Self {
        self.start_pct = start_pct;
        self.end_pct = end_pct;
        self
    }

    /// Add identities that always receive `new`.
    pub fn with_early_adopters<I, S>(mut self, identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.early_adopters
            .extend(identities.into_iter().map(Into::into));
        self
    }

    pub fn is_early_adopter(&self, identity: &str) -> bool {
        self.early_adopters.contains(identity)
    }

    /// Take the value for `variant`. Falls back to `stable` when `new` is
    /// not set.
    pub fn into_value(self, variant: Variant) -> V {
        match (variant, self.new) {
            (Variant::New, Some(new)) => new,
            _ => self.stable,
        }
    }
}

impl<V: DeserializeOwned> RolloutEntry<V> {
    /// Decode an entry from one raw mapping of the rollout document.
    pub fn from_json(raw: &serde_json::Value) -> RolloutResult<Self> {
        if raw.is_object() && raw.get("stable").is_none() {
            return Err(RolloutError::MissingField("stable"));
        }
        Self::deserialize(raw).map_err(|e| RolloutError::MalformedEntry(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_full_entry() {
        let raw = json!({
            "stable": "1.0", "new": "1.1a",
            "start_pct": 10, "end_pct": 90,
            "duration": "1h", "end_time": "2023-01-01 00:00Z",
            "early_adopters": ["alice", "bob"]
        });
        let entry: RolloutEntry = RolloutEntry::from_json(&raw).unwrap();
        assert_eq!(entry.stable, json!("1.0"));
        assert_eq!(entry.new, Some(json!("1.1a")));
        assert_eq!((entry.start_pct, entry.end_pct), (10, 90));
        assert_eq!(entry.duration.as_deref(), Some("1h"));
        assert!(entry.is_early_adopter("alice"));
        assert!(!entry.is_early_adopter("carol"));
    }

    #[test]
    fn applies_defaults() {
        let entry: RolloutEntry = RolloutEntry::from_json(&json!({"stable": 1})).unwrap();
        assert_eq!(entry, RolloutEntry::pinned(json!(1)));
        assert_eq!((entry.start_pct, entry.end_pct), (0, 100));
        assert!(entry.early_adopters.is_empty());
    }

    #[test]
    fn missing_stable() {
        let err = RolloutEntry::<serde_json::Value>::from_json(&json!({"new": "x"})).unwrap_err();
        assert_eq!(err, RolloutError::MissingField("stable"));
    }

    #[test]
    fn malformed_fields() {
        for raw in [
            json!({"stable": "a", "start_pct": "ten"}),
            json!({"stable": "a", "early_adopters": "alice"}),
            json!({"stable": "a", "end_time": 5}),
            json!("not an object"),
        ] {
            let err = RolloutEntry::<serde_json::Value>::from_json(&raw).unwrap_err();
            assert!(matches!(err, RolloutError::MalformedEntry(_)), "{raw} gave {err:?}");
        }
    }

    #[test]
    fn null_new_is_a_rollout() {
        let entry: RolloutEntry = RolloutEntry::from_json(&json!({"stable": "S", "new": null})).unwrap();
        assert_eq!(entry.new, Some(serde_json::Value::Null));
        assert_eq!(entry.into_value(Variant::New), serde_json::Value::Null);

        let entry: RolloutEntry = RolloutEntry::from_json(&json!({"stable": "S"})).unwrap();
        assert_eq!(entry.new, None);
    }

    #[test]
    fn typed_values() {
        let raw = json!({"stable": 1, "new": 2, "end_time": "2023-01-01 00:00Z", "duration": "1d"});
        let entry: RolloutEntry<u32> = RolloutEntry::from_json(&raw).unwrap();
        assert_eq!(entry.new, Some(2));
    }

    #[test]
    fn into_value_picks_variant() {
        let entry = RolloutEntry::ramp("a", "b", "2023-01-01 00:00Z", "1h");
        assert_eq!(entry.clone().into_value(Variant::New), "b");
        assert_eq!(entry.into_value(Variant::Stable), "a");
        assert_eq!(RolloutEntry::pinned("a").into_value(Variant::New), "a");
    }

    #[test]
    fn builder_matches_decoded() {
        let built = RolloutEntry::ramp(json!("STABLE"), json!("NEW"), "2010-01-01 01:00:00Z", "1h")
            .with_percent_range(0, 50)
            .with_early_adopters(["zoran"]);
        let decoded = RolloutEntry::from_json(&json!({
            "stable": "STABLE", "new": "NEW",
            "end_pct": 50,
            "end_time": "2010-01-01 01:00:00Z", "duration": "1h",
            "early_adopters": ["zoran"]
        }))
        .unwrap();
        assert_eq!(built, decoded);
    }
}
