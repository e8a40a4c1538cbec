//! The published rollout document: section → key → rollout entry.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use slowroll::{RolloutEntry, RolloutResult};

use crate::error::ClientResult;

/// A decoded rollout document.
///
/// ```json
/// { "rollouts": { "some-cli": { "stable": "1.0", "new": "1.1a", ... } } }
/// ```
///
/// Sections and entries stay as raw JSON until looked up, so one malformed
/// section or entry does not make the rest of the document unusable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RolloutDocument {
    sections: BTreeMap<String, Value>,
}

impl RolloutDocument {
    pub fn from_slice(bytes: &[u8]) -> ClientResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Keys of `section`. A section that is not an object has none.
    pub fn keys(&self, section: &str) -> impl Iterator<Item = &str> {
        self.sections
            .get(section)
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|keys| keys.keys().map(String::as_str))
    }

    /// The raw mapping for `section`/`key`, if it is configured.
    ///
    /// An empty object counts as not configured, as does any key of a
    /// section that is not an object.
    pub fn raw(&self, section: &str, key: &str) -> Option<&Value> {
        self.sections
            .get(section)?
            .as_object()?
            .get(key)
            .filter(|raw| !is_empty_object(raw))
    }

    /// Decode the entry for `section`/`key`. `None` if it is not configured.
    pub fn entry<V: DeserializeOwned>(
        &self,
        section: &str,
        key: &str,
    ) -> Option<RolloutResult<RolloutEntry<V>>> {
        self.raw(section, key).map(RolloutEntry::from_json)
    }
}

fn is_empty_object(raw: &Value) -> bool {
    raw.as_object().is_some_and(|map| map.is_empty())
}
