//! Local copy of the last fetched rollout document.
//!
//! The cached body is kept together with its ETag so the next fetch can be
//! conditional. A SHA-256 of the body guards against torn or hand-edited
//! files; a record that fails the check is ignored.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ClientResult;
use crate::fetch::content_digest;

/// On-disk cache record.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    etag: Option<String>,
    sha256: String,
    body: String,
}

/// A previously fetched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedDocument {
    pub etag: Option<String>,
    pub body: Bytes,
}

/// File-backed cache for a single rollout document.
#[derive(Debug, Clone)]
pub struct DocumentCache {
    path: PathBuf,
}

impl DocumentCache {
    /// Cache stored at `<dir>/<name>.json`.
    pub fn new(dir: impl Into<PathBuf>, name: &str) -> Self {
        Self {
            path: dir.into().join(format!("{name}.json")),
        }
    }

    /// `$XDG_CACHE_HOME/slowroll`, falling back to `~/.cache/slowroll`.
    pub fn default_dir() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CACHE_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
        Some(base.join("slowroll"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached document, if a valid one exists.
    pub fn load(&self) -> ClientResult<Option<CachedDocument>> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record: CacheRecord = match serde_json::from_slice(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "ignoring unreadable rollout cache");
                return Ok(None);
            }
        };
        if content_digest(record.body.as_bytes()) != record.sha256 {
            warn!(path = ?self.path, "ignoring rollout cache with bad checksum");
            return Ok(None);
        }

        debug!(path = ?self.path, etag = ?record.etag, "loaded cached rollout document");
        Ok(Some(CachedDocument {
            etag: record.etag,
            body: Bytes::from(record.body),
        }))
    }

    /// Replace the cached document. Written to a temp file, then renamed.
    pub fn store(&self, body: &[u8], etag: Option<&str>) -> ClientResult<()> {
        let body = String::from_utf8_lossy(body).into_owned();
        let record = CacheRecord {
            etag: etag.map(str::to_string),
            sha256: content_digest(body.as_bytes()),
            body,
        };

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec(&record)?)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = ?self.path, etag = ?record.etag, "stored rollout document");
        Ok(())
    }

    pub fn clear(&self) -> ClientResult<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
