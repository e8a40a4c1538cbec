//! SlowrollClient — fetch the published document and decide locally.

use serde::de::DeserializeOwned;
use slowroll::{Bucketer, Decider, Decision, RolloutEntry, Sha1Bucketer};
use tracing::{debug, warn};

use crate::cache::DocumentCache;
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::document::RolloutDocument;
use crate::error::{ClientError, ClientResult};
use crate::fetch::{FetchOutcome, Fetcher, SchemeFetcher};

/// Evaluates rollouts from a remotely published document.
///
/// The fetcher, clock and bucketer are injected at construction; tests
/// substitute canned documents, frozen time and fixed buckets.
pub struct SlowrollClient<F, C = SystemClock, B = Sha1Bucketer> {
    url: String,
    fetcher: F,
    clock: C,
    decider: Decider<B>,
    cache: Option<DocumentCache>,
}

impl SlowrollClient<SchemeFetcher> {
    /// Client with the default fetcher, clock and bucketer.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let fetcher = SchemeFetcher::new(config.timeout()?);
        let client = Self::new(&config.url, fetcher, SystemClock, Sha1Bucketer);
        Ok(match config.document_cache() {
            Some(cache) => client.with_cache(cache),
            None => client,
        })
    }
}

impl<F, C, B> SlowrollClient<F, C, B>
where
    F: Fetcher,
    C: Clock,
    B: Bucketer,
{
    pub fn new(url: &str, fetcher: F, clock: C, bucketer: B) -> Self {
        Self {
            url: url.to_string(),
            fetcher,
            clock,
            decider: Decider::new(bucketer),
            cache: None,
        }
    }

    /// Keep the last fetched document (and its ETag) in `cache`.
    pub fn with_cache(mut self, cache: DocumentCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn decider(&self) -> &Decider<B> {
        &self.decider
    }

    /// Fetch the current rollout document.
    ///
    /// With a cache, the request is conditional on the cached ETag and a
    /// not-modified answer is served from the cache. Fetch failures are
    /// returned as-is; stale data is never substituted.
    pub async fn get_config(&self) -> ClientResult<RolloutDocument> {
        let cached = match &self.cache {
            Some(cache) => cache.load()?,
            None => None,
        };
        let etag = cached.as_ref().and_then(|c| c.etag.as_deref());

        match self.fetcher.fetch(&self.url, etag).await? {
            FetchOutcome::Modified { body, etag } => {
                let document = RolloutDocument::from_slice(&body)?;
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.store(&body, etag.as_deref()) {
                        warn!(path = ?cache.path(), error = %e, "failed to cache rollout document");
                    }
                }
                debug!(url = %self.url, etag = ?etag, "using fetched rollout document");
                Ok(document)
            }
            FetchOutcome::NotModified => {
                let cached = cached.ok_or(ClientError::NotModifiedWithoutCache)?;
                debug!(url = %self.url, etag = ?cached.etag, "using cached rollout document");
                RolloutDocument::from_slice(&cached.body)
            }
        }
    }

    /// The value `identity` should see now, or `None` if `section`/`key` is
    /// not configured.
    pub async fn get_value<V>(&self, section: &str, key: &str, identity: &str) -> ClientResult<Option<V>>
    where
        V: DeserializeOwned,
    {
        let document = self.get_config().await?;
        self.value_in(&document, section, key, identity)
    }

    /// Like [`SlowrollClient::get_value`], substituting `default` when the
    /// entry is not configured. Errors are still returned.
    pub async fn get_value_or<V>(&self, section: &str, key: &str, identity: &str, default: V) -> ClientResult<V>
    where
        V: DeserializeOwned,
    {
        Ok(self.get_value(section, key, identity).await?.unwrap_or(default))
    }

    /// Fetch the document and explain the decision for `identity`.
    pub async fn evaluate(&self, section: &str, key: &str, identity: &str) -> ClientResult<Option<Decision>> {
        let document = self.get_config().await?;
        self.decision_in(&document, section, key, identity)
    }

    /// Decide against an already fetched document.
    pub fn value_in<V>(
        &self,
        document: &RolloutDocument,
        section: &str,
        key: &str,
        identity: &str,
    ) -> ClientResult<Option<V>>
    where
        V: DeserializeOwned,
    {
        let Some(entry) = document.entry::<V>(section, key) else {
            return Ok(None);
        };
        let entry = entry?;
        let decision = self.decider.evaluate(identity, &entry, &self.clock.now())?;
        Ok(Some(entry.into_value(decision.variant)))
    }

    /// Explain the decision against an already fetched document.
    pub fn decision_in(
        &self,
        document: &RolloutDocument,
        section: &str,
        key: &str,
        identity: &str,
    ) -> ClientResult<Option<Decision>> {
        let Some(entry) = document.entry::<serde_json::Value>(section, key) else {
            return Ok(None);
        };
        let entry: RolloutEntry = entry?;
        Ok(Some(self.decider.evaluate(identity, &entry, &self.clock.now())?))
    }
}
