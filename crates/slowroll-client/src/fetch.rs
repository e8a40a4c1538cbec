//! Document fetchers — conditional retrieval of the rollout document.
//!
//! A fetcher is handed the ETag of the copy the caller already holds and
//! either returns a fresh body or reports that nothing changed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{StatusCode, Uri, header};
use http_body_util::{BodyExt, Empty};
use hyper_util::rt::TokioIo;
use sha2::{Digest, Sha256};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Outcome of a conditional fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A new body, with the ETag to send next time.
    Modified { body: Bytes, etag: Option<String> },
    /// The copy identified by the previous ETag is still current.
    NotModified,
}

/// Retrieves the rollout document, honoring a previous ETag.
pub trait Fetcher: Send + Sync {
    fn fetch(
        &self,
        url: &str,
        etag: Option<&str>,
    ) -> impl Future<Output = ClientResult<FetchOutcome>> + Send;
}

impl<T: Fetcher> Fetcher for Arc<T> {
    fn fetch(
        &self,
        url: &str,
        etag: Option<&str>,
    ) -> impl Future<Output = ClientResult<FetchOutcome>> + Send {
        (**self).fetch(url, etag)
    }
}

/// Hex SHA-256 of a document body.
pub(crate) fn content_digest(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Plain HTTP/1.1 fetcher using `If-None-Match`.
///
/// Only `http://` URLs are supported.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
}

impl HttpFetcher {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn exchange(&self, uri: &Uri, etag: Option<&str>) -> ClientResult<FetchOutcome> {
        let authority = uri.authority().ok_or_else(|| ClientError::InvalidUrl {
            url: uri.to_string(),
            reason: "missing host".to_string(),
        })?;
        let host = authority.host().trim_start_matches('[').trim_end_matches(']');
        let port = authority.port_u16().unwrap_or(80);

        let stream = TcpStream::connect((host, port)).await?;
        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "rollout fetch connection closed with error");
            }
        });

        let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
        let mut req = http::Request::builder()
            .method(http::Method::GET)
            .uri(path)
            .header(header::HOST, authority.as_str())
            .header(header::USER_AGENT, concat!("slowroll/", env!("CARGO_PKG_VERSION")));
        if let Some(etag) = etag {
            req = req.header(header::IF_NONE_MATCH, etag);
        }
        let req = req
            .body(Empty::<Bytes>::new())
            .map_err(|e| ClientError::Http(e.to_string()))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;
        let status = resp.status();
        let new_etag = resp
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if status == StatusCode::NOT_MODIFIED {
            debug!(%uri, "rollout document not modified");
            return Ok(FetchOutcome::NotModified);
        }

        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?
            .to_bytes();

        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        debug!(%uri, etag = ?new_etag, bytes = body.len(), "fetched rollout document");
        Ok(FetchOutcome::Modified {
            body,
            etag: new_etag,
        })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, etag: Option<&str>) -> ClientResult<FetchOutcome> {
        let uri: Uri = url.parse().map_err(|e: http::uri::InvalidUri| ClientError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        match uri.scheme_str() {
            Some("http") => {}
            Some(other) => return Err(ClientError::UnsupportedScheme(other.to_string())),
            None => {
                return Err(ClientError::InvalidUrl {
                    url: url.to_string(),
                    reason: "missing scheme".to_string(),
                });
            }
        }

        tokio::time::timeout(self.timeout, self.exchange(&uri, etag))
            .await
            .map_err(|_| ClientError::Timeout(url.to_string()))?
    }
}

/// Reads the document from the local filesystem.
///
/// The ETag is the hex SHA-256 of the file contents, so an unchanged file
/// reports `NotModified`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl Fetcher for FileFetcher {
    async fn fetch(&self, url: &str, etag: Option<&str>) -> ClientResult<FetchOutcome> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        let body = tokio::fs::read(path).await?;
        let digest = content_digest(&body);
        if etag == Some(digest.as_str()) {
            debug!(path, "rollout file unchanged");
            return Ok(FetchOutcome::NotModified);
        }
        Ok(FetchOutcome::Modified {
            body: Bytes::from(body),
            etag: Some(digest),
        })
    }
}

/// Picks [`HttpFetcher`] or [`FileFetcher`] from the URL.
///
/// `http://` and `https://` go to the HTTP fetcher (which rejects the
/// latter); `file://` URLs and bare paths are read from disk.
#[derive(Debug, Clone, Default)]
pub struct SchemeFetcher {
    http: HttpFetcher,
    file: FileFetcher,
}

impl SchemeFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: HttpFetcher::new(timeout),
            file: FileFetcher,
        }
    }
}

impl Fetcher for SchemeFetcher {
    async fn fetch(&self, url: &str, etag: Option<&str>) -> ClientResult<FetchOutcome> {
        if url.contains("://") && !url.starts_with("file://") {
            self.http.fetch(url, etag).await
        } else {
            self.file.fetch(url, etag).await
        }
    }
}
