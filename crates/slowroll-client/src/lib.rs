//! slowroll-client — everything around the core decision.
//!
//! Fetches the published rollout document (conditionally, by ETag), keeps a
//! local copy, and evaluates entries with the `slowroll` decider at the
//! current time.
//!
//! # Architecture
//!
//! ```text
//! SlowrollClient
//!   ├── Fetcher        (HttpFetcher, FileFetcher, SchemeFetcher)
//!   ├── DocumentCache  (body + ETag + SHA-256 on disk)
//!   ├── Clock          (SystemClock or a closure)
//!   └── Decider<B>     (slowroll core, pluggable Bucketer)
//! ```

pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod document;
pub mod error;
pub mod fetch;

pub use cache::{CachedDocument, DocumentCache};
pub use client::SlowrollClient;
pub use clock::{Clock, SystemClock};
pub use config::ClientConfig;
pub use document::RolloutDocument;
pub use error::{ClientError, ClientResult};
pub use fetch::{FetchOutcome, Fetcher, FileFetcher, HttpFetcher, SchemeFetcher};
