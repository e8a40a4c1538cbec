//! `slowroll decide` — evaluate one rollout entry for one identity.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use slowroll::{Decision, Sha1Bucketer};
use slowroll_client::{ClientConfig, SchemeFetcher, SlowrollClient};
use tracing::debug;

/// Where the rollout document comes from.
pub struct Source {
    pub config: Option<PathBuf>,
    pub url: Option<String>,
    pub file: Option<PathBuf>,
}

pub struct Request {
    pub section: String,
    pub key: String,
    pub identity: String,
    pub now: Option<String>,
    pub default: Option<String>,
}

/// Build the client configuration: flags override the configuration file.
pub fn resolve_config(source: &Source) -> Result<ClientConfig> {
    let mut config = match &source.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => ClientConfig::new(""),
    };
    if let Some(url) = &source.url {
        config.url = url.clone();
    }
    if let Some(file) = &source.file {
        config.url = file.display().to_string();
    }
    if config.url.is_empty() {
        bail!("no rollout document given: use --url, --file or --config");
    }
    Ok(config)
}

pub async fn decide(source: Source, request: Request, format: &str) -> Result<()> {
    let config = resolve_config(&source)?;
    let now = request
        .now
        .as_deref()
        .map(slowroll::parse_timestamp)
        .transpose()?;
    let default = request
        .default
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--default must be a JSON value")?;

    let clock = frozen_clock(now);
    let mut client = SlowrollClient::new(
        &config.url,
        SchemeFetcher::new(config.timeout()?),
        clock,
        Sha1Bucketer,
    );
    if let Some(cache) = config.document_cache() {
        debug!(path = ?cache.path(), "using rollout cache");
        client = client.with_cache(cache);
    }

    let document = client.get_config().await?;
    let decision = client.decision_in(&document, &request.section, &request.key, &request.identity)?;
    let value: Option<Value> = client.value_in(&document, &request.section, &request.key, &request.identity)?;

    let Some(value) = value.or(default) else {
        bail!(
            "no rollout configured for {}/{}",
            request.section,
            request.key
        );
    };

    match format {
        "json" => {
            let report = report(&request, &value, decision.as_ref(), clock());
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => println!("{}", render_value(&value)),
    }
    Ok(())
}

/// A clock that reads the system time at most once, so the decision, the
/// value and the report all agree on `now`.
fn frozen_clock(now: Option<DateTime<Utc>>) -> impl Fn() -> DateTime<Utc> + Copy + Send + Sync {
    let now = now.unwrap_or_else(Utc::now);
    move || now
}

fn report(request: &Request, value: &Value, decision: Option<&Decision>, now: DateTime<Utc>) -> Value {
    json!({
        "section": request.section,
        "key": request.key,
        "identity": request.identity,
        "now": now,
        "value": value,
        "decision": decision,
    })
}

/// Strings print bare; everything else prints as JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
