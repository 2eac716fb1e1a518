use std::path::{Path, PathBuf};

use anyhow::Context;
use http::StatusCode;
use respcache_entry::{CacheEntry, CachePolicy, unix_now};
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::response::{RawResponse, parse_http1_response};

pub const USAGE: &str = "usage:
  respcache check <response-file>
  respcache store <response-file> <entry-file>
  respcache inspect <entry-file>
  respcache revalidate <entry-file> <response-file>";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Check { response: PathBuf },
    Store { response: PathBuf, entry: PathBuf },
    Inspect { entry: PathBuf },
    Revalidate { entry: PathBuf, response: PathBuf },
}

impl Command {
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let command = match args.as_slice() {
            ["check", response] => Command::Check {
                response: response.into(),
            },
            ["store", response, entry] => Command::Store {
                response: response.into(),
                entry: entry.into(),
            },
            ["inspect", entry] => Command::Inspect {
                entry: entry.into(),
            },
            ["revalidate", entry, response] => Command::Revalidate {
                entry: entry.into(),
                response: response.into(),
            },
            _ => anyhow::bail!("{USAGE}"),
        };
        Ok(command)
    }

    /// Execute the command and return the summary of the resulting entry.
    pub async fn run(self, policy: &CachePolicy) -> anyhow::Result<EntrySummary> {
        let now = unix_now();
        match self {
            Command::Check { response } => {
                let entry = load_response(&response, policy, now).await?;
                Ok(EntrySummary::new(&entry, policy, now))
            }
            Command::Store { response, entry: entry_path } => {
                let entry = load_response(&response, policy, now).await?;
                let summary = EntrySummary::new(&entry, policy, now);
                if summary.can_cache {
                    write_entry(&entry_path, &entry).await?;
                } else {
                    info!(
                        target: "respcache::store",
                        path = %entry_path.display(),
                        "Response not cacheable; nothing stored"
                    );
                }
                Ok(summary)
            }
            Command::Inspect { entry } => {
                let entry = read_entry(&entry).await?;
                Ok(EntrySummary::new(&entry, policy, now))
            }
            Command::Revalidate {
                entry: entry_path,
                response,
            } => {
                let stored = read_entry(&entry_path).await?;
                let raw = read_response(&response).await?;
                let next = apply_revalidation(&stored, raw, policy, now)?;
                write_entry(&entry_path, &next).await?;
                Ok(EntrySummary::new(&next, policy, now))
            }
        }
    }
}

/// Fold a revalidation response into a stored entry.
///
/// A 304 merges headers into the stored entry. Any other cacheable response
/// is a full refresh and replaces the entry, body included.
pub fn apply_revalidation(
    stored: &CacheEntry,
    raw: RawResponse,
    policy: &CachePolicy,
    now: u64,
) -> anyhow::Result<CacheEntry> {
    if raw.status == StatusCode::NOT_MODIFIED {
        return Ok(stored.revalidated_with(&raw.headers, policy, now));
    }

    let fresh = CacheEntry::with_policy_at(raw.status, raw.headers, raw.body, policy, now);
    if !fresh.can_cache_with(policy) {
        anyhow::bail!(
            "revalidation returned {} which is not cacheable; stored entry left unchanged",
            fresh.status()
        );
    }
    warn!(
        target: "respcache::store",
        status = %fresh.status(),
        "Origin sent a full response; replacing stored entry"
    );
    Ok(fresh)
}

/// Machine-readable view of an entry and the decisions made about it.
#[derive(Debug, Serialize)]
pub struct EntrySummary {
    pub status: u16,
    pub stored_at: u64,
    pub max_age: u64,
    pub age: u64,
    pub remaining: u64,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub can_cache: bool,
    pub expired: bool,
    pub body_bytes: usize,
    pub headers: Vec<(String, String)>,
}

impl EntrySummary {
    pub fn new(entry: &CacheEntry, policy: &CachePolicy, now: u64) -> Self {
        Self {
            status: entry.status().as_u16(),
            stored_at: entry.stored_at(),
            max_age: entry.max_age(),
            age: entry.age_at(now),
            remaining: entry.remaining_at(now),
            etag: entry.etag().map(str::to_string),
            last_modified: entry.last_modified().map(str::to_string),
            can_cache: entry.can_cache_with(policy),
            expired: entry.is_expired_at(now),
            body_bytes: entry.body().len(),
            headers: entry
                .headers()
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        }
    }
}

async fn read_response(path: &Path) -> anyhow::Result<RawResponse> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("reading response file '{}'", path.display()))?;
    parse_http1_response(&bytes).with_context(|| format!("parsing '{}'", path.display()))
}

async fn load_response(
    path: &Path,
    policy: &CachePolicy,
    now: u64,
) -> anyhow::Result<CacheEntry> {
    let raw = read_response(path).await?;
    Ok(CacheEntry::with_policy_at(
        raw.status, raw.headers, raw.body, policy, now,
    ))
}

async fn read_entry(path: &Path) -> anyhow::Result<CacheEntry> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("reading entry file '{}'", path.display()))?;
    let entry = CacheEntry::decode(&bytes)
        .with_context(|| format!("decoding entry file '{}'", path.display()))?;
    debug!(target: "respcache::store", path = %path.display(), "Loaded entry");
    Ok(entry)
}

async fn write_entry(path: &Path, entry: &CacheEntry) -> anyhow::Result<()> {
    let record = entry
        .encode()
        .with_context(|| format!("encoding entry for '{}'", path.display()))?;
    fs::write(path, record)
        .await
        .with_context(|| format!("writing entry file '{}'", path.display()))?;
    debug!(target: "respcache::store", path = %path.display(), "Stored entry");
    Ok(())
}
