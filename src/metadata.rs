//! Sidecar metadata of a cached delegation report.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::{Error, Result};

/// What was fetched, from where and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchMetadata {
    /// Source URL of the cached report
    pub url: String,
    /// ETag returned by the server, used for conditional requests
    pub etag: Option<String>,
    /// Unix seconds of the last successful fetch or revalidation
    pub fetched_at: u64,
    /// Size of the decoded report text in bytes
    pub size: usize,
}

impl FetchMetadata {
    /// Metadata for a report fetched just now.
    pub fn now(url: &str, etag: Option<String>, size: usize) -> Self {
        Self {
            url: url.to_string(),
            etag,
            fetched_at: unix_now(),
            size,
        }
    }

    /// Load metadata, `None` if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        let meta = serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        Ok(Some(meta))
    }

    /// Save metadata as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Record a successful revalidation (HTTP 304).
    pub fn touch(&mut self) {
        self.fetched_at = unix_now();
    }

    /// Time elapsed since the last fetch.
    pub fn age(&self) -> Duration {
        Duration::from_secs(unix_now().saturating_sub(self.fetched_at))
    }

    /// Whether the cached copy belongs to `url`.
    pub fn is_for(&self, url: &str) -> bool {
        self.url == url
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
