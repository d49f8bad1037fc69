//! Delegation report retrieval.
//!
//! [`ReportFetcher`] downloads a report over HTTP(S), transparently
//! decompresses gzip bodies, and optionally keeps the last report in a cache
//! directory so that an unchanged report is revalidated with a conditional
//! request (`If-None-Match` / 304) instead of downloaded again.

use flate2::read::GzDecoder;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::metadata::FetchMetadata;
use crate::{Error, Result};

/// Default APNIC delegation report.
pub const DEFAULT_REPORT_URL: &str = "http://ftp.apnic.net/apnic/stats/apnic/delegated-apnic-latest";

/// Fetches delegation report text.
pub struct ReportFetcher {
    /// Directory for the cached report and its metadata
    cache_dir: Option<PathBuf>,
    /// Per-request timeout
    timeout: Duration,
}

impl ReportFetcher {
    /// Create a fetcher without a cache.
    pub fn new() -> Self {
        Self {
            cache_dir: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Keep the last fetched report in `cache_dir`.
    pub fn with_cache_dir(mut self, cache_dir: &Path) -> Self {
        self.cache_dir = Some(cache_dir.to_path_buf());
        self
    }

    /// Set a custom request timeout (default 60 seconds).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn report_path(&self) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| dir.join("report.txt"))
    }

    fn metadata_path(&self) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| dir.join("report.meta"))
    }

    /// Fetch the report text at `url`.
    pub fn fetch(&self, url: &str) -> Result<String> {
        if let Some(dir) = &self.cache_dir {
            fs::create_dir_all(dir)?;
        }

        let cached = self.cached_metadata(url);

        let mut request = ureq::get(url).timeout(self.timeout);
        if let Some(etag) = cached.as_ref().and_then(|meta| meta.etag.as_deref()) {
            request = request.set("If-None-Match", etag);
        }

        let response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::Status(304, _)) => {
                if let Some(mut meta) = cached {
                    log::info!("Report not modified (304), using cached copy");
                    let text = self.read_cached()?;
                    meta.touch();
                    self.save_metadata(&meta)?;
                    return Ok(text);
                }
                return Err(Error::Fetch(format!("unexpected 304 from {}", url)));
            }
            Err(ureq::Error::Status(code, _)) => {
                return Err(Error::Fetch(format!("HTTP error {} from {}", code, url)))
            }
            Err(ureq::Error::Transport(t)) => {
                return Err(Error::Fetch(format!("transport error: {}", t)))
            }
        };

        let etag = response.header("ETag").map(str::to_string);

        let mut raw = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut raw)
            .map_err(|e| Error::Fetch(format!("failed to read response: {}", e)))?;
        log::info!("Downloaded {} bytes from {}", raw.len(), url);

        let text = decode_report(raw)?;

        if self.cache_dir.is_some() {
            self.store(&text)?;
            self.save_metadata(&FetchMetadata::now(url, etag, text.len()))?;
        }

        Ok(text)
    }

    /// Metadata of a usable cached copy of `url`.
    fn cached_metadata(&self, url: &str) -> Option<FetchMetadata> {
        let meta_path = self.metadata_path()?;
        let report_path = self.report_path()?;
        if !report_path.exists() {
            return None;
        }
        match FetchMetadata::load(&meta_path) {
            Ok(Some(meta)) if meta.is_for(url) => {
                log::debug!("Cached report is {}s old", meta.age().as_secs());
                Some(meta)
            }
            Ok(_) => None,
            Err(e) => {
                log::warn!("Ignoring unreadable fetch metadata: {}", e);
                None
            }
        }
    }

    fn read_cached(&self) -> Result<String> {
        let path = self
            .report_path()
            .ok_or_else(|| Error::Config("no cache directory".to_string()))?;
        Ok(fs::read_to_string(path)?)
    }

    /// Replace the cached report through a temp file and rename.
    fn store(&self, text: &str) -> Result<()> {
        let (Some(dir), Some(path)) = (&self.cache_dir, self.report_path()) else {
            return Ok(());
        };
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(text.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    fn save_metadata(&self, meta: &FetchMetadata) -> Result<()> {
        match self.metadata_path() {
            Some(path) => meta.save(path),
            None => Ok(()),
        }
    }
}

impl Default for ReportFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a report from a local file, gunzipping it when needed.
pub fn read_report_file(path: &Path) -> Result<String> {
    let raw = fs::read(path)?;
    log::info!("Read {} bytes from {:?}", raw.len(), path);
    decode_report(raw)
}

/// Turn raw report bytes into text.
fn decode_report(raw: Vec<u8>) -> Result<String> {
    let data = if is_gzip(&raw) {
        let mut decoder = GzDecoder::new(&raw[..]);
        let mut data = Vec::new();
        decoder
            .read_to_end(&mut data)
            .map_err(|e| Error::Fetch(format!("gzip decompression failed: {}", e)))?;
        data
    } else {
        raw
    };
    String::from_utf8(data).map_err(|_| Error::Fetch("report is not valid UTF-8".to_string()))
}

/// Check if data is gzip compressed.
fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    const REPORT: &str = "2|apnic|1|1|19830613|20231231|+1000\napnic|CN|ipv4|1.0.0.0|256|20100101|allocated\n";

    #[test]
    fn test_decode_plain() {
        assert_eq!(decode_report(REPORT.as_bytes().to_vec()).unwrap(), REPORT);
    }

    #[test]
    fn test_decode_gzip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(REPORT.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();
        assert!(is_gzip(&compressed));
        assert_eq!(decode_report(compressed).unwrap(), REPORT);
    }

    #[test]
    fn test_decode_invalid_utf8() {
        assert!(matches!(decode_report(vec![0xff, 0xfe, 0x00]), Err(Error::Fetch(_))));
    }

    #[test]
    fn test_read_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delegated-apnic-latest.gz");
        let mut encoder = GzEncoder::new(fs::File::create(&path).unwrap(), Compression::default());
        encoder.write_all(REPORT.as_bytes()).unwrap();
        encoder.finish().unwrap();

        assert_eq!(read_report_file(&path).unwrap(), REPORT);
    }

    #[test]
    fn test_cache_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ReportFetcher::new().with_cache_dir(dir.path());
        assert!(fetcher.cached_metadata(DEFAULT_REPORT_URL).is_none());

        fetcher.store(REPORT).unwrap();
        fetcher
            .save_metadata(&FetchMetadata::now(DEFAULT_REPORT_URL, Some("\"v1\"".to_string()), REPORT.len()))
            .unwrap();

        let meta = fetcher.cached_metadata(DEFAULT_REPORT_URL).unwrap();
        assert_eq!(meta.etag.as_deref(), Some("\"v1\""));
        assert!(fetcher.cached_metadata("http://example.com/other").is_none());
        assert_eq!(fetcher.read_cached().unwrap(), REPORT);
    }

    #[test]
    fn test_unreachable_url_is_fetch_error() {
        let fetcher = ReportFetcher::new().with_timeout(Duration::from_secs(2));
        assert!(matches!(fetcher.fetch("http://127.0.0.1:1/report"), Err(Error::Fetch(_))));
    }
}
