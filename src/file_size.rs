//! Cached byte-size metadata for remote episode files.
//!
//! Feeds, players, and download headers all want the file size without
//! paying a network round trip per render. The resolver memoizes one probe
//! per `(episode, url)` pair; the cache is read-through and only ever
//! invalidated explicitly by the caller.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio_retry::Retry;
use url::Url;

use crate::cache::{file_size_key, UrlCache};
use crate::config::GatewayConfig;
use crate::error_handling::{get_retry_strategy, InitializationError};
use crate::initialization::init_probe_client;
use crate::trusted::TrustedDomains;

/// Size metadata for one remote file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSize {
    /// Exact size in bytes.
    pub raw_bytes: u64,
    /// Human-readable rendering, 1024-based.
    pub formatted: String,
}

impl FileSize {
    /// Builds a record from a byte count.
    pub fn from_bytes(bytes: u64) -> Self {
        FileSize {
            raw_bytes: bytes,
            formatted: format_file_size(bytes),
        }
    }
}

/// Renders a byte count for display, e.g. `2048` becomes `"2.0 KB"`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

/// Resolves and memoizes remote file sizes.
pub struct FileSizeResolver {
    client: Arc<reqwest::Client>,
    trusted: Arc<TrustedDomains>,
    cache: Arc<dyn UrlCache>,
}

impl FileSizeResolver {
    /// Creates a resolver sharing the gateway's trusted set and cache.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` when the probe client
    /// cannot be built.
    pub fn new(
        config: &GatewayConfig,
        trusted: Arc<TrustedDomains>,
        cache: Arc<dyn UrlCache>,
    ) -> Result<Self, InitializationError> {
        Ok(FileSizeResolver {
            client: init_probe_client(config)?,
            trusted,
            cache,
        })
    }

    /// Returns the size record for an episode's file, probing at most once.
    ///
    /// A cached record is returned unchanged even if a fresh probe might
    /// differ; invalidation is the caller's responsibility. Trusted hosts
    /// get a single cheap HEAD request; everything else gets the HEAD plus
    /// ranged-GET fallback under the shared retry strategy. Returns `None`
    /// when the size genuinely cannot be determined, which callers must
    /// treat as "unknown" rather than as zero or as an error.
    pub async fn size_for(&self, episode_id: u64, url: &str) -> Option<FileSize> {
        let key = file_size_key(episode_id, url);
        if let Some(cached) = self.cache.get(&key) {
            match serde_json::from_str::<FileSize>(&cached) {
                Ok(record) => return Some(record),
                Err(e) => log::warn!("discarding undecodable cached size record: {e}"),
            }
        }

        let host = Url::parse(url).ok()?.host_str()?.to_string();

        let probed = if self.trusted.is_trusted(&host) {
            self.head_content_length(url).await
        } else {
            self.remote_probe_with_retry(url).await
        };

        let bytes = match probed {
            Ok(bytes) => bytes,
            Err(e) => {
                log::debug!("file size probe failed for {url}: {e:#}");
                return None;
            }
        };

        let record = FileSize::from_bytes(bytes);
        match serde_json::to_string(&record) {
            Ok(encoded) => self.cache.set(&key, &encoded, None),
            Err(e) => log::warn!("failed to encode size record for caching: {e}"),
        }
        Some(record)
    }

    async fn head_content_length(&self, url: &str) -> Result<u64> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .context("HEAD request failed")?;
        response
            .error_for_status_ref()
            .context("HEAD request returned an error status")?;
        content_length_header(&response).context("no Content-Length in HEAD response")
    }

    async fn remote_probe_with_retry(&self, url: &str) -> Result<u64> {
        let strategy = get_retry_strategy().take(crate::config::RETRY_MAX_ATTEMPTS);
        let client = Arc::clone(&self.client);
        let url = url.to_string();
        Retry::spawn(strategy, move || {
            let client = Arc::clone(&client);
            let url = url.clone();
            async move { probe_remote_size(&client, &url).await }
        })
        .await
    }
}

/// One probe attempt: HEAD first, then a one-byte ranged GET for hosts that
/// omit Content-Length on HEAD responses.
async fn probe_remote_size(client: &reqwest::Client, url: &str) -> Result<u64> {
    if let Ok(response) = client.head(url).send().await {
        if response.status().is_success() {
            if let Some(len) = content_length_header(&response) {
                return Ok(len);
            }
        }
    }

    let response = client
        .get(url)
        .header(reqwest::header::RANGE, "bytes=0-0")
        .send()
        .await
        .context("ranged GET failed")?;
    response
        .error_for_status_ref()
        .context("ranged GET returned an error status")?;

    if let Some(total) = response
        .headers()
        .get(reqwest::header::CONTENT_RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_range_total)
    {
        return Ok(total);
    }

    content_length_header(&response).context("remote host did not expose a file size")
}

fn content_length_header(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
        .filter(|len| *len > 0)
}

/// Parses the total out of a `Content-Range` value like `bytes 0-0/12345`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size_bytes() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
    }

    #[test]
    fn test_format_file_size_units() {
        assert_eq!(format_file_size(2048), "2.0 KB");
        assert_eq!(format_file_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_file_size(44_040_192), "42.0 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("bytes 0-0/12345"), Some(12345));
        assert_eq!(parse_content_range_total("bytes 0-0/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn test_file_size_record_round_trips_through_cache_encoding() {
        let record = FileSize::from_bytes(2048);
        let encoded = serde_json::to_string(&record).unwrap();
        let decoded: FileSize = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.formatted, "2.0 KB");
    }
}
