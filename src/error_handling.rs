//! Error types and rejection statistics.
//!
//! Validation rejections are outcomes, not errors: the gateway's public
//! surface returns booleans and never propagates failures caused by
//! attacker-supplied input. The only fallible surface is construction, which
//! gets typed errors here. Rejections are tracked per reason with atomic
//! counters so operators can see what the gateway is turning away.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;
use tokio_retry::strategy::ExponentialBackoff;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing an HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// A configured site or uploads base URL did not parse.
    #[error("Invalid base URL '{url}': {source}")]
    BaseUrlError {
        /// The offending configured URL.
        url: String,
        /// The underlying parse error.
        source: url::ParseError,
    },
}

/// Reasons a candidate URL can be rejected by the gateway.
///
/// Each variant represents a distinct terminal decision in the validation
/// pipeline, counted separately for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum RejectionReason {
    /// Nothing left after sanitization.
    EmptyUrl,
    /// The sanitized string did not parse as a URL.
    UnparsableUrl,
    /// The URL parsed but carried no host component.
    MissingHost,
    /// Scheme other than http or https.
    DisallowedScheme,
    /// The host itself classified as loopback, link-local, private, or an
    /// internal hostname.
    InternalAddress,
    /// DNS resolution failed or resolved to a non-public address.
    DnsValidationFailed,
}

impl RejectionReason {
    /// Human-readable label for logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::EmptyUrl => "empty URL",
            RejectionReason::UnparsableUrl => "unparsable URL",
            RejectionReason::MissingHost => "missing host",
            RejectionReason::DisallowedScheme => "disallowed scheme",
            RejectionReason::InternalAddress => "internal address",
            RejectionReason::DnsValidationFailed => "DNS validation failed",
        }
    }
}

/// Thread-safe rejection counters.
///
/// Tracks the count of each rejection reason using atomic counters, allowing
/// concurrent access from multiple requests. All reasons are initialized to
/// zero on creation, so lookups never miss.
pub struct RejectionStats {
    counts: HashMap<RejectionReason, AtomicUsize>,
}

impl RejectionStats {
    /// Creates a tracker with every reason zeroed.
    pub fn new() -> Self {
        let mut counts = HashMap::new();
        for reason in RejectionReason::iter() {
            counts.insert(reason, AtomicUsize::new(0));
        }
        RejectionStats { counts }
    }

    /// Increments the counter for one reason.
    pub fn increment(&self, reason: RejectionReason) {
        // All RejectionReason variants are initialized in new(), so unwrap() is safe
        self.counts
            .get(&reason)
            .unwrap()
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Reads the current count for one reason.
    pub fn get_count(&self, reason: RejectionReason) -> usize {
        // All RejectionReason variants are initialized in new(), so unwrap() is safe
        self.counts.get(&reason).unwrap().load(Ordering::SeqCst)
    }
}

impl Default for RejectionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates an exponential backoff retry strategy for the size probe.
///
/// Configured with:
/// - Initial delay: `RETRY_INITIAL_DELAY_MS` milliseconds
/// - Backoff factor: `RETRY_FACTOR` (doubles delay each retry)
/// - Maximum delay: `RETRY_MAX_DELAY_SECS` seconds
pub fn get_retry_strategy() -> ExponentialBackoff {
    ExponentialBackoff::from_millis(crate::config::RETRY_INITIAL_DELAY_MS)
        .factor(crate::config::RETRY_FACTOR)
        .max_delay(Duration::from_secs(crate::config::RETRY_MAX_DELAY_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_stats_initialization() {
        let stats = RejectionStats::new();
        for reason in RejectionReason::iter() {
            assert_eq!(stats.get_count(reason), 0);
        }
    }

    #[test]
    fn test_rejection_stats_increment() {
        let stats = RejectionStats::new();
        stats.increment(RejectionReason::DisallowedScheme);
        assert_eq!(stats.get_count(RejectionReason::DisallowedScheme), 1);
        assert_eq!(stats.get_count(RejectionReason::InternalAddress), 0);
    }

    #[test]
    fn test_rejection_stats_multiple_increments() {
        let stats = RejectionStats::new();
        stats.increment(RejectionReason::InternalAddress);
        stats.increment(RejectionReason::InternalAddress);
        stats.increment(RejectionReason::InternalAddress);
        assert_eq!(stats.get_count(RejectionReason::InternalAddress), 3);
    }
}
