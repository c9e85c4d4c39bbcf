//! Constants and configuration for the validation gateway.

use std::time::Duration;

use clap::{Parser, ValueEnum};

// Cache lifetimes
/// How long a validation outcome stays cached for a given URL.
///
/// Outcomes are cheap to recompute for trusted hosts, but the DNS fallback
/// path is not, so cached verdicts are kept for half a day.
pub const VALIDATION_CACHE_TTL_SECS: u64 = 12 * 60 * 60;
/// How long a DNS safety verdict stays cached per hostname.
///
/// Shorter than the outcome TTL: a hostname that gets re-pointed should not
/// keep a stale verdict for long.
pub const DNS_CACHE_TTL_SECS: u64 = 60 * 60;

// Network operation timeouts
/// DNS query timeout in seconds.
///
/// Validation runs inside the file-serving request path, so a slow or
/// unresponsive DNS server must not be allowed to stall it.
pub const DNS_TIMEOUT_SECS: u64 = 5;
/// Remote file size probe timeout in seconds.
pub const PROBE_TIMEOUT_SECS: u64 = 5;
/// Maximum concurrent DNS lookups across the process.
pub const MAX_DNS_CONCURRENCY: usize = 64;
/// Maximum redirect hops the size probe client will follow.
pub const MAX_REDIRECT_HOPS: usize = 5;

// Retry strategy (remote size probe)
/// Initial delay in milliseconds before the first probe retry.
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;
/// Factor by which the retry delay is multiplied on each attempt.
pub const RETRY_FACTOR: u64 = 2;
/// Maximum delay between probe retries in seconds.
pub const RETRY_MAX_DELAY_SECS: u64 = 2;
/// Maximum number of probe retries after the initial attempt.
pub const RETRY_MAX_ATTEMPTS: usize = 2;

/// Default User-Agent for size probe requests.
pub const DEFAULT_USER_AGENT: &str = concat!("media_gateway/", env!("CARGO_PKG_VERSION"));

/// Podcast media hosts that are always trusted.
///
/// Subdomains of these are trusted as well (`cdn.castos.com`,
/// `media.blubrry.com`, `bucket.s3.amazonaws.com`). The operator's own site
/// and uploads hostnames are appended at construction time from
/// [`GatewayConfig`].
pub const TRUSTED_MEDIA_DOMAINS: &[&str] = &[
    "castos.com",
    "blubrry.com",
    "s3.amazonaws.com",
    "cloudfront.net",
];

/// Hostname suffixes that always classify as internal.
pub const INTERNAL_HOST_SUFFIXES: &[&str] = &[".localhost", ".localdomain", ".local", ".internal"];

/// Cloud metadata-service hostnames, blocked outright.
pub const METADATA_HOSTNAMES: &[&str] = &["metadata.google.internal", "instance-data", "metadata"];

// Proxy header names consumed by the client IP resolver
/// CDN-specific connecting-IP header (highest precedence).
pub const HEADER_CF_CONNECTING_IP: &str = "CF-Connecting-IP";
/// Standard forwarded-for chain header; the left-most entry is the client.
pub const HEADER_X_FORWARDED_FOR: &str = "X-Forwarded-For";

/// Sentinel returned when no client IP candidate validates.
pub const UNKNOWN_CLIENT_IP: &str = "unknown";

/// Referrer value sent by synthetic health-check requests.
///
/// Downloads carrying this referrer are never counted as real listens.
pub const HEALTH_CHECK_REFERRER: &str = "test-nginx";

// Cache key namespaces
/// Prefix for per-URL validation outcome entries.
pub const VALIDATION_KEY_PREFIX: &str = "media_gateway_url_";
/// Prefix for per-host DNS verdict entries.
pub const DNS_KEY_PREFIX: &str = "media_gateway_dns_";
/// Prefix for per-(episode, url) file size entries.
pub const FILE_SIZE_KEY_PREFIX: &str = "media_gateway_size_";

/// Cached flag meaning "validated".
pub const CACHE_FLAG_VALID: &str = "1";
/// Cached flag meaning "rejected".
pub const CACHE_FLAG_INVALID: &str = "0";

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to
/// most verbose (Trace). Used with the `--log-level` CLI option.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Informational messages and above.
    Info,
    /// Debug detail, including per-URL rejection reasons.
    Debug,
    /// Everything.
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: human-readable format with colors (default)
/// - `Json`: structured JSON lines for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, colored.
    Plain,
    /// JSON lines.
    Json,
}

/// Command-line options for the `media_gateway` binary.
///
/// # Examples
///
/// ```bash
/// # Validate a couple of candidate URLs
/// media_gateway https://cdn.castos.com/ep1.mp3 http://10.0.0.1/secret
///
/// # Trust the operator's own hosts
/// media_gateway --site-url https://podcast.example.com \
///     --trust media.example.net https://podcast.example.com/ep.mp3
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "media_gateway",
    about = "Validates media file URLs before the server is allowed to fetch them."
)]
pub struct Opt {
    /// Candidate URLs to validate
    #[arg(value_parser, required = true)]
    pub urls: Vec<String>,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Public base URL of the serving site; its hostname becomes trusted
    #[arg(long)]
    pub site_url: Option<String>,

    /// Base URL of the uploads directory; its hostname becomes trusted
    #[arg(long)]
    pub uploads_url: Option<String>,

    /// Additional trusted domain (repeatable)
    #[arg(long = "trust")]
    pub trusted: Vec<String>,

    /// DNS lookup timeout in seconds
    #[arg(long, default_value_t = DNS_TIMEOUT_SECS)]
    pub dns_timeout_seconds: u64,
}

/// Library-facing gateway configuration.
///
/// All fields default from the named constants above; callers typically
/// override the site/uploads URLs and leave the rest alone.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Public base URL of the serving site. Its hostname is added to the
    /// trusted set. Empty means no site host is trusted.
    pub site_url: String,
    /// Base URL of the uploads directory. Its hostname is added to the
    /// trusted set. Empty means no uploads host is trusted.
    pub uploads_url: String,
    /// Extra trusted domains registered at construction time.
    pub extra_trusted_domains: Vec<String>,
    /// Lifetime of cached validation outcomes.
    pub validation_ttl: Duration,
    /// Lifetime of cached per-host DNS verdicts.
    pub dns_ttl: Duration,
    /// Upper bound on a single DNS lookup.
    pub dns_timeout: Duration,
    /// Upper bound on a single size probe request.
    pub probe_timeout: Duration,
    /// User-Agent header for size probe requests.
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            site_url: String::new(),
            uploads_url: String::new(),
            extra_trusted_domains: Vec::new(),
            validation_ttl: Duration::from_secs(VALIDATION_CACHE_TTL_SECS),
            dns_ttl: Duration::from_secs(DNS_CACHE_TTL_SECS),
            dns_timeout: Duration::from_secs(DNS_TIMEOUT_SECS),
            probe_timeout: Duration::from_secs(PROBE_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}
