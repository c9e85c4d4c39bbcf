//! media_gateway: outbound file-access validation for podcast media serving.
//!
//! Before the server fetches, proxies, or redirects to an episode's remote
//! audio file, the URL passes through this gateway. The gateway decides, for
//! an arbitrary attacker-influenced URL, whether the server is allowed to
//! act on it, blocking Server-Side Request Forgery against internal
//! infrastructure, cloud metadata endpoints, and loopback/link-local
//! services while allowing legitimate public podcast-hosting URLs.
//!
//! The decision pipeline: sanitize the raw string, consult a TTL outcome
//! cache, restrict the scheme to http/https, reject hosts that classify as
//! internal, accept hosts on the trusted-domain allowlist without DNS, and
//! otherwise resolve the host and require every returned address to be
//! public. The same callers also get client IP extraction for logging,
//! cached remote file size metadata, and deduplicated download telemetry.
//!
//! # Example
//!
//! ```no_run
//! use media_gateway::{GatewayConfig, UrlGateway};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig {
//!     site_url: "https://podcast.example.com".to_string(),
//!     ..GatewayConfig::default()
//! };
//! let gateway = UrlGateway::from_config(config)?;
//!
//! assert!(gateway.validate_file_url("https://cdn.castos.com/ep.mp3").await);
//! assert!(!gateway.validate_file_url("http://169.254.169.254/latest/meta-data/").await);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

#![warn(missing_docs)]

pub mod cache;
pub mod classify;
pub mod config;
pub mod dns;
pub mod error_handling;
pub mod file_size;
pub mod gateway;
pub mod initialization;
pub mod request;
pub mod sanitize;
pub mod telemetry;
pub mod trusted;

// Re-export public API
pub use cache::{MemoryCache, UrlCache};
pub use classify::{classify_host, AddressClass};
pub use config::GatewayConfig;
pub use dns::{DnsValidator, HickoryHostResolver, HostResolver};
pub use error_handling::{InitializationError, RejectionReason, RejectionStats};
pub use file_size::{FileSize, FileSizeResolver};
pub use gateway::UrlGateway;
pub use request::{resolve_client_ip, RequestContext};
pub use sanitize::{clean_file_url, encode_file_url};
pub use telemetry::{DownloadEmitter, DownloadEvent};
pub use trusted::TrustedDomains;
