//! DNS resolver initialization.

use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::TokioAsyncResolver;

/// Initializes the DNS resolver for hostname validation.
///
/// Uses the default resolver configuration with aggressive timeouts: the
/// validation path runs inside file-serving requests, so lookups must fail
/// fast rather than hang on a slow or unresponsive DNS server.
///
/// # Arguments
///
/// * `timeout` - Per-query timeout applied by the resolver itself
///
/// # Returns
///
/// A configured `TokioAsyncResolver` wrapped in `Arc` for sharing across
/// requests.
pub fn init_resolver(timeout: Duration) -> Arc<TokioAsyncResolver> {
    use hickory_resolver::config::{ResolverConfig, ResolverOpts};

    let mut opts = ResolverOpts::default();
    opts.timeout = timeout;
    opts.attempts = 2; // Reduce retry attempts to fail faster
                       // Set ndots to 0 to prevent search domain appending
    opts.ndots = 0;

    Arc::new(TokioAsyncResolver::tokio(ResolverConfig::default(), opts))
}
