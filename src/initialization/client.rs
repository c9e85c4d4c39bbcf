//! HTTP client initialization.

use std::sync::Arc;

use reqwest::ClientBuilder;

use crate::config::{GatewayConfig, MAX_REDIRECT_HOPS};
use crate::error_handling::InitializationError;

/// Initializes the HTTP client used for file size probes.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header from the gateway config
/// - Probe timeout from the gateway config
/// - Redirect following capped at `MAX_REDIRECT_HOPS`
/// - Rustls TLS backend
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if client creation fails.
pub fn init_probe_client(
    config: &GatewayConfig,
) -> Result<Arc<reqwest::Client>, InitializationError> {
    let client = ClientBuilder::new()
        .timeout(config.probe_timeout)
        .user_agent(config.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECT_HOPS))
        .build()?;
    Ok(Arc::new(client))
}
