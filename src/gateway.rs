//! The validation gateway entry point.
//!
//! Composes sanitization, the outcome cache, the scheme check, address
//! classification, the trusted-domain fast path, and DNS validation into a
//! single boolean decision: may the server act on this URL?
//!
//! The pipeline for one candidate URL:
//!
//! 1. Sanitize (strip control characters, encode spaces). Empty or
//!    unparsable input is rejected outright and not cached.
//! 2. Consult the outcome cache keyed by a hash of the sanitized URL; a hit
//!    returns immediately with no re-derivation.
//! 3. Scheme must be exactly `http` or `https`.
//! 4. A host that classifies as internal (literal private IP, `localhost`,
//!    metadata names) is rejected before any DNS traffic.
//! 5. A trusted host is accepted without DNS.
//! 6. Anything else stands or falls with DNS validation.
//! 7. The outcome is cached with the validation TTL before returning.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::cache::{validation_key, MemoryCache, UrlCache};
use crate::classify::classify_host;
use crate::config::{
    CACHE_FLAG_INVALID, CACHE_FLAG_VALID, DNS_KEY_PREFIX, GatewayConfig, VALIDATION_KEY_PREFIX,
};
use crate::dns::{DnsValidator, HickoryHostResolver, HostResolver};
use crate::error_handling::{InitializationError, RejectionReason, RejectionStats};
use crate::initialization::init_resolver;
use crate::sanitize::{clean_file_url, encode_file_url};
use crate::trusted::TrustedDomains;

/// The outbound file-access validation gateway.
///
/// Construct once per process and share; validation is `&self` and safe to
/// call from concurrent requests. Rejections are silent: the only
/// caller-visible effect is the boolean, with reasons available through
/// [`UrlGateway::stats`] and debug logs.
pub struct UrlGateway {
    trusted: Arc<TrustedDomains>,
    dns: DnsValidator,
    cache: Arc<dyn UrlCache>,
    stats: Arc<RejectionStats>,
    validation_ttl: Duration,
}

impl UrlGateway {
    /// Builds a gateway with default parts: a hickory resolver and an
    /// in-process memory cache.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::BaseUrlError` when the configured site
    /// or uploads URL does not parse.
    pub fn from_config(config: GatewayConfig) -> Result<Self, InitializationError> {
        let trusted = Arc::new(TrustedDomains::from_config(&config)?);
        let resolver = Arc::new(HickoryHostResolver::new(
            init_resolver(config.dns_timeout),
            config.dns_timeout,
        ));
        let cache: Arc<dyn UrlCache> = Arc::new(MemoryCache::new());
        Ok(Self::new(&config, trusted, resolver, cache))
    }

    /// Composes a gateway from explicit parts.
    ///
    /// This is the seam used by tests (stub resolver, shared cache) and by
    /// deployments that bring their own TTL store.
    pub fn new(
        config: &GatewayConfig,
        trusted: Arc<TrustedDomains>,
        resolver: Arc<dyn HostResolver>,
        cache: Arc<dyn UrlCache>,
    ) -> Self {
        UrlGateway {
            dns: DnsValidator::new(resolver, Arc::clone(&cache), config.dns_ttl),
            trusted,
            cache,
            stats: Arc::new(RejectionStats::new()),
            validation_ttl: config.validation_ttl,
        }
    }

    /// Decides whether the server may fetch, proxy, or redirect to `raw_url`.
    ///
    /// Identical input within the TTL window always returns the same
    /// outcome without re-resolving DNS. Never panics or errors on
    /// attacker-supplied input.
    pub async fn validate_file_url(&self, raw_url: &str) -> bool {
        let sanitized = encode_file_url(&clean_file_url(raw_url));
        if sanitized.is_empty() {
            self.reject(RejectionReason::EmptyUrl, raw_url);
            return false;
        }

        let parsed = match Url::parse(&sanitized) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::debug!("URL did not parse after sanitization: {e}");
                self.reject(RejectionReason::UnparsableUrl, &sanitized);
                return false;
            }
        };

        let key = validation_key(&sanitized);
        if let Some(flag) = self.cache.get(&key) {
            log::trace!("validation cache hit for {sanitized}");
            return flag == CACHE_FLAG_VALID;
        }

        let outcome = self.check(&parsed).await;
        let flag = if outcome {
            CACHE_FLAG_VALID
        } else {
            CACHE_FLAG_INVALID
        };
        self.cache.set(&key, flag, Some(self.validation_ttl));
        outcome
    }

    async fn check(&self, url: &Url) -> bool {
        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                log::debug!("scheme '{scheme}' is not allowed for file URLs");
                self.reject(RejectionReason::DisallowedScheme, url.as_str());
                return false;
            }
        }

        let Some(host) = url.host_str() else {
            self.reject(RejectionReason::MissingHost, url.as_str());
            return false;
        };

        let class = classify_host(host);
        if !class.is_public() {
            log::debug!("host {host} classified as {class:?}");
            self.reject(RejectionReason::InternalAddress, url.as_str());
            return false;
        }

        if self.trusted.is_trusted(host) {
            log::trace!("host {host} is trusted, skipping DNS validation");
            return true;
        }

        let safe = self.dns.resolves_safely(host).await;
        if !safe {
            self.reject(RejectionReason::DnsValidationFailed, url.as_str());
        }
        safe
    }

    fn reject(&self, reason: RejectionReason, detail: &str) {
        self.stats.increment(reason);
        log::debug!("rejected file URL ({}): {}", reason.as_str(), detail);
    }

    /// Removes every cache entry the gateway owns, both validation outcomes
    /// and DNS verdicts. Idempotent; returns the number of entries removed.
    pub fn clear_validation_cache(&self) -> usize {
        self.cache.clear_prefix(VALIDATION_KEY_PREFIX) + self.cache.clear_prefix(DNS_KEY_PREFIX)
    }

    /// Rejection counters for reporting.
    pub fn stats(&self) -> &RejectionStats {
        &self.stats
    }

    /// The trusted-domain set, shared with the file size resolver.
    pub fn trusted(&self) -> Arc<TrustedDomains> {
        Arc::clone(&self.trusted)
    }

    /// The underlying cache, shared with the file size resolver.
    pub fn cache(&self) -> Arc<dyn UrlCache> {
        Arc::clone(&self.cache)
    }
}
