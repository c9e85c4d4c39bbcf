//! DNS-based validation for hosts outside the trusted set.
//!
//! Resolves a hostname to its full address set (A and AAAA) and classifies
//! every returned address. One internal address fails the whole host, and a
//! failed or empty resolution fails closed. This is the expensive fallback
//! behind the trusted-domain fast path, so verdicts are cached per host in
//! their own TTL bucket.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use once_cell::sync::Lazy;
use tokio::sync::Semaphore;

use crate::cache::{dns_key, UrlCache};
use crate::classify::{classify_host, classify_ip};
use crate::config::{CACHE_FLAG_INVALID, CACHE_FLAG_VALID, MAX_DNS_CONCURRENCY};

/// Concurrency limiter for DNS lookups (prevent resource exhaustion)
static DNS_SEMAPHORE: Lazy<Arc<Semaphore>> =
    Lazy::new(|| Arc::new(Semaphore::new(MAX_DNS_CONCURRENCY)));

/// Hostname-to-address resolution seam.
///
/// The production implementation delegates to hickory; tests substitute a
/// fixed map so the suite never touches live DNS.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Resolves `host` to its complete address set.
    ///
    /// # Errors
    ///
    /// Returns an error when resolution fails or times out; callers treat
    /// that as fail-closed.
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// [`HostResolver`] backed by a hickory `TokioAsyncResolver`.
///
/// Every lookup runs under the global semaphore and an explicit timeout on
/// top of the resolver's own, so a stalled DNS server cannot hold the
/// file-serving request open.
pub struct HickoryHostResolver {
    resolver: Arc<TokioAsyncResolver>,
    timeout: Duration,
}

impl HickoryHostResolver {
    /// Wraps a configured resolver with an outer per-lookup timeout.
    pub fn new(resolver: Arc<TokioAsyncResolver>, timeout: Duration) -> Self {
        HickoryHostResolver { resolver, timeout }
    }
}

#[async_trait]
impl HostResolver for HickoryHostResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>> {
        let _permit = DNS_SEMAPHORE
            .acquire()
            .await
            .context("DNS semaphore closed")?;

        let lookup = tokio::time::timeout(self.timeout, self.resolver.lookup_ip(host))
            .await
            .with_context(|| format!("DNS lookup timed out for {host}"))?
            .with_context(|| format!("DNS lookup failed for {host}"))?;

        Ok(lookup.iter().collect())
    }
}

/// Validates hosts by resolving them and classifying every address.
pub struct DnsValidator {
    resolver: Arc<dyn HostResolver>,
    cache: Arc<dyn UrlCache>,
    ttl: Duration,
}

impl DnsValidator {
    /// Creates a validator over a resolver and the shared gateway cache.
    pub fn new(resolver: Arc<dyn HostResolver>, cache: Arc<dyn UrlCache>, ttl: Duration) -> Self {
        DnsValidator {
            resolver,
            cache,
            ttl,
        }
    }

    /// Returns whether every address `host` resolves to is public.
    ///
    /// Literal IPs classify directly without a resolver round trip. For
    /// hostnames, a cached verdict is used when present; otherwise the host
    /// is resolved and the verdict cached for the DNS TTL. An empty address
    /// set caches as invalid. Transient resolution errors return `false`
    /// but are not cached, so one blip cannot pin a legitimate host invalid
    /// for a whole TTL window.
    pub async fn resolves_safely(&self, host: &str) -> bool {
        let trimmed = host.trim_start_matches('[').trim_end_matches(']');
        if trimmed.parse::<IpAddr>().is_ok() {
            return classify_host(host).is_public();
        }

        let key = dns_key(host);
        if let Some(flag) = self.cache.get(&key) {
            log::trace!("DNS verdict cache hit for {host}");
            return flag == CACHE_FLAG_VALID;
        }

        let addrs = match self.resolver.lookup(host).await {
            Ok(addrs) => addrs,
            Err(e) => {
                log::debug!("DNS validation failed for {host}: {e:#}");
                return false;
            }
        };

        if addrs.is_empty() {
            log::debug!("DNS validation: no addresses for {host}");
            self.cache.set(&key, CACHE_FLAG_INVALID, Some(self.ttl));
            return false;
        }

        let safe = addrs.iter().all(|ip| classify_ip(*ip).is_public());
        if !safe {
            log::debug!("DNS validation: {host} resolved to a non-public address");
        }
        let flag = if safe {
            CACHE_FLAG_VALID
        } else {
            CACHE_FLAG_INVALID
        };
        self.cache.set(&key, flag, Some(self.ttl));
        safe
    }
}
