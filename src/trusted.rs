//! Trusted-domain allowlist with subdomain matching.
//!
//! Hosts on the allowlist skip DNS validation entirely; this is the hot path
//! for the overwhelming majority of real episode URLs, which live on the
//! hosting platform's own CDN or the operator's site.
//!
//! Matching is exact or proper-suffix only: `cdn.castos.com` matches the
//! trusted `castos.com` because it ends with `".castos.com"`, while
//! `notcastos.com` and `castos.com.evil.com` do not match anything.

use url::Url;

use crate::classify::classify_host;
use crate::config::{GatewayConfig, TRUSTED_MEDIA_DOMAINS};
use crate::error_handling::InitializationError;

/// The set of hostnames allowed to bypass DNS validation.
///
/// Built once per process from the static platform list plus the site and
/// uploads hostnames, then treated as immutable configuration. Additional
/// hosts are registered through [`TrustedDomains::register`] before the set
/// is shared.
#[derive(Debug, Clone)]
pub struct TrustedDomains {
    domains: Vec<String>,
}

impl TrustedDomains {
    /// Builds the trusted set from configuration.
    ///
    /// Starts from the builtin podcast-media hosts, then appends the
    /// hostname of the configured site URL and uploads URL (when set), then
    /// registers any extra domains from the config through the same
    /// validation as [`TrustedDomains::register`].
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::BaseUrlError` when a non-empty site or
    /// uploads URL does not parse.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, InitializationError> {
        let mut trusted = TrustedDomains {
            domains: TRUSTED_MEDIA_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
        };

        for base in [&config.site_url, &config.uploads_url] {
            if base.is_empty() {
                continue;
            }
            let parsed = Url::parse(base).map_err(|source| InitializationError::BaseUrlError {
                url: base.clone(),
                source,
            })?;
            if let Some(host) = parsed.host_str() {
                let host = host.to_lowercase();
                if !trusted.domains.contains(&host) {
                    trusted.domains.push(host);
                }
            }
        }

        for domain in &config.extra_trusted_domains {
            trusted.register(domain);
        }

        Ok(trusted)
    }

    /// Registers an additional trusted domain.
    ///
    /// This is the extension point for other modules that need to extend
    /// trust at startup. Candidates are validated before acceptance: no
    /// wildcards, no scheme or path fragments, no embedded whitespace, at
    /// least one dot, and the name must not itself classify as an internal
    /// address. Invalid candidates are rejected and logged.
    ///
    /// Returns whether the domain was accepted.
    pub fn register(&mut self, domain: &str) -> bool {
        let candidate = domain.trim().to_lowercase();

        let malformed = candidate.is_empty()
            || candidate.contains(['*', '/', ':', '?', '#', ' ', '\t'])
            || candidate.starts_with('.')
            || candidate.ends_with('.')
            || !candidate.contains('.');
        if malformed {
            log::warn!("Rejected trusted domain registration: {:?}", domain);
            return false;
        }

        if !classify_host(&candidate).is_public() {
            log::warn!(
                "Rejected trusted domain registration for internal address: {:?}",
                domain
            );
            return false;
        }

        if !self.domains.contains(&candidate) {
            log::debug!("Registered trusted domain: {}", candidate);
            self.domains.push(candidate);
        }
        true
    }

    /// Checks a hostname against the allowlist.
    ///
    /// Exact match succeeds. Suffix match succeeds only across a subdomain
    /// boundary: `host` must end with `"."` followed by the trusted domain.
    pub fn is_trusted(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_lowercase();
        self.domains
            .iter()
            .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
    }

    /// The current allowlist, for reporting.
    pub fn domains(&self) -> &[String] {
        &self.domains
    }
}
