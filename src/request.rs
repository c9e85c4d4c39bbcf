//! Per-request context and client IP resolution.
//!
//! The HTTP layer populates a [`RequestContext`] once per inbound request;
//! nothing here reads ambient server state. See
//! [`HEADER_CF_CONNECTING_IP`](crate::config::HEADER_CF_CONNECTING_IP) and
//! [`HEADER_X_FORWARDED_FOR`](crate::config::HEADER_X_FORWARDED_FOR) for the
//! header names the values come from.

use std::net::IpAddr;

use crate::config::UNKNOWN_CLIENT_IP;

/// Snapshot of the inbound request details the gateway cares about.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Value of the CDN connecting-IP header, when present.
    pub cf_connecting_ip: Option<String>,
    /// Raw forwarded-for chain, comma-separated, left-most entry first.
    pub forwarded_for: Option<String>,
    /// Transport-layer peer address.
    pub remote_addr: Option<String>,
    /// Request referrer, used by download telemetry.
    pub referrer: Option<String>,
}

/// Best-guess true client address for logging.
///
/// Precedence: CDN connecting-IP header, then the first entry of the
/// forwarded-for chain, then the direct peer address. A candidate that is
/// not a syntactically valid IP literal is skipped, not returned; when
/// nothing validates the sentinel `"unknown"` comes back. Recomputed per
/// request, never cached.
pub fn resolve_client_ip(ctx: &RequestContext) -> String {
    if let Some(ip) = ctx.cf_connecting_ip.as_deref().and_then(valid_ip) {
        return ip;
    }

    if let Some(chain) = ctx.forwarded_for.as_deref() {
        if let Some(ip) = chain.split(',').next().and_then(valid_ip) {
            return ip;
        }
    }

    if let Some(ip) = ctx.remote_addr.as_deref().and_then(valid_ip) {
        return ip;
    }

    UNKNOWN_CLIENT_IP.to_string()
}

fn valid_ip(candidate: &str) -> Option<String> {
    let trimmed = candidate.trim();
    trimmed.parse::<IpAddr>().ok().map(|_| trimmed.to_string())
}
