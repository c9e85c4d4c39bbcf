//! Address classification for SSRF protection.
//!
//! Determines whether a hostname or literal IP is itself an internal
//! destination: loopback, link-local, RFC 1918 / RFC 4193 private space, or
//! an internal-looking hostname such as `localhost` or a cloud
//! metadata-service name.
//!
//! Classification answers only "is this address internal". Whether a
//! hostname is on the operator's allowlist is a separate question answered
//! by the trusted-domain matcher, so a lookalike such as
//! `castos.com.evil.com` classifies as `Public` here and must earn trust (or
//! survive DNS validation) on its own.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::config::{INTERNAL_HOST_SUFFIXES, METADATA_HOSTNAMES};

/// Classification of a single host or address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressClass {
    /// 127.0.0.0/8 or `::1`.
    Loopback,
    /// 169.254.0.0/16 or fe80::/10.
    LinkLocal,
    /// RFC 1918 and other non-routable IPv4 space.
    PrivateV4,
    /// Unique-local, multicast, unspecified, or private-embedding IPv6.
    PrivateV6,
    /// `localhost` and friends, `.internal` names, metadata services.
    InternalHostname,
    /// Anything else; safe only after DNS validation or trust matching.
    Public,
}

impl AddressClass {
    /// True only for [`AddressClass::Public`].
    pub fn is_public(self) -> bool {
        matches!(self, AddressClass::Public)
    }
}

/// Classifies a hostname or literal IP address.
///
/// Accepts bare hostnames, dotted IPv4, and IPv6 with or without brackets
/// (the bracketed form is what `Url::host_str` yields).
///
/// Deterministic and side-effect-free: the same literal always gets the same
/// classification, and no network traffic is generated.
pub fn classify_host(host: &str) -> AddressClass {
    let trimmed = host.trim().trim_start_matches('[').trim_end_matches(']');
    if let Ok(v4) = trimmed.parse::<Ipv4Addr>() {
        return classify_ipv4(v4);
    }
    if let Ok(v6) = trimmed.parse::<Ipv6Addr>() {
        return classify_ipv6(v6);
    }
    classify_hostname(trimmed)
}

/// Classifies an already-parsed IP address.
pub fn classify_ip(ip: IpAddr) -> AddressClass {
    match ip {
        IpAddr::V4(v4) => classify_ipv4(v4),
        IpAddr::V6(v6) => classify_ipv6(v6),
    }
}

fn classify_ipv4(ip: Ipv4Addr) -> AddressClass {
    let o = ip.octets();

    // 127.0.0.0/8 (loopback)
    if o[0] == 127 {
        return AddressClass::Loopback;
    }

    // 169.254.0.0/16 (link-local, cloud metadata lives here)
    if o[0] == 169 && o[1] == 254 {
        return AddressClass::LinkLocal;
    }

    // 10.0.0.0/8
    if o[0] == 10 {
        return AddressClass::PrivateV4;
    }

    // 172.16.0.0/12
    if o[0] == 172 && (16..=31).contains(&o[1]) {
        return AddressClass::PrivateV4;
    }

    // 192.168.0.0/16
    if o[0] == 192 && o[1] == 168 {
        return AddressClass::PrivateV4;
    }

    // 0.0.0.0/8 (this network)
    if o[0] == 0 {
        return AddressClass::PrivateV4;
    }

    // 224.0.0.0/4 (multicast)
    if (224..=239).contains(&o[0]) {
        return AddressClass::PrivateV4;
    }

    // 240.0.0.0/4 (reserved)
    if o[0] >= 240 {
        return AddressClass::PrivateV4;
    }

    AddressClass::Public
}

fn classify_ipv6(ip: Ipv6Addr) -> AddressClass {
    let s = ip.segments();

    // ::1 loopback, in any textual form
    if s == [0, 0, 0, 0, 0, 0, 0, 1] {
        return AddressClass::Loopback;
    }

    // :: unspecified
    if s == [0; 8] {
        return AddressClass::PrivateV6;
    }

    // fe80::/10 link-local
    if (s[0] & 0xffc0) == 0xfe80 {
        return AddressClass::LinkLocal;
    }

    // fc00::/7 unique-local
    if (s[0] & 0xfe00) == 0xfc00 {
        return AddressClass::PrivateV6;
    }

    // ff00::/8 multicast
    if (s[0] & 0xff00) == 0xff00 {
        return AddressClass::PrivateV6;
    }

    // ::ffff:a.b.c.d carries an embedded IPv4 address and is the classic
    // bypass vector for v4-only checks
    if let Some(v4) = ip.to_ipv4_mapped() {
        return classify_ipv4(v4);
    }

    AddressClass::Public
}

fn classify_hostname(name: &str) -> AddressClass {
    let lower = name.to_lowercase();
    let lower = lower.trim_end_matches('.');

    if lower == "localhost" || METADATA_HOSTNAMES.contains(&lower) {
        return AddressClass::InternalHostname;
    }

    for suffix in INTERNAL_HOST_SUFFIXES {
        if lower.ends_with(suffix) {
            return AddressClass::InternalHostname;
        }
    }

    AddressClass::Public
}
