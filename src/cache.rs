//! TTL cache abstraction for validation outcomes.
//!
//! The gateway depends only on the [`UrlCache`] trait, so deployments can
//! swap the in-process store for an external TTL-capable one. Keys are
//! namespaced by prefix (validation outcomes, DNS verdicts, file sizes) and
//! the whole namespace can be cleared at once for tests and administrative
//! resets.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::config::{DNS_KEY_PREFIX, FILE_SIZE_KEY_PREFIX, VALIDATION_KEY_PREFIX};

/// A TTL-capable string key/value store.
///
/// Writes are idempotent for the gateway's usage (the same input always
/// produces the same value), so concurrent requests racing to populate the
/// same key are harmless and last-write-wins is safe.
pub trait UrlCache: Send + Sync {
    /// Returns the value for `key` if present and not expired.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`. `None` TTL means the entry lives until
    /// explicitly cleared.
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>);

    /// Removes every entry whose key starts with `prefix`, returning how
    /// many were removed. Idempotent.
    fn clear_prefix(&self, prefix: &str) -> usize;
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }
}

/// In-process [`UrlCache`] backed by a mutex-guarded map.
///
/// Entries expire passively: an expired entry is dropped when read. This is
/// enough for a per-process gateway cache whose key space is bounded by the
/// set of URLs actually served.
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        MemoryCache {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        // A poisoned mutex only means another thread panicked mid-write;
        // the map itself is still structurally sound
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            Some(entry) => entry.is_expired(Instant::now()),
            None => return None,
        };
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let entry = Entry {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.lock().insert(key.to_string(), entry);
    }

    fn clear_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }
}

/// Stable hash of a full URL string, used as the cache key suffix.
///
/// Hashing the whole URL keeps key derivation trivial and collision-free;
/// the cost is one entry per distinct query-string variant of the same
/// host, which is accepted.
pub fn hash_url(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cache key for a URL's validation outcome.
pub fn validation_key(url: &str) -> String {
    format!("{VALIDATION_KEY_PREFIX}{}", hash_url(url))
}

/// Cache key for a host's DNS safety verdict.
pub fn dns_key(host: &str) -> String {
    format!("{DNS_KEY_PREFIX}{}", host.to_lowercase())
}

/// Cache key for an episode file's size record.
pub fn file_size_key(episode_id: u64, url: &str) -> String {
    format!("{FILE_SIZE_KEY_PREFIX}{episode_id}_{}", hash_url(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let cache = MemoryCache::new();
        cache.set("k1", "v1", None);
        assert_eq!(cache.get("k1"), Some("v1".to_string()));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_overwrite() {
        let cache = MemoryCache::new();
        cache.set("k1", "v1", None);
        cache.set("k1", "v2", None);
        assert_eq!(cache.get("k1"), Some("v2".to_string()));
    }

    #[test]
    fn test_expiry() {
        let cache = MemoryCache::new();
        cache.set("k1", "v1", Some(Duration::from_millis(0)));
        // A zero TTL is already past by the time we read
        assert_eq!(cache.get("k1"), None);
    }

    #[test]
    fn test_unexpired_entry_survives() {
        let cache = MemoryCache::new();
        cache.set("k1", "v1", Some(Duration::from_secs(3600)));
        assert_eq!(cache.get("k1"), Some("v1".to_string()));
    }

    #[test]
    fn test_clear_prefix() {
        let cache = MemoryCache::new();
        cache.set("a_1", "x", None);
        cache.set("a_2", "y", None);
        cache.set("b_1", "z", None);
        assert_eq!(cache.clear_prefix("a_"), 2);
        assert_eq!(cache.get("a_1"), None);
        assert_eq!(cache.get("b_1"), Some("z".to_string()));
        // Idempotent
        assert_eq!(cache.clear_prefix("a_"), 0);
    }

    #[test]
    fn test_hash_url_is_stable() {
        let a = hash_url("https://cdn.castos.com/a.mp3");
        let b = hash_url("https://cdn.castos.com/a.mp3");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_hash_url_distinguishes_query_strings() {
        let a = hash_url("https://cdn.castos.com/a.mp3?x=1");
        let b = hash_url("https://cdn.castos.com/a.mp3?x=2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_namespaces_are_disjoint() {
        let url = "https://cdn.castos.com/a.mp3";
        assert!(validation_key(url).starts_with(VALIDATION_KEY_PREFIX));
        assert!(dns_key("cdn.castos.com").starts_with(DNS_KEY_PREFIX));
        assert!(file_size_key(7, url).starts_with(FILE_SIZE_KEY_PREFIX));
        assert_ne!(validation_key(url), file_size_key(7, url));
    }

    #[test]
    fn test_dns_key_lowercases_host() {
        assert_eq!(dns_key("CDN.Castos.COM"), dns_key("cdn.castos.com"));
    }
}
