//! Download telemetry emission.
//!
//! Fires one event per genuine download or stream so external consumers
//! (analytics, play counters) can record it. Synthetic health-check
//! requests are filtered out by referrer so monitoring does not inflate
//! listen counts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::config::HEALTH_CHECK_REFERRER;

/// One download event, handed to every registered consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadEvent {
    /// The validated file URL that was served.
    pub url: String,
    /// The episode the file belongs to.
    pub episode_id: u64,
    /// The request referrer, already known not to be a health check.
    pub referrer: String,
}

type DownloadHandler = Box<dyn Fn(&DownloadEvent) + Send + Sync>;

/// Registers consumers and emits deduplicated download events.
#[derive(Default)]
pub struct DownloadEmitter {
    handlers: Mutex<Vec<DownloadHandler>>,
    emitted: AtomicUsize,
}

impl DownloadEmitter {
    /// Creates an emitter with no consumers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a consumer. Called at startup by whatever wants to observe
    /// downloads; consumers run synchronously in registration order.
    pub fn on_download<F>(&self, handler: F)
    where
        F: Fn(&DownloadEvent) + Send + Sync + 'static,
    {
        self.lock_handlers().push(Box::new(handler));
    }

    /// Emits one event for a served file, unless the referrer marks the
    /// request as a synthetic health check, in which case nothing happens.
    /// Side effect only: no return value, no error path.
    pub fn trigger_download_action(&self, url: &str, episode_id: u64, referrer: &str) {
        if referrer == HEALTH_CHECK_REFERRER {
            log::debug!("skipping synthetic health-check download for {url}");
            return;
        }

        let event = DownloadEvent {
            url: url.to_string(),
            episode_id,
            referrer: referrer.to_string(),
        };

        for handler in self.lock_handlers().iter() {
            handler(&event);
        }
        self.emitted.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "download event emitted for episode {} ({})",
            episode_id,
            url
        );
    }

    /// Total events emitted since construction.
    pub fn emitted_count(&self) -> usize {
        self.emitted.load(Ordering::SeqCst)
    }

    fn lock_handlers(&self) -> std::sync::MutexGuard<'_, Vec<DownloadHandler>> {
        match self.handlers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_health_check_referrer_is_a_noop() {
        let emitter = DownloadEmitter::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        emitter.on_download(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });

        emitter.trigger_download_action("https://cdn.castos.com/ep.mp3", 7, "test-nginx");
        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert_eq!(emitter.emitted_count(), 0);
    }

    #[test]
    fn test_genuine_referrer_emits_exactly_once() {
        let emitter = DownloadEmitter::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        emitter.on_download(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });

        emitter.trigger_download_action("https://cdn.castos.com/ep.mp3", 7, "overcast");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.emitted_count(), 1);
    }

    #[test]
    fn test_empty_referrer_still_counts() {
        let emitter = DownloadEmitter::new();
        emitter.trigger_download_action("https://cdn.castos.com/ep.mp3", 7, "");
        assert_eq!(emitter.emitted_count(), 1);
    }

    #[test]
    fn test_all_handlers_receive_the_event() {
        let emitter = DownloadEmitter::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let first_clone = Arc::clone(&first);
        let second_clone = Arc::clone(&second);
        emitter.on_download(move |event| {
            assert_eq!(event.episode_id, 42);
            first_clone.fetch_add(1, Ordering::SeqCst);
        });
        emitter.on_download(move |_| {
            second_clone.fetch_add(1, Ordering::SeqCst);
        });

        emitter.trigger_download_action("https://cdn.castos.com/ep.mp3", 42, "apple-podcasts");
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
