//! Published snapshots.
//!
//! [`TrendCache`] is the only state shared between the refresh jobs,
//! ingestion and the HTTP readers. Both snapshots are swapped in whole, so a
//! reader holding an `Arc` sees one consistent version from start to finish.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::error;

use crate::models::{Settings, TrendingSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// An empty list arrived after a non-empty one had been published.
    RejectedEmpty,
}

/// Liveness latch. Once the trending list has gone from non-empty to empty
/// the process is considered broken until restarted by its supervisor.
#[derive(Debug, Default)]
pub struct HealthMonitor {
    seen_non_empty: AtomicBool,
    failed: AtomicBool,
}

impl HealthMonitor {
    pub fn is_healthy(&self) -> bool {
        !self.failed.load(Ordering::Acquire)
    }

    fn observe(&self, snapshot: &TrendingSnapshot) -> PublishOutcome {
        if snapshot.is_empty() {
            if self.seen_non_empty.load(Ordering::Acquire) {
                self.failed.store(true, Ordering::Release);
                return PublishOutcome::RejectedEmpty;
            }
        } else {
            self.seen_non_empty.store(true, Ordering::Release);
        }
        PublishOutcome::Published
    }
}

pub struct TrendCache {
    settings: ArcSwap<Settings>,
    trending: ArcSwap<TrendingSnapshot>,
    health: HealthMonitor,
}

impl Default for TrendCache {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl TrendCache {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: ArcSwap::from_pointee(settings),
            trending: ArcSwap::from_pointee(TrendingSnapshot::empty()),
            health: HealthMonitor::default(),
        }
    }

    pub fn settings(&self) -> Arc<Settings> {
        self.settings.load_full()
    }

    pub fn replace_settings(&self, settings: Settings) {
        self.settings.store(Arc::new(settings));
    }

    pub fn trending(&self) -> Arc<TrendingSnapshot> {
        self.trending.load_full()
    }

    /// Swap in a new trending snapshot unless it trips the health latch, in
    /// which case the previous snapshot stays visible to readers.
    pub fn publish_trending(&self, snapshot: TrendingSnapshot) -> PublishOutcome {
        let outcome = self.health.observe(&snapshot);
        match outcome {
            PublishOutcome::Published => self.trending.store(Arc::new(snapshot)),
            PublishOutcome::RejectedEmpty => {
                error!("Trending list went empty after being populated; marking service unhealthy")
            }
        }
        outcome
    }

    pub fn is_healthy(&self) -> bool {
        self.health.is_healthy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RankedTrend;
    use chrono::Utc;

    fn snapshot(n: usize) -> TrendingSnapshot {
        TrendingSnapshot::new(
            Utc::now(),
            (0..n).map(|i| RankedTrend::new(format!("t{i}"), 1, 600_000)).collect(),
        )
    }

    #[test]
    fn test_starts_empty_and_healthy() {
        let cache = TrendCache::default();
        assert!(cache.trending().is_empty());
        assert!(cache.is_healthy());
        assert_eq!(*cache.settings(), Settings::default());
    }

    #[test]
    fn test_empty_before_first_population_is_fine() {
        let cache = TrendCache::default();
        assert_eq!(cache.publish_trending(snapshot(0)), PublishOutcome::Published);
        assert!(cache.is_healthy());
    }

    #[test]
    fn test_empty_after_population_trips_latch_and_keeps_old() {
        let cache = TrendCache::default();
        assert_eq!(cache.publish_trending(snapshot(3)), PublishOutcome::Published);
        assert_eq!(cache.publish_trending(snapshot(0)), PublishOutcome::RejectedEmpty);
        assert!(!cache.is_healthy());
        assert_eq!(cache.trending().len(), 3);

        // Latched: later good data does not clear it
        cache.publish_trending(snapshot(2));
        assert!(!cache.is_healthy());
        assert_eq!(cache.trending().len(), 2);
    }

    #[test]
    fn test_reader_keeps_its_version_across_swap() {
        let cache = TrendCache::default();
        cache.publish_trending(snapshot(2));
        let held = cache.trending();
        cache.publish_trending(snapshot(5));
        assert_eq!(held.len(), 2);
        assert_eq!(cache.trending().len(), 5);
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let cache = Arc::new(TrendCache::default());
        let writer = {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for n in 1..200 {
                    cache.publish_trending(snapshot(n));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let snap = cache.trending();
                        // Entries are always t0..t{n-1}; a torn read would break this.
                        for (i, entry) in snap.entries.iter().enumerate() {
                            assert_eq!(entry.text, format!("t{i}"));
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(cache.trending().len(), 199);
    }
}
