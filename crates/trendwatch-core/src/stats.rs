use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

/// Counters for the ingestion side
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestStats {
    /// Every record received, posts or not
    pub records_seen: u64,
    /// Posts declaring the target language
    pub posts_in_language: u64,
    pub posts_from_blocked_authors: u64,
    pub terms_accepted: u64,
    pub terms_rejected: u64,
    pub write_failures: u64,
}

/// Thread-safe wrapper for ingest stats
#[derive(Debug, Clone, Default)]
pub struct SharedIngestStats {
    inner: Arc<RwLock<IngestStats>>,
}

impl SharedIngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, f: impl FnOnce(&mut IngestStats)) {
        f(&mut self.inner.write());
    }

    pub fn snapshot(&self) -> IngestStats {
        self.inner.read().clone()
    }
}

const MINUTES_KEPT: i64 = 60;

/// Rolling per-minute request counter covering the last hour.
#[derive(Debug, Default, Clone)]
pub struct RequestStats {
    /// (minute since epoch, count), oldest first
    buckets: VecDeque<(i64, u64)>,
    pub total: u64,
}

impl RequestStats {
    pub fn record(&mut self, now: DateTime<Utc>) {
        let minute = now.timestamp() / 60;
        self.total += 1;

        match self.buckets.back_mut() {
            Some((last, count)) if *last == minute => *count += 1,
            _ => self.buckets.push_back((minute, 1)),
        }
        self.prune(minute);
    }

    fn prune(&mut self, current_minute: i64) {
        while let Some(&(minute, _)) = self.buckets.front() {
            if current_minute - minute >= MINUTES_KEPT {
                self.buckets.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn last_hour(&self, now: DateTime<Utc>) -> u64 {
        let current_minute = now.timestamp() / 60;
        self.buckets
            .iter()
            .filter(|(minute, _)| current_minute - minute < MINUTES_KEPT)
            .map(|(_, count)| count)
            .sum()
    }
}

/// Thread-safe wrapper for request stats
#[derive(Debug, Clone, Default)]
pub struct SharedRequestStats {
    inner: Arc<RwLock<RequestStats>>,
}

impl SharedRequestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, now: DateTime<Utc>) {
        self.inner.write().record(now);
    }

    pub fn last_hour(&self, now: DateTime<Utc>) -> u64 {
        self.inner.read().last_hour(now)
    }

    pub fn total(&self) -> u64 {
        self.inner.read().total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_ingest_stats_update() {
        let stats = SharedIngestStats::new();
        stats.update(|s| {
            s.records_seen += 2;
            s.terms_accepted += 3;
        });
        let clone = stats.clone();
        clone.update(|s| s.terms_rejected += 1);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.records_seen, 2);
        assert_eq!(snapshot.terms_accepted, 3);
        assert_eq!(snapshot.terms_rejected, 1);
    }

    #[test]
    fn test_request_stats_rolls_off_after_an_hour() {
        let mut stats = RequestStats::default();
        let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();

        stats.record(start);
        stats.record(start + Duration::seconds(5));
        stats.record(start + Duration::minutes(30));
        assert_eq!(stats.last_hour(start + Duration::minutes(30)), 3);

        let later = start + Duration::minutes(61);
        assert_eq!(stats.last_hour(later), 1);

        stats.record(later);
        assert_eq!(stats.last_hour(later), 2);
        assert_eq!(stats.total, 4);
    }
}
