//! Write path: post → terms → blacklist → store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace};

use crate::cache::TrendCache;
use crate::extract::extract_terms;
use crate::filter::{filter_terms, is_blocked_author};
use crate::constants::DEFAULT_MAX_PENDING_WRITES;
use crate::models::{PostEvent, TermEvent};
use crate::stats::SharedIngestStats;
use crate::store::SharedStore;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub accepted: usize,
    pub rejected: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct Ingestor {
    store: SharedStore,
    cache: Arc<TrendCache>,
    target_language: String,
    stats: SharedIngestStats,
    max_pending_writes: usize,
}

impl Ingestor {
    pub fn new(
        store: SharedStore,
        cache: Arc<TrendCache>,
        target_language: impl Into<String>,
        stats: SharedIngestStats,
    ) -> Self {
        Self {
            store,
            cache,
            target_language: target_language.into(),
            stats,
            max_pending_writes: DEFAULT_MAX_PENDING_WRITES,
        }
    }

    /// Limit on posts written concurrently by [`Ingestor::run`]. While the
    /// limit is reached the channel is not read, so its capacity bounds the
    /// backlog.
    pub fn with_max_pending_writes(mut self, limit: usize) -> Self {
        self.max_pending_writes = limit.max(1);
        self
    }

    pub fn stats(&self) -> SharedIngestStats {
        self.stats.clone()
    }

    /// Handle one record synchronously. Irrelevant records are a no-op; each
    /// term is filtered and written on its own, so neither a blacklist hit
    /// nor a failed write affects its siblings.
    pub fn process_post(&self, post: &PostEvent, now: DateTime<Utc>) -> IngestOutcome {
        self.stats.update(|s| s.records_seen += 1);

        if !post.is_post() || !post.langs.iter().any(|l| *l == self.target_language) {
            return IngestOutcome::default();
        }
        self.stats.update(|s| s.posts_in_language += 1);

        let settings = self.cache.settings();
        if is_blocked_author(post.author.as_deref(), &settings) {
            self.stats.update(|s| s.posts_from_blocked_authors += 1);
            return IngestOutcome::default();
        }

        let terms = extract_terms(&post.text, &post.langs, &self.target_language);
        let (accepted, rejected) = filter_terms(terms, &settings);

        let languages = post.language_set();
        let mut outcome = IngestOutcome {
            rejected,
            ..Default::default()
        };

        for term in accepted {
            let event = TermEvent::new(term, languages.clone(), now);
            match self.store.insert(&event) {
                Ok(()) => outcome.accepted += 1,
                Err(e) => {
                    error!(term = %event.text, "Failed to store term: {}", e);
                    outcome.failed += 1;
                }
            }
        }

        self.stats.update(|s| {
            s.terms_accepted += outcome.accepted as u64;
            s.terms_rejected += outcome.rejected as u64;
            s.write_failures += outcome.failed as u64;
        });
        trace!(?outcome, "post processed");
        outcome
    }

    /// Drain `rx` until every sender is gone. Posts are written on the
    /// blocking pool, at most `max_pending_writes` at a time; in-flight
    /// writes are awaited before returning.
    pub async fn run(self, mut rx: mpsc::Receiver<PostEvent>) {
        let mut in_flight: JoinSet<IngestOutcome> = JoinSet::new();

        while let Some(post) = rx.recv().await {
            while in_flight.len() >= self.max_pending_writes {
                if let Some(Err(e)) = in_flight.join_next().await {
                    error!("Ingest task failed: {}", e);
                }
            }

            let ingestor = self.clone();
            in_flight.spawn_blocking(move || ingestor.process_post(&post, Utc::now()));

            while let Some(result) = in_flight.try_join_next() {
                if let Err(e) = result {
                    error!("Ingest task failed: {}", e);
                }
            }
        }

        debug!(pending = in_flight.len(), "Post source closed, flushing writes");
        while let Some(result) = in_flight.join_next().await {
            if let Err(e) = result {
                error!("Ingest task failed: {}", e);
            }
        }
        info!("Ingestion stopped");
    }
}
