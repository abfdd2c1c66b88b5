//! Periodic refresh of the cached settings and trending snapshot.
//!
//! Three independent jobs run on their own timers: settings refresh,
//! trending refresh and retention eviction. They share no lock; each one
//! publishes by whole-snapshot replacement through [`TrendCache`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate_window_async, WindowQuery};
use crate::cache::{PublishOutcome, TrendCache};
use crate::config::TrendConfig;
use crate::merge::{build_trending, TierLists};
use crate::models::{TermKind, TrendingSnapshot};
use crate::store::{evict_expired, run_blocking, SharedStore, StoreError};

/// Windows, limits and cadence for the refresh jobs.
#[derive(Debug, Clone)]
pub struct RefreshPlan {
    pub hourly_window: Duration,
    pub recent_window: Duration,
    pub hour_limit: usize,
    pub recent_limit: usize,
    pub overfetch: usize,
    pub retention: Duration,
    pub settings_interval: Duration,
    pub trending_interval: Duration,
    pub eviction_interval: Duration,
}

impl RefreshPlan {
    pub fn from_config(config: &TrendConfig) -> Self {
        Self {
            hourly_window: Duration::from_secs(config.hourly_window_secs),
            recent_window: Duration::from_secs(config.recent_window_secs),
            hour_limit: config.hour_limit,
            recent_limit: config.recent_limit,
            overfetch: config.overfetch,
            retention: Duration::from_secs(config.retention_secs),
            settings_interval: Duration::from_secs(config.settings_refresh_secs),
            trending_interval: Duration::from_secs(config.trending_refresh_secs),
            eviction_interval: Duration::from_secs(config.eviction_interval_secs),
        }
    }

    fn query(&self, kind: TermKind, window: Duration, limit: usize) -> WindowQuery {
        WindowQuery::new(kind, window, limit, self.overfetch)
    }
}

pub struct Refresher {
    store: SharedStore,
    cache: Arc<TrendCache>,
    plan: RefreshPlan,
}

impl Refresher {
    pub fn new(store: SharedStore, cache: Arc<TrendCache>, plan: RefreshPlan) -> Self {
        Self { store, cache, plan }
    }

    pub fn cache(&self) -> Arc<TrendCache> {
        self.cache.clone()
    }

    /// Re-read settings. On failure the cached copy stays in place.
    pub async fn refresh_settings(&self) -> bool {
        match run_blocking(&self.store, |store| store.load_settings()).await {
            Ok(settings) => {
                self.cache.replace_settings(settings);
                debug!("Settings refreshed");
                true
            }
            Err(e) => {
                warn!("Settings refresh failed, keeping cached settings: {}", e);
                false
            }
        }
    }

    pub async fn refresh_trending(&self) -> PublishOutcome {
        self.refresh_trending_at(Utc::now()).await
    }

    /// Rank all four windows against the cached settings and publish.
    pub async fn refresh_trending_at(&self, now: DateTime<Utc>) -> PublishOutcome {
        let settings = self.cache.settings();
        let plan = &self.plan;

        let (hourly_tags, hourly_words, recent_tags, recent_words) = tokio::join!(
            aggregate_window_async(
                &self.store,
                plan.query(TermKind::Hashtag, plan.hourly_window, plan.hour_limit),
                settings.clone(),
                now,
            ),
            aggregate_window_async(
                &self.store,
                plan.query(TermKind::Word, plan.hourly_window, plan.hour_limit),
                settings.clone(),
                now,
            ),
            aggregate_window_async(
                &self.store,
                plan.query(TermKind::Hashtag, plan.recent_window, plan.recent_limit),
                settings.clone(),
                now,
            ),
            aggregate_window_async(
                &self.store,
                plan.query(TermKind::Word, plan.recent_window, plan.recent_limit),
                settings.clone(),
                now,
            ),
        );

        let entries = build_trending(
            TierLists::new(hourly_tags, hourly_words),
            TierLists::new(recent_tags, recent_words),
            plan.hour_limit,
            plan.recent_limit,
            &settings,
        );
        let count = entries.len();

        let outcome = self
            .cache
            .publish_trending(TrendingSnapshot::new(now, entries));
        if outcome == PublishOutcome::Published {
            info!(entries = count, "Trending cache updated");
        }
        outcome
    }

    /// Drop events older than the retention horizon.
    pub async fn evict(&self) -> Result<usize, StoreError> {
        let Ok(retention) = chrono::Duration::from_std(self.plan.retention) else {
            return Ok(0);
        };
        let now = Utc::now();
        run_blocking(&self.store, move |store| evict_expired(store, now, retention)).await
    }

    /// Settings first, so the first trending list is filtered with real
    /// blacklists. Must complete before readers are served.
    pub async fn initial_refresh(&self) {
        if !self.refresh_settings().await {
            warn!("Starting with default settings");
        }
        self.refresh_trending().await;
    }

    /// Start the periodic jobs. Each one waits a full period before its first
    /// run since [`Refresher::initial_refresh`] has already covered it.
    pub fn spawn_jobs(self: &Arc<Self>) -> RefreshJobs {
        let settings = {
            let this = self.clone();
            spawn_periodic(self.plan.settings_interval, move || {
                let this = this.clone();
                async move {
                    this.refresh_settings().await;
                }
            })
        };

        let trending = {
            let this = self.clone();
            spawn_periodic(self.plan.trending_interval, move || {
                let this = this.clone();
                async move {
                    this.refresh_trending().await;
                }
            })
        };

        let eviction = {
            let this = self.clone();
            let retention_hours = self.plan.retention.as_secs_f64() / 3600.0;
            spawn_periodic(self.plan.eviction_interval, move || {
                let this = this.clone();
                async move {
                    match this.evict().await {
                        Ok(deleted) => {
                            info!(deleted, "Removed terms older than {:.1}h", retention_hours)
                        }
                        Err(e) => warn!("Eviction failed, will retry next cycle: {}", e),
                    }
                }
            })
        };

        RefreshJobs {
            handles: vec![settings, trending, eviction],
        }
    }
}

fn spawn_periodic<F, Fut>(period: Duration, job: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            job().await;
        }
    })
}

/// Handles of the running refresh jobs.
pub struct RefreshJobs {
    handles: Vec<JoinHandle<()>>,
}

impl RefreshJobs {
    pub fn abort_all(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for RefreshJobs {
    fn drop(&mut self) {
        self.abort_all();
    }
}
