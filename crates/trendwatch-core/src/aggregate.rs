//! Per-window ranking.
//!
//! One call ranks a single (kind, lookback) window: fetch the events, group
//! them case-insensitively, order by count, over-fetch, drop blacklisted
//! groups and cut to the limit.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::filter::is_blacklisted;
use crate::models::{RankedTrend, Settings, TermEvent, TermKind};
use crate::store::{run_blocking, SharedStore, TermStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowQuery {
    pub kind: TermKind,
    pub window: Duration,
    pub limit: usize,
    pub overfetch: usize,
}

impl WindowQuery {
    pub fn new(kind: TermKind, window: Duration, limit: usize, overfetch: usize) -> Self {
        Self {
            kind,
            window,
            limit,
            overfetch,
        }
    }

    pub fn window_millis(&self) -> u64 {
        u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX)
    }

    /// Inclusive lower bound of the window ending at `now`. A window reaching
    /// past the representable range starts at the Unix epoch.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.window)
            .ok()
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or_default()
    }
}

struct Group {
    text: String,
    count: u64,
}

/// Rank already-fetched events. Groups keep the casing of their first event;
/// equal counts keep first-seen order.
pub fn rank_events(
    events: &[TermEvent],
    query: &WindowQuery,
    settings: &Settings,
) -> Vec<RankedTrend> {
    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for event in events {
        let key = event.text.to_lowercase();
        match index.get(&key) {
            Some(&i) => groups[i].count += 1,
            None => {
                index.insert(key, groups.len());
                groups.push(Group {
                    text: event.text.clone(),
                    count: 1,
                });
            }
        }
    }

    groups.sort_by(|a, b| b.count.cmp(&a.count));

    let window_millis = query.window_millis();
    groups
        .into_iter()
        .take(query.limit + query.overfetch)
        .filter(|group| !is_blacklisted(&group.text, settings))
        .take(query.limit)
        .map(|group| RankedTrend::new(group.text, group.count, window_millis))
        .collect()
}

/// Rank one window straight from the store. A failed query contributes an
/// empty list so the rest of the refresh can still publish.
pub fn aggregate_window(
    store: &dyn TermStore,
    query: &WindowQuery,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Vec<RankedTrend> {
    match store.query(query.kind, query.since(now)) {
        Ok(events) => {
            let ranked = rank_events(&events, query, settings);
            debug!(
                kind = %query.kind,
                window_secs = query.window.as_secs(),
                events = events.len(),
                ranked = ranked.len(),
                "aggregated window"
            );
            ranked
        }
        Err(e) => {
            warn!(
                kind = %query.kind,
                window_secs = query.window.as_secs(),
                "window query failed, treating as empty: {}",
                e
            );
            Vec::new()
        }
    }
}

/// [`aggregate_window`] on the blocking pool.
pub async fn aggregate_window_async(
    store: &SharedStore,
    query: WindowQuery,
    settings: Arc<Settings>,
    now: DateTime<Utc>,
) -> Vec<RankedTrend> {
    let result = run_blocking(store, move |store| {
        Ok(aggregate_window(store, &query, &settings, now))
    })
    .await;

    result.unwrap_or_else(|e| {
        warn!(kind = %query.kind, "window aggregation task failed: {}", e);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::FailingStore;
    use crate::store::SqliteStore;

    const TEN_MIN: Duration = Duration::from_secs(600);

    fn events(texts: &[&str]) -> Vec<TermEvent> {
        let now = Utc::now();
        texts
            .iter()
            .map(|text| TermEvent {
                text: text.to_string(),
                kind: TermKind::Hashtag,
                languages: Default::default(),
                created_at: now,
            })
            .collect()
    }

    fn texts_counts(ranked: &[RankedTrend]) -> Vec<(&str, u64)> {
        ranked.iter().map(|r| (r.text.as_str(), r.count)).collect()
    }

    #[test]
    fn test_groups_case_insensitively_keeping_first_casing() {
        let query = WindowQuery::new(TermKind::Hashtag, TEN_MIN, 10, 9);
        let ranked = rank_events(
            &events(&["#Festa", "#festa", "#FESTA", "#Praia"]),
            &query,
            &Settings::default(),
        );
        assert_eq!(texts_counts(&ranked), vec![("#Festa", 3), ("#Praia", 1)]);
        assert!(ranked.iter().all(|r| r.source_window_millis == 600_000));
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let query = WindowQuery::new(TermKind::Hashtag, TEN_MIN, 10, 9);
        let ranked = rank_events(
            &events(&["#b", "#a", "#c", "#c"]),
            &query,
            &Settings::default(),
        );
        assert_eq!(texts_counts(&ranked), vec![("#c", 2), ("#b", 1), ("#a", 1)]);
    }

    #[test]
    fn test_blacklist_applied_after_grouping_then_truncated() {
        let query = WindowQuery::new(TermKind::Hashtag, TEN_MIN, 2, 9);
        let settings = Settings {
            blacklist_trends: ["#spam".to_string()].into(),
            ..Default::default()
        };
        let ranked = rank_events(
            &events(&["#Spam", "#Spam", "#Spam", "#um", "#um", "#dois", "#tres"]),
            &query,
            &settings,
        );
        assert_eq!(texts_counts(&ranked), vec![("#um", 2), ("#dois", 1)]);
    }

    #[test]
    fn test_overfetch_sufficiency() {
        let limit = 10;
        let overfetch = 9;
        let query = WindowQuery::new(TermKind::Hashtag, TEN_MIN, limit, overfetch);

        // 30 groups with strictly decreasing counts: term0 x30, term1 x29, ...
        let mut texts = Vec::new();
        for i in 0..30usize {
            for _ in 0..(30 - i) {
                texts.push(format!("#term{i:02}"));
            }
        }
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let all = events(&refs);

        // Every window of 9 consecutive rejections inside the top 19 groups.
        for start in 0..=(limit + overfetch - 9) {
            let blacklist = (start..start + 9).map(|i| format!("#term{i:02}")).collect();
            let settings = Settings {
                blacklist_trends: blacklist,
                ..Default::default()
            };
            let ranked = rank_events(&all, &query, &settings);
            assert_eq!(ranked.len(), limit, "rejections starting at {start}");
            assert!(ranked
                .iter()
                .all(|r| !settings.blacklist_trends.contains(&r.text)));
        }
    }

    #[test]
    fn test_aggregate_window_reads_only_the_window() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now = Utc::now();
        let query = WindowQuery::new(TermKind::Word, TEN_MIN, 10, 9);
        for (text, age_secs) in [("novo", 10), ("novo", 20), ("velho", 900)] {
            store
                .insert(&TermEvent {
                    text: text.to_string(),
                    kind: TermKind::Word,
                    languages: Default::default(),
                    created_at: now - chrono::Duration::seconds(age_secs),
                })
                .unwrap();
        }

        let ranked = aggregate_window(&store, &query, &Settings::default(), now);
        assert_eq!(texts_counts(&ranked), vec![("novo", 2)]);
    }

    #[test]
    fn test_oversized_window_reads_everything() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now = Utc::now();
        let window = Duration::from_secs(18_446_744_073_709_551);
        let query = WindowQuery::new(TermKind::Word, window, 10, 9);
        assert_eq!(query.since(now), DateTime::<Utc>::default());
        assert_eq!(query.window_millis(), 18_446_744_073_709_551_000);

        store
            .insert(&TermEvent {
                text: "antigo".to_string(),
                kind: TermKind::Word,
                languages: Default::default(),
                created_at: now - chrono::Duration::days(30),
            })
            .unwrap();

        let ranked = aggregate_window(&store, &query, &Settings::default(), now);
        assert_eq!(texts_counts(&ranked), vec![("antigo", 1)]);
    }

    #[tokio::test]
    async fn test_query_failure_yields_empty_window() {
        let store: SharedStore = Arc::new(FailingStore);
        let query = WindowQuery::new(TermKind::Word, TEN_MIN, 10, 9);
        let ranked =
            aggregate_window_async(&store, query, Arc::new(Settings::default()), Utc::now()).await;
        assert!(ranked.is_empty());
    }
}
