//! Two-tier trend merging.
//!
//! Each tier (hourly, recent) interleaves its hashtag and word rankings,
//! folds duplicates together and is cut to its limit. Recent entries already
//! present in the hourly tier are dropped, and the concatenation is folded
//! once more. Display order is interleave order; there is no final re-sort.

use std::collections::{HashMap, HashSet};

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::{PinnedWord, RankedTrend, Settings};

/// Comparison key for terms: lower-cased, NFD-decomposed, combining marks
/// removed. Only used for comparison, never displayed.
pub fn fold_key(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// `a[0], b[0], a[1], b[1], ...`, then whatever is left of the longer list.
pub fn interleave<T>(a: Vec<T>, b: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let mut a = a.into_iter();
    let mut b = b.into_iter();

    loop {
        match (a.next(), b.next()) {
            (None, None) => break,
            (x, y) => {
                out.extend(x);
                out.extend(y);
            }
        }
    }

    out
}

/// Collapse entries sharing a fold key into the first one, summing counts.
/// The survivor keeps its text, window and message.
pub fn dedup_accumulate(entries: Vec<RankedTrend>) -> Vec<RankedTrend> {
    let mut out: Vec<RankedTrend> = Vec::with_capacity(entries.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        let key = fold_key(&entry.text);
        match index.get(&key) {
            Some(&i) => out[i].count += entry.count,
            None => {
                index.insert(key, out.len());
                out.push(entry);
            }
        }
    }

    out
}

/// Hashtag and word rankings for one tier.
#[derive(Debug, Clone, Default)]
pub struct TierLists {
    pub hashtags: Vec<RankedTrend>,
    pub words: Vec<RankedTrend>,
}

impl TierLists {
    pub fn new(hashtags: Vec<RankedTrend>, words: Vec<RankedTrend>) -> Self {
        Self { hashtags, words }
    }

    fn combine(self, limit: usize) -> Vec<RankedTrend> {
        let mut combined = dedup_accumulate(interleave(self.hashtags, self.words));
        combined.truncate(limit);
        combined
    }
}

/// Merge both tiers. The hourly tier takes priority: a recent entry whose
/// fold key survived hourly truncation is dropped outright, not summed.
pub fn merge_tiers(
    hourly: TierLists,
    recent: TierLists,
    hour_limit: usize,
    recent_limit: usize,
) -> Vec<RankedTrend> {
    let hourly = hourly.combine(hour_limit);
    let hourly_keys: HashSet<String> = hourly.iter().map(|e| fold_key(&e.text)).collect();

    let mut recent: Vec<RankedTrend> = dedup_accumulate(interleave(recent.hashtags, recent.words))
        .into_iter()
        .filter(|entry| !hourly_keys.contains(&fold_key(&entry.text)))
        .collect();
    recent.truncate(recent_limit);

    let mut merged = hourly;
    merged.extend(recent);
    dedup_accumulate(merged)
}

pub fn apply_annotations(entries: &mut [RankedTrend], settings: &Settings) {
    for entry in entries.iter_mut() {
        if let Some(annotation) = settings.annotation_for(&entry.text) {
            entry.message = Some(annotation.message.clone());
        }
    }
}

/// Insert the pinned entry at its position (clamped to the list length).
/// It may duplicate a naturally trending entry; that is accepted.
pub fn apply_pin(entries: &mut Vec<RankedTrend>, pin: Option<&PinnedWord>) {
    let Some(pin) = pin.filter(|pin| pin.enabled) else {
        return;
    };

    let position = pin.position.min(entries.len());
    entries.insert(
        position,
        RankedTrend {
            text: pin.word.clone(),
            count: pin.display_count,
            source_window_millis: 0,
            message: pin.message.clone(),
        },
    );
}

/// Full pipeline from per-window rankings to the published list.
pub fn build_trending(
    hourly: TierLists,
    recent: TierLists,
    hour_limit: usize,
    recent_limit: usize,
    settings: &Settings,
) -> Vec<RankedTrend> {
    let mut entries = merge_tiers(hourly, recent, hour_limit, recent_limit);
    apply_annotations(&mut entries, settings);
    apply_pin(&mut entries, settings.active_pin());
    entries
}
