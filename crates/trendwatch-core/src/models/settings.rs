//! Administrator-controlled settings.
//!
//! Stored as a single JSON document. The running service never reads the
//! live row on the hot path; it works from the copy cached by the last
//! successful settings refresh.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Terms rejected on exact (case-insensitive) match.
    pub blacklist_trends: BTreeSet<String>,
    /// Terms rejected when they contain any of these as a substring.
    pub blacklist_words: BTreeSet<String>,
    /// Authors whose posts are ignored entirely.
    pub blacklist_users: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_word: Option<PinnedWord>,
    pub trend_annotations: Vec<TrendAnnotation>,
    pub acceptable_stat_events: BTreeSet<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinnedWord {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub word: String,
    pub display_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub position: usize,
}

fn default_enabled() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendAnnotation {
    pub word: String,
    pub message: String,
}

impl Settings {
    pub fn active_pin(&self) -> Option<&PinnedWord> {
        self.pinned_word.as_ref().filter(|pin| pin.enabled)
    }

    pub fn annotation_for(&self, text: &str) -> Option<&TrendAnnotation> {
        let needle = text.to_lowercase();
        self.trend_annotations
            .iter()
            .find(|annotation| annotation.word.to_lowercase() == needle)
    }
}
