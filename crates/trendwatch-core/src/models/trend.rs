use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of a trending list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedTrend {
    pub text: String,
    pub count: u64,
    /// Lookback window the entry was first ranked in; 0 for the pinned entry.
    pub source_window_millis: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

impl RankedTrend {
    pub fn new(text: impl Into<String>, count: u64, source_window_millis: u64) -> Self {
        Self {
            text: text.into(),
            count,
            source_window_millis,
            message: None,
        }
    }
}

/// Published trending view. Replaced wholesale, never mutated in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrendingSnapshot {
    pub published_at: DateTime<Utc>,
    pub entries: Vec<RankedTrend>,
}

impl TrendingSnapshot {
    pub fn new(published_at: DateTime<Utc>, entries: Vec<RankedTrend>) -> Self {
        Self {
            published_at,
            entries,
        }
    }

    /// Placeholder held until the first refresh publishes.
    pub fn empty() -> Self {
        Self {
            published_at: DateTime::<Utc>::default(),
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
