use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermKind {
    Word,
    Hashtag,
}

impl TermKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Hashtag => "hashtag",
        }
    }
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TermKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "word" => Ok(Self::Word),
            "hashtag" => Ok(Self::Hashtag),
            other => Err(format!("unknown term kind: {other}")),
        }
    }
}

/// A candidate term pulled out of a post, before blacklist filtering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedTerm {
    pub text: String,
    pub kind: TermKind,
}

impl ExtractedTerm {
    pub fn word(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: TermKind::Word,
        }
    }

    pub fn hashtag(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: TermKind::Hashtag,
        }
    }
}

/// One accepted word/hashtag occurrence. Never updated after creation;
/// removed only by retention eviction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermEvent {
    pub text: String,
    pub kind: TermKind,
    pub languages: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl TermEvent {
    pub fn new(
        term: ExtractedTerm,
        languages: BTreeSet<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            text: term.text,
            kind: term.kind,
            languages,
            created_at,
        }
    }
}
