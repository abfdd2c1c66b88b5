//! Application-wide constants
//!
//! Defaults for the ranking tiers and refresh cadence live here so the config
//! layer and the tests agree on them.

/// Record type of a post on the firehose; every other record type is ignored.
pub const POST_RECORD_TYPE: &str = "app.bsky.feed.post";

/// Language a post must declare to be tokenized.
pub const DEFAULT_TARGET_LANGUAGE: &str = "pt";

// Tier defaults
pub const DEFAULT_HOUR_LIMIT: usize = 15;
pub const DEFAULT_RECENT_LIMIT: usize = 10;
pub const HOURLY_WINDOW_SECS: u64 = 90 * 60;
pub const RECENT_WINDOW_SECS: u64 = 10 * 60;

/// Extra groups fetched beyond the limit to absorb blacklist rejections.
pub const DEFAULT_OVERFETCH: usize = 9;

// Retention
pub const RETENTION_SECS: u64 = 3 * 60 * 60;
pub const EVICTION_INTERVAL_SECS: u64 = 60 * 60;

/// Upper bound for any window, retention or interval setting (one year).
pub const MAX_DURATION_SECS: u64 = 366 * 24 * 60 * 60;

// Refresh cadence
pub const SETTINGS_REFRESH_SECS: u64 = 29;
pub const TRENDING_REFRESH_SECS: u64 = 30;

// Word token bounds (exclusive on both ends, in chars)
pub const MIN_WORD_CHARS_EXCLUSIVE: usize = 2;
pub const MAX_WORD_CHARS_EXCLUSIVE: usize = 64;

/// Hashtags must be longer than this, counting the leading '#'.
pub const MIN_HASHTAG_CHARS_EXCLUSIVE: usize = 2;

/// Buffer between the post source and the ingestor.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 4096;

/// Posts being written on the blocking pool at once.
pub const DEFAULT_MAX_PENDING_WRITES: usize = 8;
