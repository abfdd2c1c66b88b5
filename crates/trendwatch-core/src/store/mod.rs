//! Term event persistence.
//!
//! The aggregation engine talks to storage only through [`TermStore`]. The
//! trait is synchronous; async callers go through [`run_blocking`] so a slow
//! query never stalls the runtime's worker threads.

pub mod db;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::{Settings, TermEvent, TermKind};

pub use db::SqliteStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Settings encoding error: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("Stored term has unknown kind: {0}")]
    InvalidKind(String),

    #[error("Stored term has out-of-range timestamp: {0}")]
    InvalidTimestamp(i64),

    #[error("Blocking store task failed: {0}")]
    Blocking(String),
}

pub trait TermStore: Send + Sync {
    /// Persist one accepted term occurrence.
    fn insert(&self, event: &TermEvent) -> Result<(), StoreError>;

    /// All events of `kind` with `created_at >= since`, oldest first.
    fn query(&self, kind: TermKind, since: DateTime<Utc>) -> Result<Vec<TermEvent>, StoreError>;

    /// Delete events with `created_at < cutoff`; returns how many went.
    fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Fetch the settings singleton, creating the default row if absent.
    fn load_settings(&self) -> Result<Settings, StoreError>;

    fn save_settings(&self, settings: &Settings) -> Result<(), StoreError>;
}

pub type SharedStore = Arc<dyn TermStore>;

/// Run a store call on the blocking pool.
pub async fn run_blocking<T, F>(store: &SharedStore, f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&dyn TermStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = store.clone();
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| StoreError::Blocking(e.to_string()))?
}

/// Delete everything older than `retention` relative to `now`. Nothing is
/// old enough when the cutoff falls outside the representable range.
pub fn evict_expired(
    store: &dyn TermStore,
    now: DateTime<Utc>,
    retention: chrono::Duration,
) -> Result<usize, StoreError> {
    match now.checked_sub_signed(retention) {
        Some(cutoff) => store.delete_before(cutoff),
        None => Ok(0),
    }
}
