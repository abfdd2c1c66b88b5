//! Trending-topics engine for a social post stream.
//!
//! Posts flow through [`ingest`] (tokenize, blacklist, store). The
//! [`refresher`] periodically ranks recent and hourly windows, merges them
//! and publishes the result through [`cache::TrendCache`], which readers
//! consume without touching the store.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod constants;
pub mod extract;
pub mod filter;
pub mod ingest;
pub mod merge;
pub mod models;
pub mod refresher;
pub mod source;
pub mod stats;
pub mod store;

pub use cache::{PublishOutcome, TrendCache};
pub use config::TrendConfig;
pub use ingest::Ingestor;
pub use refresher::{RefreshJobs, RefreshPlan, Refresher};
pub use store::{SharedStore, SqliteStore, StoreError, TermStore};
