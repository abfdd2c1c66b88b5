//! Read-only HTTP surface over the published snapshots.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use trendwatch_core::cache::TrendCache;
use trendwatch_core::models::{RankedTrend, TrendingSnapshot};
use trendwatch_core::stats::{IngestStats, SharedIngestStats, SharedRequestStats};

/// Shared server state
#[derive(Clone)]
pub struct HttpState {
    pub cache: Arc<TrendCache>,
    pub requests: SharedRequestStats,
    pub ingest_stats: SharedIngestStats,
}

#[derive(Debug, Serialize)]
pub struct TrendsHead {
    /// Publication time, Unix millis
    pub time: i64,
    pub length: usize,
}

/// Body of `GET /trends`
#[derive(Debug, Serialize)]
pub struct TrendsResponse<'a> {
    pub head: TrendsHead,
    pub data: &'a [RankedTrend],
}

impl<'a> From<&'a TrendingSnapshot> for TrendsResponse<'a> {
    fn from(snapshot: &'a TrendingSnapshot) -> Self {
        Self {
            head: TrendsHead {
                time: snapshot.published_at.timestamp_millis(),
                length: snapshot.entries.len(),
            },
            data: &snapshot.entries,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SettingsSummary {
    blacklist_trends: usize,
    blacklist_words: usize,
    blacklist_users: usize,
    trend_annotations: usize,
    pinned: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestSummary {
    last_hour: u64,
    total: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    healthy: bool,
    published_at: String,
    entries: usize,
    settings: SettingsSummary,
    ingest: IngestStats,
    trend_requests: RequestSummary,
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/trends", get(trends))
        .route("/status", get(status))
        .route("/healthz", get(healthz))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn run_server<F>(listener: TcpListener, state: HttpState, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    info!("HTTP server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Handler for GET /trends
async fn trends(State(state): State<HttpState>) -> Response {
    state.requests.record(Utc::now());

    // One load: head and data always describe the same snapshot.
    let snapshot = state.cache.trending();
    debug!(entries = snapshot.len(), "GET /trends");
    Json(TrendsResponse::from(snapshot.as_ref())).into_response()
}

/// Handler for GET /status
async fn status(State(state): State<HttpState>) -> Json<StatusResponse> {
    let snapshot = state.cache.trending();
    let settings = state.cache.settings();
    let now = Utc::now();

    Json(StatusResponse {
        healthy: state.cache.is_healthy(),
        published_at: snapshot.published_at.to_rfc3339(),
        entries: snapshot.len(),
        settings: SettingsSummary {
            blacklist_trends: settings.blacklist_trends.len(),
            blacklist_words: settings.blacklist_words.len(),
            blacklist_users: settings.blacklist_users.len(),
            trend_annotations: settings.trend_annotations.len(),
            pinned: settings.active_pin().is_some(),
        },
        ingest: state.ingest_stats.snapshot(),
        trend_requests: RequestSummary {
            last_hour: state.requests.last_hour(now),
            total: state.requests.total(),
        },
    })
}

/// Liveness probe: 503 once the trending list has collapsed to empty.
async fn healthz(State(state): State<HttpState>) -> impl IntoResponse {
    if state.cache.is_healthy() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "trending list went empty")
    }
}
