use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, BufReader};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tokio::sync::mpsc;
use tracing::{info, warn};

use trendwatch_core::models::PostEvent;
use trendwatch_core::source::forward_ndjson;
use trendwatch_core::stats::{SharedIngestStats, SharedRequestStats};
use trendwatch_core::{
    Ingestor, RefreshPlan, Refresher, SharedStore, SqliteStore, TermStore, TrendCache, TrendConfig,
};

use crate::http::{run_server, HttpState};

/// Where posts come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostInput {
    Stdin,
    File(PathBuf),
}

/// Run the service in the foreground until ctrl-c or SIGTERM.
pub async fn run_daemon(config: TrendConfig, input: PostInput) -> Result<()> {
    let sqlite = open_store(&config)?;
    info!("Using database {}", config.database_path().display());

    let settings = sqlite.load_settings().context("Failed to load settings")?;
    let store: SharedStore = Arc::new(sqlite);
    let cache = Arc::new(TrendCache::new(settings));

    let refresher = Arc::new(Refresher::new(
        store.clone(),
        cache.clone(),
        RefreshPlan::from_config(&config),
    ));
    refresher.initial_refresh().await;
    let jobs = refresher.spawn_jobs();

    let ingest_stats = SharedIngestStats::new();
    let ingestor = Ingestor::new(
        store,
        cache.clone(),
        config.target_language.clone(),
        ingest_stats.clone(),
    )
    .with_max_pending_writes(config.max_pending_writes);
    let (tx, rx) = mpsc::channel::<PostEvent>(config.channel_capacity);
    let ingest_task = tokio::spawn(ingestor.run(rx));
    let source_task = tokio::spawn(async move {
        let result = match input {
            PostInput::Stdin => forward_from(tokio::io::stdin(), tx).await,
            PostInput::File(path) => match tokio::fs::File::open(&path).await {
                Ok(file) => forward_from(file, tx).await,
                Err(e) => {
                    Err(e).with_context(|| format!("Failed to open input: {}", path.display()))
                }
            },
        };
        if let Err(e) = result {
            warn!("Post source stopped: {:#}", e);
        }
    });

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    let state = HttpState {
        cache,
        requests: SharedRequestStats::new(),
        ingest_stats,
    };
    let served = run_server(listener, state, shutdown_signal()).await;

    info!("Shutting down");
    jobs.abort_all();
    // Dropping the source closes the channel; the ingestor then flushes.
    source_task.abort();
    let _ = source_task.await;
    if let Err(e) = ingest_task.await {
        warn!("Ingestion task ended abnormally: {}", e);
    }

    served
}

async fn forward_from<R>(reader: R, tx: mpsc::Sender<PostEvent>) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    forward_ndjson(BufReader::new(reader), tx).await?;
    Ok(())
}

/// Open the store for one-shot admin commands.
pub fn open_store(config: &TrendConfig) -> Result<SqliteStore> {
    let db_path = config.database_path();
    SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
