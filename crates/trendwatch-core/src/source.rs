//! Newline-delimited JSON post source.
//!
//! Each line is one already-decoded record (`{"$type": ..., "text": ...,
//! "langs": [...]}`). Decoding the firehose itself happens upstream; this
//! adapter only feeds the ingestion channel.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::models::PostEvent;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SourceSummary {
    pub forwarded: u64,
    pub malformed: u64,
    /// Records dropped because the ingestion buffer was full.
    pub dropped: u64,
}

/// Forward records from `reader` until EOF or until the ingestor goes away.
/// Malformed lines are skipped one at a time; the source never waits on a
/// full buffer.
pub async fn forward_ndjson<R>(
    reader: R,
    tx: mpsc::Sender<PostEvent>,
) -> std::io::Result<SourceSummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut summary = SourceSummary::default();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let post: PostEvent = match serde_json::from_str(line) {
            Ok(post) => post,
            Err(e) => {
                debug!("Skipping malformed record: {}", e);
                summary.malformed += 1;
                continue;
            }
        };

        match tx.try_send(post) {
            Ok(()) => summary.forwarded += 1,
            Err(TrySendError::Full(_)) => {
                summary.dropped += 1;
                if summary.dropped % 1000 == 1 {
                    warn!(dropped = summary.dropped, "Ingestion buffer full, dropping records");
                }
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Ingestor gone, stopping source");
                break;
            }
        }
    }

    info!(
        forwarded = summary.forwarded,
        malformed = summary.malformed,
        dropped = summary.dropped,
        "Post source finished"
    );
    Ok(summary)
}
