//! JSON-lines event recorder.

use chrono::{DateTime, Utc};
use reachy_tictactoe::GameEvent;
use serde::Serialize;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

/// One line of the event log.
#[derive(Debug, Serialize)]
pub struct Record<'a> {
    /// When the event was recorded.
    pub at: DateTime<Utc>,
    /// The event, flattened into the same object.
    #[serde(flatten)]
    pub event: &'a GameEvent,
}

/// Serializes one event as a single JSON line (without the newline).
pub fn to_line(event: &GameEvent, at: DateTime<Utc>) -> serde_json::Result<String> {
    serde_json::to_string(&Record { at, event })
}

/// Spawns a task writing every event from `rx` to `path`.
///
/// The task ends when all senders are dropped and returns the number of
/// events written.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub async fn spawn(
    path: impl AsRef<Path>,
    mut rx: UnboundedReceiver<GameEvent>,
) -> std::io::Result<JoinHandle<std::io::Result<u64>>> {
    let file = File::create(path.as_ref()).await?;
    debug!("Event log opened");
    Ok(tokio::spawn(async move {
        let mut out = BufWriter::new(file);
        let mut written = 0;
        while let Some(event) = rx.recv().await {
            match to_line(&event, Utc::now()) {
                Ok(mut line) => {
                    line.push('\n');
                    out.write_all(line.as_bytes()).await?;
                    written += 1;
                }
                Err(e) => warn!(error = %e, "Cannot serialize event"),
            }
        }
        out.flush().await?;
        debug!(written, "Event log closed");
        Ok(written)
    }))
}
