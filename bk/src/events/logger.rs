//! Event Logger - persists lane events to a JSONL file
//!
//! The EventLogger subscribes to the coordinator's bus and writes one JSON
//! object per line, so a run can be replayed and verified later.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use super::types::LaneEvent;
use crate::error::Result;

/// Event logger that appends events to a single JSONL file
pub struct EventLogger {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl EventLogger {
    /// Create the log file (and its parent directory), truncating any old run
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        debug!(?path, "EventLogger::create: opening log file");
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).write(true).truncate(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an event as one JSON line
    pub fn write_event(&mut self, event: &LaneEvent) -> Result<()> {
        let json = serde_json::to_string(event)?;
        writeln!(self.writer, "{}", json)?;
        self.written += 1;
        Ok(())
    }

    /// Run the logger until the bus closes. Returns the number of events written.
    ///
    /// This is meant to be spawned as a background task.
    pub async fn run(mut self, mut rx: broadcast::Receiver<LaneEvent>) -> Result<u64> {
        debug!(path = ?self.path, "EventLogger::run: starting event logger");
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Err(e) = self.write_event(&event) {
                        error!(seq = event.seq, error = %e, "EventLogger: failed to write event");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // A gap makes the log unverifiable; the verifier will report it
                    warn!(missed = n, "EventLogger: lagged behind, missed events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("EventLogger: channel closed, shutting down");
                    break;
                }
            }
        }
        self.writer.flush()?;
        Ok(self.written)
    }
}

/// Read events back from a JSONL log, skipping lines that fail to parse
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<LaneEvent>> {
    let path = path.as_ref();
    debug!(?path, "read_events: reading log file");

    let content = fs::read_to_string(path)?;
    let mut events = Vec::new();
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<LaneEvent>(line) {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!(line, error = %e, "read_events: failed to parse line");
            }
        }
    }

    debug!(count = events.len(), "read_events: loaded events");
    Ok(events)
}
