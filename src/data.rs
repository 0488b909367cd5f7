//! Event dataset loading.
//!
//! Streams the CSV event source on a background thread and hands record
//! batches to the frame loop over a channel. Malformed rows are logged
//! and skipped; a missing or unreadable file just means zero markers,
//! never a blocked frame loop.

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use serde::Deserialize;

/// One row of the event dataset: where and when a marker lights up.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EventRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub time: f64,
}

const BATCH_SIZE: usize = 256;

/// Receiving end of the background CSV loader.
pub struct EventStream {
    rx: mpsc::Receiver<Vec<EventRecord>>,
}

impl EventStream {
    /// Spawn the loader thread for `path` and return the channel end the
    /// frame loop drains.
    pub fn spawn(path: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            if let Err(e) = stream_records(&path, &tx) {
                log::warn!("event source {}: {}", path.display(), e);
            }
        });
        Self { rx }
    }

    /// Collect every batch that arrived since the previous frame.
    pub fn drain(&self) -> Vec<EventRecord> {
        let mut records = Vec::new();
        while let Ok(batch) = self.rx.try_recv() {
            records.extend(batch);
        }
        records
    }
}

fn stream_records(path: &Path, tx: &mpsc::Sender<Vec<EventRecord>>) -> Result<(), String> {
    let reader = csv::Reader::from_path(path).map_err(|e| format!("{}", e))?;
    let (parsed, malformed) = pump(reader, tx);
    log::info!(
        "event source {}: {} records parsed, {} malformed rows skipped",
        path.display(),
        parsed,
        malformed
    );
    Ok(())
}

/// Read records off `reader`, sending them in batches. Returns the
/// (parsed, malformed) row counts. Stops quietly if the receiver is gone.
fn pump<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    tx: &mpsc::Sender<Vec<EventRecord>>,
) -> (usize, usize) {
    let mut batch = Vec::with_capacity(BATCH_SIZE);
    let mut parsed = 0usize;
    let mut malformed = 0usize;

    for (row, result) in reader.deserialize::<EventRecord>().enumerate() {
        match result {
            Ok(record) => {
                parsed += 1;
                batch.push(record);
                if batch.len() >= BATCH_SIZE {
                    if tx.send(std::mem::take(&mut batch)).is_err() {
                        return (parsed, malformed);
                    }
                    batch.reserve(BATCH_SIZE);
                }
            }
            Err(e) => {
                malformed += 1;
                // Header is line 1, so the first record sits on line 2.
                log::warn!("skipping malformed row at line {}: {}", row + 2, e);
            }
        }
    }
    if !batch.is_empty() {
        let _ = tx.send(batch);
    }
    (parsed, malformed)
}
