//! Append-only scan log
//!
//! One CSV row per completed pair. The header row is written exactly once,
//! only when the target file does not exist at the moment of the first
//! write; rows are never mutated or deleted afterwards.

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;

use crate::pairing::CompletedPair;

/// Column headers, in write order: timestamp, object code, address code
const COLUMNS: [&str; 3] = ["Timestamp", "Objeto", "Endereço"];

/// Timestamp format for log rows
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A row as appended to the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Local wall-clock time of the append, already formatted
    pub timestamp: String,
    pub object: String,
    pub address: String,
}

/// Handle on the scan log file
#[derive(Debug, Clone)]
pub struct ScanLog {
    path: PathBuf,
}

impl ScanLog {
    /// Create a handle; the file itself is only touched on the first append
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The log file location
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Append one completed pair as a timestamped row.
    ///
    /// Creates the file (with the header row) if it does not exist yet.
    pub fn append(&self, pair: &CompletedPair) -> Result<LogEntry> {
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("could not open scan log {}", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        if needs_header {
            writer
                .write_record(COLUMNS)
                .context("could not write scan log header")?;
        }

        let entry = LogEntry {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            object: pair.object.clone(),
            address: pair.address.clone(),
        };

        writer
            .write_record([&entry.timestamp, &entry.object, &entry.address])
            .context("could not write scan log row")?;
        writer.flush().context("could not flush scan log")?;

        Ok(entry)
    }
}
