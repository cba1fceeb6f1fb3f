#![forbid(unsafe_code)]
//! Append-only CSV sink for raw ranging measurements.
//!
//! Every attempted measurement is written as one comma-joined line to a
//! file named after the session start minute. The handle is opened and
//! dropped per append, so a crash loses at most the in-flight record.
//! Durability is best-effort: the session controller inspects the result
//! only to emit a diagnostic, never for control flow.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::warn;

use rtt_core::{Measurement, PeerId};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// One raw log line: `timestampMillis,peerId,rangingTimestampMillis,distanceMm,distanceStdDevMm,rssi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord {
    /// Wall-clock time the record was produced (epoch millis).
    pub timestamp_millis: i64,
    pub peer: PeerId,
    pub ranging_timestamp_millis: i64,
    pub distance_mm: i32,
    pub distance_std_dev_mm: i32,
    pub rssi: i32,
}

impl LogRecord {
    /// Build a record from a measurement, keeping its observation time.
    pub fn from_measurement(m: &Measurement) -> Self {
        Self {
            timestamp_millis: m.observed_at_millis,
            peer: m.peer,
            ranging_timestamp_millis: m.ranging_timestamp_millis,
            distance_mm: m.distance_mm,
            distance_std_dev_mm: m.distance_std_dev_mm,
            rssi: m.rssi,
        }
    }

    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.timestamp_millis,
            self.peer,
            self.ranging_timestamp_millis,
            self.distance_mm,
            self.distance_std_dev_mm,
            self.rssi
        )
    }
}

/// Durable sink for raw measurement records.
///
/// The file name is derived from the session start time at minute
/// granularity plus a device suffix (`<dd-MM-HH-mm>-<suffix>.csv`) and is
/// fixed for the lifetime of this value. The file is created on first
/// append and never truncated.
#[derive(Debug, Clone)]
pub struct MeasurementLog {
    path: PathBuf,
}

impl MeasurementLog {
    pub fn new(dir: impl AsRef<Path>, device_suffix: &str, session_start: DateTime<Local>) -> Self {
        let file_name = format!("{}-{}.csv", session_start.format("%d-%m-%H-%M"), device_suffix);
        Self { path: dir.as_ref().join(file_name) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the file if absent. The handle is
    /// flushed and dropped before returning.
    pub fn append(&self, record: &LogRecord) -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(record.to_csv_line().as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
        Ok(())
    }

    /// Append, swallowing any I/O failure after reporting it. A logging
    /// failure must never interrupt ranging.
    pub fn append_best_effort(&self, record: &LogRecord) {
        if let Err(e) = self.append(record) {
            warn!(path = %self.path.display(), error = %e, "measurement log append failed");
        }
    }
}
