#![forbid(unsafe_code)]
//! RTT ranging core: shared types, configuration, error handling, and the
//! per-peer statistics tracker.

pub mod config;
pub mod error;
pub mod stats;
pub mod types;

pub use config::RangingConfig;
pub use error::{Error, Result};
pub use stats::{SessionSummary, StatsTracker, SummaryEntry};
pub use types::{Measurement, MeasurementStatus, PeerId, MOVING_AVERAGE_WINDOW};
