use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RangingConfig {
	/// Directory the measurement log files are written to.
	pub log_dir: PathBuf,
	/// Device/session suffix appended to log file names.
	pub device_suffix: String,
	pub log_level: String,
	/// Bounded capacity of the batch channel feeding the consumer task.
	pub batch_buffer: usize,
	/// Buffer of the summary/error event channel.
	pub event_buffer: usize,
	/// Base delay for subscription restart backoff (millis).
	pub retry_base_ms: u64,
	/// Cap for subscription restart backoff (millis).
	pub retry_max_ms: u64,
}

impl Default for RangingConfig {
	fn default() -> Self {
		Self {
			log_dir: PathBuf::from("."),
			device_suffix: "multi-ranging".into(),
			log_level: "info".into(),
			batch_buffer: 64,
			event_buffer: 64,
			retry_base_ms: 250,
			retry_max_ms: 10_000,
		}
	}
}

impl RangingConfig {
	pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
		let data = std::fs::read_to_string(path)?;
		let cfg: Self = toml::from_str(&data).map_err(|e| Error::config(format!("toml parse error: {e}")))?;
		cfg.validate()?;
		Ok(cfg)
	}

	pub fn from_env() -> Result<Self> {
		let mut cfg = Self::default();
		if let Ok(v) = std::env::var("RTT_LOG_DIR") { cfg.log_dir = PathBuf::from(v); }
		if let Ok(v) = std::env::var("RTT_DEVICE_SUFFIX") { cfg.device_suffix = v; }
		if let Ok(v) = std::env::var("RTT_LOG_LEVEL") { cfg.log_level = v; }
		if let Ok(v) = std::env::var("RTT_BATCH_BUFFER") {
			cfg.batch_buffer = v.parse().map_err(|_| Error::config(format!("invalid RTT_BATCH_BUFFER: {v}")))?;
		}
		if let Ok(v) = std::env::var("RTT_EVENT_BUFFER") {
			cfg.event_buffer = v.parse().map_err(|_| Error::config(format!("invalid RTT_EVENT_BUFFER: {v}")))?;
		}
		if let Ok(v) = std::env::var("RTT_RETRY_BASE_MS") {
			cfg.retry_base_ms = v.parse().map_err(|_| Error::config(format!("invalid RTT_RETRY_BASE_MS: {v}")))?;
		}
		if let Ok(v) = std::env::var("RTT_RETRY_MAX_MS") {
			cfg.retry_max_ms = v.parse().map_err(|_| Error::config(format!("invalid RTT_RETRY_MAX_MS: {v}")))?;
		}
		cfg.validate()?;
		Ok(cfg)
	}

	pub fn validate(&self) -> Result<()> {
		let allowed = ["trace", "debug", "info", "warn", "error"];
		if !allowed.contains(&self.log_level.as_str()) {
			return Err(Error::config(format!("invalid log_level: {}", self.log_level)));
		}
		if self.device_suffix.is_empty() {
			return Err(Error::config("device_suffix must not be empty"));
		}
		if self.batch_buffer == 0 {
			return Err(Error::config("batch_buffer must be at least 1"));
		}
		if self.event_buffer == 0 {
			return Err(Error::config("event_buffer must be at least 1"));
		}
		if self.retry_base_ms == 0 {
			return Err(Error::config("retry_base_ms must be at least 1"));
		}
		if self.retry_max_ms < self.retry_base_ms {
			return Err(Error::config("retry_max_ms must not be below retry_base_ms"));
		}
		Ok(())
	}
}
