#![forbid(unsafe_code)]
//! Ranging session control: per-target subscription workers, single-writer
//! measurement aggregation, and summary/error event publishing.

pub mod controller;
pub mod error;
pub mod events;
pub mod retry;
pub mod source;

pub use controller::RangingSessionController;
pub use error::{Error, Result};
pub use events::{EventBus, SessionEvent};
pub use retry::backoff_policy;
pub use source::RangingSource;
