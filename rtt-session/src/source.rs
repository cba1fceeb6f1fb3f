#![forbid(unsafe_code)]

use async_trait::async_trait;

use rtt_core::{Measurement, PeerId};

use crate::error::Result;

/// External ranging transport capability.
///
/// One call performs one ranging exchange with the target and yields the
/// resulting batch of measurements. The underlying protocol terminates
/// each exchange, so the session controller re-invokes this immediately
/// after every successful batch and after a backoff on failure.
#[async_trait]
pub trait RangingSource: Send + Sync + 'static {
    async fn range(&self, target: PeerId) -> Result<Vec<Measurement>>;
}
