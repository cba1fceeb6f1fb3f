// Test harness for RTT ranging integration tests
//
// Provides infrastructure for:
// - Scripted ranging exchanges per target (batches and failures)
// - Deterministic measurement construction
// - Tracing initialization for test visibility

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use rtt_core::{Measurement, MeasurementStatus, PeerId};
use rtt_session::{Error, RangingSource};

/// Test result type alias
pub type TestResult<T> = Result<T>;

/// Initialize tracing for test visibility (idempotent).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

/// Deterministic peer id helper: `02:42:00:00:00:<last>`.
pub fn peer(last: u8) -> PeerId {
    PeerId::new([0x02, 0x42, 0x00, 0x00, 0x00, last])
}

/// Deterministic measurement helper with fixed metadata.
pub fn measurement(peer: PeerId, distance_mm: i32, status: MeasurementStatus) -> Measurement {
    Measurement {
        peer,
        distance_mm,
        distance_std_dev_mm: 5,
        rssi: -50,
        status,
        ranging_timestamp_millis: 42,
        observed_at_millis: 1_700_000_000_000,
    }
}

/// Scripted stand-in for the external ranging transport.
///
/// Each target carries a queue of exchange outcomes; once a queue runs
/// dry the subscription simply pends, like an idle radio. The session
/// controller's restart loop is what drains the queue, so scripts also
/// exercise the re-subscription path.
#[derive(Default)]
pub struct ScriptedRangingSource {
    script: Mutex<HashMap<PeerId, VecDeque<Result<Vec<Measurement>, Error>>>>,
}

impl ScriptedRangingSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one successful exchange delivering `batch`.
    pub fn push_batch(&self, target: PeerId, batch: Vec<Measurement>) {
        self.script.lock().unwrap().entry(target).or_default().push_back(Ok(batch));
    }

    /// Queue one failing exchange.
    pub fn push_failure(&self, target: PeerId, message: &str) {
        self.script
            .lock()
            .unwrap()
            .entry(target)
            .or_default()
            .push_back(Err(Error::transport(message)));
    }
}

#[async_trait]
impl RangingSource for ScriptedRangingSource {
    async fn range(&self, target: PeerId) -> Result<Vec<Measurement>, Error> {
        let next = self.script.lock().unwrap().get_mut(&target).and_then(VecDeque::pop_front);
        match next {
            Some(outcome) => outcome,
            None => std::future::pending().await,
        }
    }
}
