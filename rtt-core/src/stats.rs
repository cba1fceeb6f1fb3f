//! Per-peer ranging statistics.
//!
//! Folds an incoming measurement stream into one accumulator per peer:
//! lifetime average, bounded-window moving average, and latest value.
//! Peers are created lazily on their first passing measurement and kept
//! until an explicit [`StatsTracker::reset`].

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use tracing::debug;

use crate::types::{Measurement, PeerId, MOVING_AVERAGE_WINDOW};

/// Running accumulators for a single peer.
#[derive(Debug, Clone, Default)]
struct PeerStats {
	running_sum: i64,
	running_count: u64,
	window: VecDeque<i32>,
	latest: i32,
}

impl PeerStats {
	fn fold(&mut self, distance_mm: i32) {
		self.running_sum += i64::from(distance_mm);
		self.running_count += 1;
		self.window.push_back(distance_mm);
		if self.window.len() > MOVING_AVERAGE_WINDOW {
			self.window.pop_front();
		}
		self.latest = distance_mm;
	}

	// Only called once running_count >= 1; PeerStats is created on first fold.
	fn average_mm(&self) -> i64 {
		self.running_sum / self.running_count as i64
	}

	fn moving_average_mm(&self) -> i64 {
		let sum: i64 = self.window.iter().copied().map(i64::from).sum();
		sum / self.window.len() as i64
	}
}

/// One row of a [`SessionSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryEntry {
	pub peer: PeerId,
	pub average_mm: i64,
	pub moving_average_mm: i64,
	pub latest_mm: i32,
}

/// Consolidated per-peer statistics, recomputed after each folded batch.
/// Entries are sorted by peer id so repeated summaries are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
	pub entries: Vec<SummaryEntry>,
}

impl SessionSummary {
	pub fn is_empty(&self) -> bool { self.entries.is_empty() }

	pub fn entry(&self, peer: &PeerId) -> Option<&SummaryEntry> {
		self.entries.iter().find(|e| e.peer == *peer)
	}
}

impl fmt::Display for SessionSummary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for e in &self.entries {
			writeln!(f, "Mac: {} - Average Distance: {}mm", e.peer, e.average_mm)?;
			writeln!(f, "Mac: {} - Moving Average Distance: {}mm", e.peer, e.moving_average_mm)?;
			writeln!(f, "Mac: {} - Current Distance: {}mm", e.peer, e.latest_mm)?;
		}
		Ok(())
	}
}

/// Tracks ranging statistics for every peer observed during a session.
///
/// Single-writer by contract: the session controller's consumer task is
/// the only mutator (see the session crate's concurrency model).
#[derive(Debug, Default)]
pub struct StatsTracker {
	peers: BTreeMap<PeerId, PeerStats>,
}

impl StatsTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Fold one measurement into its peer's accumulators.
	///
	/// A `Fail`-status measurement is discarded without touching any
	/// state; batch-level integrity is enforced by the caller.
	pub fn observe(&mut self, m: &Measurement) {
		if m.is_fail() {
			debug!(peer = %m.peer, "discarding failed measurement");
			return;
		}
		self.peers.entry(m.peer).or_default().fold(m.distance_mm);
	}

	/// Compute the current summary, one entry per known peer.
	///
	/// Peers with no passing measurement yet are simply absent, so no
	/// entry can ever divide by zero.
	pub fn summarize(&self) -> SessionSummary {
		let entries = self
			.peers
			.iter()
			.map(|(peer, stats)| SummaryEntry {
				peer: *peer,
				average_mm: stats.average_mm(),
				moving_average_mm: stats.moving_average_mm(),
				latest_mm: stats.latest,
			})
			.collect();
		SessionSummary { entries }
	}

	/// Drop all per-peer state. Starting a session deliberately does not
	/// call this; accumulation across start/stop cycles is documented
	/// behavior and callers opt into clearing it.
	pub fn reset(&mut self) {
		self.peers.clear();
	}

	pub fn peer_count(&self) -> usize {
		self.peers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.peers.is_empty()
	}
}
