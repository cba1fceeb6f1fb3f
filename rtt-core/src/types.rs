use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Moving-average window capacity per peer (samples).
pub const MOVING_AVERAGE_WINDOW: usize = 50;

/// Hardware identifier of a ranging target (48-bit MAC-style address).
///
/// Equality, ordering, and hashing are value-based; the canonical text
/// form is lowercase colon-separated hex (`aa:bb:cc:dd:ee:ff`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId([u8; 6]);

impl PeerId {
	pub const fn new(octets: [u8; 6]) -> Self { Self(octets) }
	pub const fn octets(&self) -> [u8; 6] { self.0 }
}

impl fmt::Display for PeerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let o = &self.0;
		write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", o[0], o[1], o[2], o[3], o[4], o[5])
	}
}

impl FromStr for PeerId {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut octets = [0u8; 6];
		let mut parts = s.split(':');
		for octet in &mut octets {
			let part = parts.next().ok_or_else(|| Error::invalid_peer_id(s))?;
			*octet = u8::from_str_radix(part, 16).map_err(|_| Error::invalid_peer_id(s))?;
		}
		if parts.next().is_some() {
			return Err(Error::invalid_peer_id(s));
		}
		Ok(Self(octets))
	}
}

impl Serialize for PeerId {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for PeerId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(de::Error::custom)
	}
}

/// Outcome reported by the ranging transport for a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasurementStatus {
	Ok,
	Fail,
}

/// One distance-ranging sample with its metadata. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
	pub peer: PeerId,
	pub distance_mm: i32,
	pub distance_std_dev_mm: i32,
	pub rssi: i32,
	pub status: MeasurementStatus,
	/// Timestamp assigned by the ranging protocol (millis since device boot).
	pub ranging_timestamp_millis: i64,
	/// Wall-clock time the sample was observed (epoch millis).
	pub observed_at_millis: i64,
}

impl Measurement {
	/// Build a measurement stamped with the current wall clock, the form
	/// transport adapters hand to the session controller.
	pub fn observed_now(
		peer: PeerId,
		distance_mm: i32,
		distance_std_dev_mm: i32,
		rssi: i32,
		status: MeasurementStatus,
		ranging_timestamp_millis: i64,
	) -> Self {
		Self {
			peer,
			distance_mm,
			distance_std_dev_mm,
			rssi,
			status,
			ranging_timestamp_millis,
			observed_at_millis: chrono::Utc::now().timestamp_millis(),
		}
	}

	pub fn is_ok(&self) -> bool { self.status == MeasurementStatus::Ok }
	pub fn is_fail(&self) -> bool { self.status == MeasurementStatus::Fail }
}
