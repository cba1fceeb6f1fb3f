use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	#[error("config: {0}")]
	Config(String),
	#[error("invalid peer id: {0}")]
	InvalidPeerId(String),
}

impl Error {
	pub fn config(msg: impl Into<String>) -> Self { Self::Config(msg.into()) }
	pub fn invalid_peer_id(msg: impl Into<String>) -> Self { Self::InvalidPeerId(msg.into()) }
}
