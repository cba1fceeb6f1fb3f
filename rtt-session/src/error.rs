#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("core error: {0}")]
    Core(#[from] rtt_core::Error),
    #[error("batch channel closed")]
    ChannelClosed,
}

impl Error {
    pub fn transport(msg: impl Into<String>) -> Self { Error::Transport(msg.into()) }
}
