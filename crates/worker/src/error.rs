//! Worker subprocess error types.

use crate::protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to spawn worker: {0}")]
    Spawn(std::io::Error),

    #[error("worker I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("worker is not running")]
    NotRunning,

    #[error("worker closed its output stream")]
    Exited,

    #[error("timeout waiting for worker response")]
    Timeout,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("response too large: {size} bytes (max {max})")]
    ResponseTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
