//! CLI error types.

use crate::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is invalid or missing required fields.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A `--arg` value was not in `name=value` form.
    #[error("invalid argument '{0}': expected name=value")]
    InvalidArgument(String),

    /// An error occurred in the bridge layer.
    #[error(transparent)]
    Bridge(#[from] bridge::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
