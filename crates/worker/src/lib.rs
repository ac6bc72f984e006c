//! Worker subprocess management and line protocol.
//!
//! This crate owns the lifecycle of one tool-executing subprocess and the
//! line-delimited JSON protocol spoken over its standard streams: one
//! JSON object per line, request/response pairs correlated by strict
//! alternation.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use worker::{Request, Worker, WorkerConfig, DEFAULT_GRACE_PERIOD};
//!
//! # async fn example() -> worker::Result<()> {
//! let mut config = WorkerConfig::new("python3");
//! config.args = vec!["worker.py".to_string()];
//!
//! let worker = Worker::spawn(config).await?;
//!
//! let mut arguments = BTreeMap::new();
//! arguments.insert("page_id".to_string(), "abc123".to_string());
//! let response = worker.call(&Request::call_tool("retrieve_page", arguments)).await?;
//!
//! worker.shutdown(DEFAULT_GRACE_PERIOD).await?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod protocol;
mod supervisor;

pub use error::{Error, Result};
pub use protocol::{CallParams, ProtocolError, Request, Response};
pub use supervisor::{
    DEFAULT_CALL_TIMEOUT, DEFAULT_GRACE_PERIOD, MAX_RESPONSE_SIZE, Worker, WorkerConfig,
};
