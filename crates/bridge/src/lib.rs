//! Chat-host to tool-worker bridge.
//!
//! This crate turns an external tool catalog into host-registered
//! actions and routes action triggers to a worker subprocess over a
//! line-delimited JSON protocol.
//!
//! The pieces, in dependency order:
//!
//! - **catalog**: loads tool declarations from a file or from a worker
//!   handshake into one normalized [`ToolCatalog`].
//! - **registrar**: projects the catalog into the host's action schema
//!   (string-only argument types).
//! - **router**: the [`Bridge`] context object — owns the worker and
//!   catalog, publishes actions, and dispatches triggers.
//! - **host**: the boundary types and the [`ChatHost`] trait the
//!   surrounding application implements.
//!
//! # Example
//!
//! ```ignore
//! use bridge::{Bridge, BridgeConfig, ToolSource};
//! use worker::WorkerConfig;
//!
//! # async fn example(host: impl bridge::ChatHost) -> bridge::Result<()> {
//! let mut worker_config = WorkerConfig::new("python3");
//! worker_config.args = vec!["worker.py".to_string()];
//!
//! let config = BridgeConfig::new(ToolSource::File("tools.json".into()));
//! let bridge = Bridge::start(worker_config, config, host).await?;
//! bridge.publish_actions().await?;
//! // ... hand triggers to bridge.dispatch(...) ...
//! bridge.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
mod error;
pub mod host;
pub mod registrar;
mod router;

pub use catalog::{CatalogError, ParamKind, ToolCatalog, ToolDeclaration, ToolParameter};
pub use error::{Error, Result};
pub use host::{
    ActionDefinition, ActionTrigger, ArgumentDefinition, ArgumentKind, ChatHost, ContextUpdate,
    HostError, OutgoingMessage, TriggerArgument, TriggerRole,
};
pub use router::{Bridge, BridgeConfig, Dispatch, ToolSource};
