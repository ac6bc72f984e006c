//! The bridge context object and trigger dispatch.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use worker::{Request, Worker, WorkerConfig};

use crate::catalog::{self, ToolCatalog};
use crate::error::Result;
use crate::host::{ActionTrigger, ChatHost, ContextUpdate, OutgoingMessage, TriggerRole};
use crate::registrar;

/// Where the tool catalog comes from.
#[derive(Debug, Clone)]
pub enum ToolSource {
    /// Static declaration file, read once at startup.
    File(PathBuf),
    /// Tool list requested from the worker over the line protocol.
    Handshake,
}

/// Bridge-level settings (the worker's own settings live in
/// [`WorkerConfig`]).
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Routing label stamped on every published action and matched
    /// against inbound triggers.
    pub layer: String,
    /// Context key the action set is published under.
    pub context_key: String,
    pub tool_source: ToolSource,
    /// Grace period before a non-exiting worker is killed at shutdown.
    pub grace_period: Duration,
}

impl BridgeConfig {
    pub fn new(tool_source: ToolSource) -> Self {
        Self {
            layer: "tools".to_string(),
            context_key: "ToolActions".to_string(),
            tool_source,
            grace_period: worker::DEFAULT_GRACE_PERIOD,
        }
    }
}

/// Terminal state of one handled trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Exactly one chat message was emitted.
    Delivered,
    /// Filtered out (wrong layer or role); silent no-op.
    Dropped,
    /// Worker unavailable or the exchange failed; logged, no message.
    Failed,
}

/// The bridge: one worker, one catalog, one host connection.
///
/// Explicitly constructed and owned by the caller; there is no ambient
/// bridge state.
pub struct Bridge<H> {
    worker: Worker,
    catalog: ToolCatalog,
    config: BridgeConfig,
    host: H,
}

impl<H: ChatHost> Bridge<H> {
    /// Assemble a bridge from already-initialized parts.
    pub fn new(worker: Worker, catalog: ToolCatalog, config: BridgeConfig, host: H) -> Self {
        Self {
            worker,
            catalog,
            config,
            host,
        }
    }

    /// Spawn the worker and load the catalog from the configured source.
    ///
    /// Catalog failures abort startup; the just-spawned worker is killed
    /// on drop.
    pub async fn start(
        worker_config: WorkerConfig,
        config: BridgeConfig,
        host: H,
    ) -> Result<Self> {
        let worker = Worker::spawn(worker_config).await?;

        let catalog = match &config.tool_source {
            ToolSource::File(path) => catalog::load_from_file(path)?,
            ToolSource::Handshake => {
                let raw = worker.request_tools().await?;
                catalog::load_from_handshake(&raw)?
            }
        };

        tracing::info!(tools = catalog.len(), "bridge started");
        Ok(Self::new(worker, catalog, config, host))
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn worker(&self) -> &Worker {
        &self.worker
    }

    /// Publish the action set to the host.
    ///
    /// Safe to call again after a catalog refresh; the host replaces the
    /// action set registered under the same context key.
    pub async fn publish_actions(&self) -> Result<()> {
        let update = ContextUpdate {
            context_key: self.config.context_key.clone(),
            actions: registrar::actions_for(&self.catalog, &self.config.layer),
        };
        tracing::info!(actions = update.actions.len(), "publishing actions");
        self.host.update_context(update).await?;
        Ok(())
    }

    /// Handle one inbound trigger to a terminal state.
    ///
    /// Per-invocation failures are contained here; this never returns an
    /// error and never takes the bridge down.
    pub async fn dispatch(&self, trigger: ActionTrigger) -> Dispatch {
        if trigger.layer != self.config.layer {
            tracing::debug!(layer = %trigger.layer, "ignoring trigger for another layer");
            return Dispatch::Dropped;
        }
        // Only user-originated triggers are forwarded, so the bridge's
        // own messages can never re-trigger it.
        if trigger.role != TriggerRole::User {
            tracing::debug!(tool = %trigger.name, "ignoring trigger from non-user role");
            return Dispatch::Dropped;
        }

        tracing::info!(tool = %trigger.name, "action triggered");

        let arguments: BTreeMap<String, String> = trigger
            .arguments
            .iter()
            .map(|argument| {
                (
                    argument.name.clone().unwrap_or_default(),
                    argument.value.clone().unwrap_or_default(),
                )
            })
            .collect();
        let request = Request::call_tool(&trigger.name, arguments);

        let text = match self.worker.call(&request).await {
            Ok(response) => match (response.error, response.result) {
                (Some(error), _) => format!("Error from tool: {error}"),
                (None, Some(result)) => result,
                (None, None) => "No result from tool".to_string(),
            },
            Err(worker::Error::Protocol(e)) => {
                tracing::error!(tool = %trigger.name, "unusable worker response: {e}");
                "Tool call failed: no usable response from worker".to_string()
            }
            Err(e) => {
                tracing::error!(tool = %trigger.name, "worker call failed: {e}");
                return Dispatch::Failed;
            }
        };

        let message = OutgoingMessage {
            text,
            suppress_inference: true,
        };
        match self.host.send_message(message).await {
            Ok(()) => Dispatch::Delivered,
            Err(e) => {
                tracing::error!("failed to deliver chat message: {e}");
                Dispatch::Failed
            }
        }
    }

    /// Shut down the worker with the configured grace period.
    pub async fn shutdown(&self) -> Result<()> {
        self.worker.shutdown(self.config.grace_period).await?;
        Ok(())
    }
}

impl<H: ChatHost + 'static> Bridge<H> {
    /// Offload a trigger to its own task so the host's delivery context
    /// never blocks on subprocess I/O. Requests still serialize at the
    /// worker's I/O mutex; the handle exposes the eventual outcome.
    pub fn spawn_dispatch(self: &Arc<Self>, trigger: ActionTrigger) -> JoinHandle<Dispatch> {
        let bridge = Arc::clone(self);
        tokio::spawn(async move { bridge.dispatch(trigger).await })
    }
}
