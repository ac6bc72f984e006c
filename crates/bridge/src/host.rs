//! Chat-session host boundary.
//!
//! The host itself (message transport, session identity, trigger
//! delivery) lives outside this crate; these are the events crossing the
//! boundary and the trait the bridge consumes.

use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

/// Argument types the host supports for action triggers.
///
/// The host contract is string-only; the registrar coerces every
/// declared parameter type down to `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentKind {
    String,
}

/// One argument of a published action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ArgumentKind,
    pub required: bool,
    pub description: String,
}

/// The host-schema projection of a tool declaration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    pub name: String,
    /// Routing label distinguishing this bridge's actions in a shared host.
    pub layer: String,
    pub description: String,
    pub arguments: Vec<ArgumentDefinition>,
}

/// Outbound "publish actions" event.
///
/// Republishing under the same context key replaces the prior action set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextUpdate {
    pub context_key: String,
    pub actions: Vec<ActionDefinition>,
}

/// Outbound chat message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub text: String,
    /// Suppresses the host's automatic re-inference so a tool response
    /// cannot trigger another action.
    pub suppress_inference: bool,
}

/// Role that originated an action trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerRole {
    User,
    Assistant,
    System,
}

/// One argument carried by a trigger. Either field may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerArgument {
    pub name: Option<String>,
    pub value: Option<String>,
}

/// Inbound "action triggered" event from the host.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionTrigger {
    pub name: String,
    pub layer: String,
    pub role: TriggerRole,
    #[serde(default)]
    pub arguments: Vec<TriggerArgument>,
}

/// Failure to deliver an event to the host.
#[derive(Debug, Error)]
#[error("host delivery failed: {0}")]
pub struct HostError(pub String);

/// Outbound half of the host boundary.
///
/// Implementations deliver events to whatever transport the host uses;
/// the bridge never needs more than these two operations.
pub trait ChatHost: Send + Sync {
    /// Publish (or replace) this bridge's action set.
    fn update_context(
        &self,
        update: ContextUpdate,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    /// Send a chat message on behalf of the bridge.
    fn send_message(
        &self,
        message: OutgoingMessage,
    ) -> impl Future<Output = Result<(), HostError>> + Send;
}
