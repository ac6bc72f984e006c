//! Configuration loading from bridge.toml.

use bridge::{BridgeConfig, ToolSource};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use worker::WorkerConfig;

/// Top-level configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Worker subprocess settings.
    pub worker: WorkerSection,

    /// Bridge settings.
    #[serde(default)]
    pub bridge: BridgeSection,
}

/// The `[worker]` section. Interpreter and entry script are required;
/// starting a bridge without them is a configuration error.
#[derive(Debug, Deserialize)]
pub struct WorkerSection {
    /// Interpreter executable (e.g. "python3").
    pub command: String,

    /// Worker entry script, passed as the interpreter's first argument.
    pub script: String,

    /// Extra arguments appended after the script.
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment for the worker process.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// The `[bridge]` section.
#[derive(Debug, Deserialize)]
pub struct BridgeSection {
    /// Routing label for published actions and trigger filtering.
    #[serde(default = "default_layer")]
    pub layer: String,

    /// Context key the action set is published under.
    #[serde(default = "default_context_key")]
    pub context_key: String,

    /// Where the tool catalog comes from.
    #[serde(default)]
    pub tool_source: ToolSourceKind,

    /// Tool declaration file; required when `tool_source = "file"`.
    pub tools_file: Option<PathBuf>,

    /// Timeout for one worker round trip.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Grace period before a non-exiting worker is killed.
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolSourceKind {
    #[default]
    File,
    Handshake,
}

fn default_layer() -> String {
    "tools".to_string()
}

fn default_context_key() -> String {
    "ToolActions".to_string()
}

fn default_call_timeout() -> u64 {
    30
}

fn default_grace_period() -> u64 {
    5
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            layer: default_layer(),
            context_key: default_context_key(),
            tool_source: ToolSourceKind::default(),
            tools_file: None,
            call_timeout_secs: default_call_timeout(),
            grace_period_secs: default_grace_period(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Build the worker configuration.
    pub fn worker_config(&self) -> WorkerConfig {
        let mut config = WorkerConfig::new(&self.worker.command);
        config.args = std::iter::once(self.worker.script.clone())
            .chain(self.worker.args.iter().cloned())
            .collect();
        config.env = self.worker.env.clone();
        config.call_timeout = Duration::from_secs(self.bridge.call_timeout_secs);
        config
    }

    /// Build the bridge configuration.
    ///
    /// Fails when the file tool source is selected without a
    /// declaration file path.
    pub fn bridge_config(&self) -> Result<BridgeConfig, ConfigError> {
        let tool_source = match self.bridge.tool_source {
            ToolSourceKind::File => match &self.bridge.tools_file {
                Some(path) => ToolSource::File(path.clone()),
                None => return Err(ConfigError::MissingToolsFile),
            },
            ToolSourceKind::Handshake => ToolSource::Handshake,
        };

        Ok(BridgeConfig {
            layer: self.bridge.layer.clone(),
            context_key: self.bridge.context_key.clone(),
            tool_source,
            grace_period: Duration::from_secs(self.bridge.grace_period_secs),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("tool_source is \"file\" but bridge.tools_file is not set")]
    MissingToolsFile,
}
