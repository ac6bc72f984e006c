mod config;
mod error;

use std::path::PathBuf;

use bridge::{
    ActionTrigger, Bridge, ChatHost, ContextUpdate, HostError, OutgoingMessage, ToolCatalog,
    ToolSource, TriggerArgument, TriggerRole, catalog,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use worker::Worker;

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "bridge.toml";

#[derive(Parser)]
#[command(name = "toolbridge")]
#[command(about = "Bridge a chat host to a tool-executing worker process", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tools the bridge would publish
    Tools,
    /// Invoke one tool end to end and print the resulting chat message
    Call {
        /// Tool name
        tool: String,
        /// Tool arguments as name=value pairs
        #[arg(short, long = "arg", value_name = "NAME=VALUE")]
        args: Vec<String>,
    },
}

/// Host adapter that prints outbound events to stdout.
struct StdoutHost;

impl ChatHost for StdoutHost {
    async fn update_context(&self, update: ContextUpdate) -> std::result::Result<(), HostError> {
        println!(
            "[host] {} actions registered under context '{}'",
            update.actions.len(),
            update.context_key
        );
        Ok(())
    }

    async fn send_message(&self, message: OutgoingMessage) -> std::result::Result<(), HostError> {
        println!("{}", message.text);
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    // Log to stderr; stdout carries the host-visible output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Tools => cmd_tools(&config).await,
        Commands::Call { tool, args } => cmd_call(&config, &tool, &args).await,
    }
}

async fn cmd_tools(config: &Config) -> Result<()> {
    let bridge_config = config.bridge_config()?;

    let catalog = match &bridge_config.tool_source {
        ToolSource::File(path) => catalog::load_from_file(path).map_err(bridge::Error::from)?,
        ToolSource::Handshake => {
            let worker = Worker::spawn(config.worker_config())
                .await
                .map_err(bridge::Error::from)?;
            let raw = worker.request_tools().await.map_err(bridge::Error::from)?;
            let catalog = catalog::load_from_handshake(&raw).map_err(bridge::Error::from)?;
            worker
                .shutdown(bridge_config.grace_period)
                .await
                .map_err(bridge::Error::from)?;
            catalog
        }
    };

    print_catalog(&catalog);
    Ok(())
}

fn print_catalog(catalog: &ToolCatalog) {
    println!("{:<40}  {:<6}  DESCRIPTION", "NAME", "ARGS");
    println!("{}", "-".repeat(80));

    for tool in catalog.iter() {
        let description = truncate(&tool.description, 60);
        println!(
            "{:<40}  {:<6}  {description}",
            tool.name,
            tool.parameters.len()
        );
    }
}

/// Truncate a description for display, on a character boundary.
fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}

async fn cmd_call(config: &Config, tool: &str, args: &[String]) -> Result<()> {
    let arguments = parse_arguments(args)?;
    let bridge_config = config.bridge_config()?;
    let layer = bridge_config.layer.clone();

    let bridge = Bridge::start(config.worker_config(), bridge_config, StdoutHost).await?;

    if bridge.catalog().get(tool).is_none() {
        eprintln!("warning: '{tool}' is not in the catalog; forwarding anyway");
    }

    bridge.publish_actions().await?;

    let outcome = bridge
        .dispatch(ActionTrigger {
            name: tool.to_string(),
            layer,
            role: TriggerRole::User,
            arguments,
        })
        .await;
    println!("[bridge] dispatch: {outcome:?}");

    bridge.shutdown().await?;
    Ok(())
}

fn parse_arguments(args: &[String]) -> Result<Vec<TriggerArgument>> {
    args.iter()
        .map(|arg| {
            let (name, value) = arg
                .split_once('=')
                .ok_or_else(|| Error::InvalidArgument(arg.clone()))?;
            Ok(TriggerArgument {
                name: Some(name.to_string()),
                value: Some(value.to_string()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_arguments_splits_on_first_equals() {
        let args = vec!["query=a=b".to_string()];
        let parsed = parse_arguments(&args).unwrap();
        assert_eq!(parsed[0].name.as_deref(), Some("query"));
        assert_eq!(parsed[0].value.as_deref(), Some("a=b"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let multibyte = format!("a{}", "é".repeat(70));
        let truncated = truncate(&multibyte, 60);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 63);

        assert_eq!(truncate("short", 60), "short");
    }

    #[test]
    fn print_catalog_handles_multibyte_descriptions() {
        let raw = format!(
            r#"{{"tools": [{{"name": "lookup", "description": "{}"}}]}}"#,
            "é".repeat(70)
        );
        let catalog = catalog::load_from_handshake(&raw).unwrap();
        print_catalog(&catalog);
    }

    #[test]
    fn parse_arguments_rejects_bare_names() {
        let args = vec!["no-equals".to_string()];
        assert!(matches!(
            parse_arguments(&args),
            Err(Error::InvalidArgument(_))
        ));
    }
}
