use anyhow::{Context as AnyhowContext, Result, anyhow};
use clap::{Parser, Subcommand};
use noderun::dataflow::edge::{LocalEdge, PhysicalEdge};
use noderun::dataflow::port::{InputPort, NodePorts, OutputPort};
use noderun::operator::registry::OperatorRegistry;
use noderun::runtime::config::load_node_config_from_yaml;
use noderun::runtime::executor::NodeExecutor;
use noderun::runtime::node::NodeIdentifier;
use noderun::runtime::status::ExecutionStatus;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single node
    Run {
        /// Path to the node config YAML file
        #[arg(long)]
        config: PathBuf,

        /// JSON array of records fed to the node's input port
        #[arg(long)]
        input: Option<PathBuf>,

        /// Node identifier used in logs
        #[arg(long)]
        name: Option<String>,
    },
}

fn load_records(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input records from {:?}", path))?;
    let records: Vec<Value> = serde_json::from_str(&content)
        .with_context(|| format!("Input file {:?} must hold a JSON array", path))?;
    Ok(records)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, input, name } => {
            info!("Loading node config from: {:?}", config);
            let node_config = load_node_config_from_yaml(&config.to_string_lossy())?;
            let kind = node_config
                .operator
                .clone()
                .ok_or_else(|| anyhow!("Node config does not name an operator"))?;

            let registry = OperatorRegistry::with_builtins();
            let ports = NodePorts::new();
            let operator = registry.create(&kind, ports.clone())?;

            // Upstream side: publish the input records once, like a finished producer
            let records = match &input {
                Some(path) => load_records(path)?,
                None => Vec::new(),
            };
            info!("Feeding {} record(s) to operator '{}'", records.len(), kind);
            let upstream = OutputPort::new();
            upstream.write_all(records).await;
            let incoming = Arc::new(LocalEdge::new("input", &upstream, &ports.input));
            incoming.flush().await?;

            let downstream = InputPort::new();
            let outgoing = Arc::new(LocalEdge::new("output", &ports.output, &downstream));

            let mut executor =
                NodeExecutor::new(name.map(NodeIdentifier::from), node_config, operator);
            executor.add_incoming_edge(incoming);
            executor.add_outgoing_edge(outgoing.clone());

            let node = executor.execute().await;

            match executor.execution_status() {
                ExecutionStatus::Success => {
                    let output = outgoing.buffered().await;
                    println!("{}", serde_json::to_string_pretty(&output)?);
                    info!(node = %node, "Node finished with {}", ExecutionStatus::Success);
                }
                status => {
                    if let Some(failure) = executor.failure() {
                        error!(node = %node, "Node finished with {}: {:?}", status, failure);
                    }
                    process::exit(1);
                }
            }
        }
    }

    Ok(())
}
