//! Edge Scorer CLI
//!
//! A command-line tool for scoring edge nodes for a pod and inspecting
//! the forecasts the scorer works from.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{nodes, score};

/// Edge Scorer CLI
#[derive(Parser)]
#[command(name = "edgectl")]
#[command(author, version, about = "CLI for the Edge Scorer", long_about = None)]
pub struct Cli {
    /// Scorer API URL (can also be set via EDGECTL_API_URL env var)
    #[arg(long, env = "EDGECTL_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Path to kubeconfig file (uses default if not specified)
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score nodes for a pod
    Score {
        /// Node to score (repeat for several nodes)
        #[arg(long = "node", short = 'n', required = true)]
        nodes: Vec<String>,

        /// Pod to score, as namespace/name, read from the cluster
        #[arg(long)]
        pod: Option<String>,

        /// CPU request fraction, instead of --pod
        #[arg(long)]
        cpu_request: Option<String>,

        /// Memory request fraction, instead of --pod
        #[arg(long)]
        mem_request: Option<String>,
    },

    /// Show a node's utilization forecast
    Forecast {
        /// Node name
        node: String,
    },

    /// List nodes with a configured metrics endpoint
    Targets,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = client::ApiClient::new(&cli.api_url)?;

    match cli.command {
        Commands::Score {
            nodes,
            pod,
            cpu_request,
            mem_request,
        } => {
            let source = score::PodSource::from_args(pod, cpu_request, mem_request)?;
            score::score_nodes(&client, source, nodes, cli.kubeconfig.as_deref(), cli.format)
                .await?;
        }
        Commands::Forecast { node } => {
            nodes::show_forecast(&client, &node, cli.format).await?;
        }
        Commands::Targets => {
            nodes::list_targets(&client, cli.format).await?;
        }
    }

    Ok(())
}
