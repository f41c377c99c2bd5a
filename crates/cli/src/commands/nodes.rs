//! Node inspection CLI commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, ForecastResponse, TargetList};
use crate::output::{color_ratio, print_json, print_warning, OutputFormat};

/// Row for targets table
#[derive(Tabled)]
struct TargetRow {
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Metrics Endpoint")]
    endpoint: String,
}

/// Show a node's current and predicted utilization
pub async fn show_forecast(client: &ApiClient, node: &str, format: OutputFormat) -> Result<()> {
    let path = format!("api/v1/forecasts/{}", node);
    let result: ForecastResponse = client.get(&path).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            let f = &result.forecast;
            println!("{}", "Node Forecast".bold());
            println!("{}", "=".repeat(40));
            println!("Node:     {}", result.node_name.cyan());
            println!();
            println!("{:<10}{:>12}{:>12}", "", "Current", "Future");
            println!(
                "{:<10}{:>12}{:>12}",
                "CPU",
                color_ratio(f.cpu_current),
                color_ratio(f.cpu_future)
            );
            println!(
                "{:<10}{:>12}{:>12}",
                "Memory",
                color_ratio(f.mem_current),
                color_ratio(f.mem_future)
            );
        }
    }

    Ok(())
}

/// List nodes with a configured metrics endpoint
pub async fn list_targets(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: TargetList = client.get("api/v1/targets").await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if result.targets.is_empty() {
                print_warning("No forecast targets configured");
                return Ok(());
            }

            let rows: Vec<TargetRow> = result
                .targets
                .iter()
                .map(|t| TargetRow {
                    node: t.node_name.clone(),
                    endpoint: t.metrics_url(),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} targets", result.targets.len());
        }
    }

    Ok(())
}
