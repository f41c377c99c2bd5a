//! Node scoring CLI commands

use anyhow::{bail, Result};
use colored::Colorize;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use scorer_lib::{pod_key, CPU_REQUEST_LABEL, MEM_REQUEST_LABEL};
use std::collections::BTreeMap;
use tabled::Tabled;

use crate::client::{ApiClient, PrioritizeRequest, PrioritizeResponse};
use crate::config::fetch_pod;
use crate::output::{color_score, print_error, print_json, print_warning, OutputFormat};

/// Name given to pods built from command-line demand
const PROBE_POD_NAME: &str = "edgectl-probe";

/// Row for scores table
#[derive(Tabled)]
struct ScoreRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Score")]
    score: String,
}

/// Where the pod to score comes from
pub enum PodSource {
    /// Read `namespace/name` from the cluster
    Cluster { pod_ref: String },
    /// Build a pod carrying the given request labels
    Demand {
        cpu_request: String,
        mem_request: String,
    },
}

impl PodSource {
    pub fn from_args(
        pod: Option<String>,
        cpu_request: Option<String>,
        mem_request: Option<String>,
    ) -> Result<Self> {
        match (pod, cpu_request, mem_request) {
            (Some(pod_ref), None, None) => Ok(PodSource::Cluster { pod_ref }),
            (None, Some(cpu_request), Some(mem_request)) => Ok(PodSource::Demand {
                cpu_request,
                mem_request,
            }),
            (Some(_), _, _) => bail!("--pod cannot be combined with --cpu-request/--mem-request"),
            _ => bail!("either --pod or both --cpu-request and --mem-request are required"),
        }
    }

    async fn resolve(self, kubeconfig: Option<&str>) -> Result<Pod> {
        match self {
            PodSource::Cluster { pod_ref } => fetch_pod(kubeconfig, &pod_ref).await,
            PodSource::Demand {
                cpu_request,
                mem_request,
            } => Ok(probe_pod(cpu_request, mem_request)),
        }
    }
}

/// Pod with only the request labels set; the server validates the values
pub fn probe_pod(cpu_request: String, mem_request: String) -> Pod {
    let labels = BTreeMap::from([
        (CPU_REQUEST_LABEL.to_string(), cpu_request),
        (MEM_REQUEST_LABEL.to_string(), mem_request),
    ]);

    Pod {
        metadata: ObjectMeta {
            name: Some(PROBE_POD_NAME.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Score nodes for a pod and print them best first
pub async fn score_nodes(
    client: &ApiClient,
    source: PodSource,
    nodes: Vec<String>,
    kubeconfig: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let pod = source.resolve(kubeconfig).await?;
    let request = PrioritizeRequest {
        pod: &pod,
        node_names: &nodes,
    };
    let result: PrioritizeResponse = client.post("api/v1/prioritize", &request).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", "Node Scores".bold());
            println!("{}", "=".repeat(50));
            println!("Pod: {}", pod_key(&pod).cyan());
            println!();

            if result.scores.is_empty() {
                print_warning("No node could be scored");
            } else {
                let mut ranked = result.scores.clone();
                ranked.sort_by(|a, b| b.score.cmp(&a.score));

                let rows: Vec<ScoreRow> = ranked
                    .into_iter()
                    .enumerate()
                    .map(|(i, s)| ScoreRow {
                        rank: i + 1,
                        node: s.node_name,
                        score: color_score(s.score),
                    })
                    .collect();

                let table = tabled::Table::new(rows)
                    .with(tabled::settings::Style::rounded())
                    .to_string();
                println!("{}", table);
            }

            if !result.errors.is_empty() {
                println!();
                for e in &result.errors {
                    print_error(&format!("{}: {} ({})", e.node_name, e.error, e.code));
                }
            }
        }
    }

    Ok(())
}
