//! Core data models for edge node scoring

use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};

/// Highest score a node can receive
pub const MAX_NODE_SCORE: i64 = 100;

/// Lowest score a node can receive
pub const MIN_NODE_SCORE: i64 = 0;

/// Current and predicted utilization of a node, as ratios of capacity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceForecast {
    pub cpu_current: f64,
    pub cpu_future: f64,
    pub mem_current: f64,
    pub mem_future: f64,
}

/// Resources a pod asks for, expressed as utilization fractions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceDemand {
    pub cpu_requested: f64,
    pub mem_requested: f64,
}

/// Metrics endpoint of a single node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTarget {
    // Some config sources lowercase keys
    #[serde(alias = "nodename")]
    pub node_name: String,
    pub ip: String,
    pub port: String,
}

impl NodeTarget {
    pub fn new(node_name: impl Into<String>, ip: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            ip: ip.into(),
            port: port.into(),
        }
    }

    /// URL of the node's metrics endpoint
    pub fn metrics_url(&self) -> String {
        format!("http://{}:{}/metrics", self.ip, self.port)
    }
}

/// Readiness of a node to take more load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeLabel {
    /// Forecast is below the low threshold
    Schedulable,
    /// Forecast is between the two thresholds
    Unschedulable,
    /// Forecast is at or above the high threshold
    NeedsMigration,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Schedulable => "schedulable",
            NodeLabel::Unschedulable => "unschedulable",
            NodeLabel::NeedsMigration => "needs-migration",
        }
    }
}

impl std::fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of scoring one node for one pod
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub label: NodeLabel,
    /// Weighted blend of future CPU and memory utilization
    pub signal: f64,
    /// Score in [0, 1] before scaling
    pub raw_score: f64,
    /// Score in [MIN_NODE_SCORE, MAX_NODE_SCORE]
    pub final_score: i64,
}

/// A node paired with its score, as handed to normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeScore {
    pub node_name: String,
    pub score: i64,
}

impl NodeScore {
    pub fn new(node_name: impl Into<String>, score: i64) -> Self {
        Self {
            node_name: node_name.into(),
            score,
        }
    }
}

/// `namespace/name` of a pod, for logging
pub fn pod_key(pod: &Pod) -> String {
    let name = pod.metadata.name.as_deref().unwrap_or("<unnamed>");
    match pod.metadata.namespace.as_deref() {
        Some(namespace) => format!("{}/{}", namespace, name),
        None => name.to_string(),
    }
}
