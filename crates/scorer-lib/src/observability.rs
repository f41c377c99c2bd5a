//! Observability infrastructure for the edge scorer
//!
//! Provides:
//! - Prometheus metrics (scoring latency, forecast fetch latency, node classifications, errors)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge, Histogram, IntCounterVec,
    IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::error::ScoringError;
use crate::models::{NodeLabel, ResourceDemand, ResourceForecast, ScoreResult};

/// Histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ScorerMetricsInner> = OnceLock::new();

struct ScorerMetricsInner {
    score_latency_seconds: Histogram,
    forecast_fetch_latency_seconds: Histogram,
    nodes_classified: IntCounterVec,
    scoring_errors: IntCounterVec,
    targets_configured: IntGauge,
}

impl ScorerMetricsInner {
    fn new() -> Self {
        Self {
            score_latency_seconds: register_histogram!(
                "edge_scorer_score_latency_seconds",
                "Time spent scoring one node for one pod",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register score_latency_seconds"),

            forecast_fetch_latency_seconds: register_histogram!(
                "edge_scorer_forecast_fetch_latency_seconds",
                "Time spent fetching a node's utilization forecast",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register forecast_fetch_latency_seconds"),

            nodes_classified: register_int_counter_vec!(
                "edge_scorer_nodes_classified_total",
                "Scored nodes by classification label",
                &["label"]
            )
            .expect("Failed to register nodes_classified"),

            scoring_errors: register_int_counter_vec!(
                "edge_scorer_scoring_errors_total",
                "Failed scoring attempts by error kind",
                &["kind"]
            )
            .expect("Failed to register scoring_errors"),

            targets_configured: register_int_gauge!(
                "edge_scorer_targets_configured",
                "Number of nodes with a configured metrics endpoint"
            )
            .expect("Failed to register targets_configured"),
        }
    }
}

/// Scorer metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share it.
#[derive(Clone)]
pub struct ScorerMetrics {
    _private: (),
}

impl Default for ScorerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ScorerMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ScorerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ScorerMetricsInner {
        GLOBAL_METRICS.get_or_init(ScorerMetricsInner::new)
    }

    pub fn observe_score_latency(&self, duration_secs: f64) {
        self.inner().score_latency_seconds.observe(duration_secs);
    }

    pub fn observe_fetch_latency(&self, duration_secs: f64) {
        self.inner()
            .forecast_fetch_latency_seconds
            .observe(duration_secs);
    }

    pub fn inc_classification(&self, label: NodeLabel) {
        self.inner()
            .nodes_classified
            .with_label_values(&[label.as_str()])
            .inc();
    }

    pub fn inc_scoring_error(&self, kind: &str) {
        self.inner().scoring_errors.with_label_values(&[kind]).inc();
    }

    pub fn set_targets_configured(&self, count: i64) {
        self.inner().targets_configured.set(count);
    }
}

/// Structured logger for scorer events
///
/// Keeps the event names and field layout of scoring records consistent
/// so they can be queried from the JSON log stream.
#[derive(Clone)]
pub struct StructuredLogger {
    plugin: String,
}

impl StructuredLogger {
    pub fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
        }
    }

    /// Log the full set of intermediate values behind a node score
    pub fn log_node_scored(
        &self,
        pod: &str,
        node: &str,
        demand: &ResourceDemand,
        forecast: &ResourceForecast,
        result: &ScoreResult,
    ) {
        info!(
            event = "node_scored",
            plugin = %self.plugin,
            pod = %pod,
            node = %node,
            cpu_requested = demand.cpu_requested,
            mem_requested = demand.mem_requested,
            cpu_current = forecast.cpu_current,
            cpu_future = forecast.cpu_future,
            mem_current = forecast.mem_current,
            mem_future = forecast.mem_future,
            signal = result.signal,
            label = %result.label,
            raw_score = result.raw_score,
            final_score = result.final_score,
            "Scored node"
        );
    }

    /// Log a scoring attempt that produced no score
    pub fn log_scoring_failure(&self, pod: &str, node: &str, error: &ScoringError) {
        warn!(
            event = "scoring_failed",
            plugin = %self.plugin,
            pod = %pod,
            node = %node,
            kind = error.kind(),
            error = %error,
            "Node could not be scored"
        );
    }

    /// Log the target table loaded at startup
    pub fn log_targets_loaded(&self, count: usize) {
        info!(
            event = "targets_loaded",
            plugin = %self.plugin,
            targets = count,
            "Forecast targets loaded"
        );
    }

    /// Log scorer startup
    pub fn log_startup(&self, version: &str, alpha: f64, theta1: f64, theta2: f64) {
        info!(
            event = "scorer_started",
            plugin = %self.plugin,
            version = %version,
            alpha = alpha,
            theta1 = theta1,
            theta2 = theta2,
            "Edge scorer started"
        );
    }

    /// Log scorer shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "scorer_shutdown",
            plugin = %self.plugin,
            reason = %reason,
            "Edge scorer shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scorer_metrics_creation() {
        let metrics = ScorerMetrics::new();

        metrics.observe_score_latency(0.002);
        metrics.observe_fetch_latency(0.001);
        metrics.inc_classification(NodeLabel::Schedulable);
        metrics.inc_scoring_error("transport");
        metrics.set_targets_configured(3);

        // A second handle shares the registered collectors
        let again = ScorerMetrics::new();
        again.inc_classification(NodeLabel::NeedsMigration);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("EdgeScoring");
        assert_eq!(logger.plugin, "EdgeScoring");
    }
}
