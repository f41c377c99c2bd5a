//! Forecast-driven node scoring
//!
//! A node is scored for a pod in two stages. The node's forecast alone
//! decides its classification through a weighted utilization signal and two
//! thresholds. Only nodes classified as schedulable get a non-zero score,
//! derived from the forecast plus the pod's own demand.

use std::sync::Arc;
use std::time::Instant;

use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::demand::extract_demand;
use crate::error::{ScoringError, ScoringResult};
use crate::forecast::ForecastSource;
use crate::models::{
    pod_key, NodeLabel, ResourceDemand, ResourceForecast, ScoreResult, MAX_NODE_SCORE,
};
use crate::observability::{ScorerMetrics, StructuredLogger};

/// Name the scorer registers under with the host scheduler
pub const PLUGIN_NAME: &str = "EdgeScoring";

/// Default weight of CPU against memory
pub const DEFAULT_ALPHA: f64 = 0.5;

/// Default signal at which a node stops accepting load
pub const DEFAULT_THETA1: f64 = 0.4;

/// Default signal at which a node should be evacuated
pub const DEFAULT_THETA2: f64 = 0.7;

/// Absorbs float noise so that decimal-exact inputs floor to the decimal result
const SCORE_EPSILON: f64 = 1e-9;

/// Weighting and thresholds of the scoring formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringParameters {
    /// Weight of CPU in [0, 1]; memory gets `1 - alpha`
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Low threshold: at or above it a node is unschedulable
    #[serde(default = "default_theta1")]
    pub theta1: f64,
    /// High threshold: at or above it a node needs migration
    #[serde(default = "default_theta2")]
    pub theta2: f64,
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

fn default_theta1() -> f64 {
    DEFAULT_THETA1
}

fn default_theta2() -> f64 {
    DEFAULT_THETA2
}

impl Default for ScoringParameters {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            theta1: DEFAULT_THETA1,
            theta2: DEFAULT_THETA2,
        }
    }
}

impl ScoringParameters {
    pub fn validate(&self) -> ScoringResult<()> {
        if !(self.alpha.is_finite() && self.theta1.is_finite() && self.theta2.is_finite()) {
            return Err(ScoringError::InvalidParameters(
                "alpha, theta1 and theta2 must be finite".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(ScoringError::InvalidParameters(format!(
                "alpha must be within [0, 1], got {}",
                self.alpha
            )));
        }
        if self.theta1 > self.theta2 {
            return Err(ScoringError::InvalidParameters(format!(
                "theta1 ({}) must not exceed theta2 ({})",
                self.theta1, self.theta2
            )));
        }
        Ok(())
    }

    /// Weighted blend of the forecast's future CPU and memory utilization
    pub fn utilization_signal(&self, forecast: &ResourceForecast) -> f64 {
        self.alpha * forecast.cpu_future + (1.0 - self.alpha) * forecast.mem_future
    }

    /// Classify a node from its utilization signal
    pub fn classify(&self, signal: f64) -> NodeLabel {
        if signal >= self.theta2 {
            NodeLabel::NeedsMigration
        } else if signal >= self.theta1 {
            NodeLabel::Unschedulable
        } else {
            NodeLabel::Schedulable
        }
    }
}

/// Score a node from its forecast and the pod's demand.
///
/// The raw score is clamped into [0, 1], so the final score always lies in
/// [0, MAX_NODE_SCORE].
pub fn evaluate(
    params: &ScoringParameters,
    demand: &ResourceDemand,
    forecast: &ResourceForecast,
) -> ScoreResult {
    let alpha = params.alpha;
    let signal = params.utilization_signal(forecast);
    let label = params.classify(signal);

    let raw = match label {
        NodeLabel::NeedsMigration | NodeLabel::Unschedulable => 0.0,
        NodeLabel::Schedulable => {
            1.0 - alpha * (forecast.cpu_future + demand.cpu_requested)
                - (1.0 - alpha) * (forecast.mem_future + demand.mem_requested)
        }
    };

    if raw > 1.0 {
        warn!(
            raw_score = raw,
            cpu_future = forecast.cpu_future,
            mem_future = forecast.mem_future,
            "Raw score above 1, clamping"
        );
    }
    let raw_score = raw.clamp(0.0, 1.0);
    let final_score = (raw_score * MAX_NODE_SCORE as f64 + SCORE_EPSILON).floor() as i64;

    ScoreResult {
        label,
        signal,
        raw_score,
        final_score: final_score.min(MAX_NODE_SCORE),
    }
}

/// Scores nodes for pods using remote utilization forecasts
///
/// Holds no per-call state, so one engine can serve concurrent calls.
pub struct ScoringEngine {
    params: ScoringParameters,
    source: Arc<dyn ForecastSource>,
    metrics: ScorerMetrics,
    logger: StructuredLogger,
}

impl ScoringEngine {
    pub fn new(params: ScoringParameters, source: Arc<dyn ForecastSource>) -> ScoringResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            source,
            metrics: ScorerMetrics::new(),
            logger: StructuredLogger::new(PLUGIN_NAME),
        })
    }

    /// The forecast source this engine scores against
    pub fn source(&self) -> &Arc<dyn ForecastSource> {
        &self.source
    }

    /// Score `node_name` for `pod`.
    ///
    /// Any failure aborts scoring for this pair; nothing is retried and no
    /// default score is substituted.
    pub async fn score(
        &self,
        pod: &Pod,
        node_name: &str,
        cancel: &CancellationToken,
    ) -> ScoringResult<ScoreResult> {
        let start = Instant::now();
        let pod_name = pod_key(pod);

        let result = self.score_inner(pod, &pod_name, node_name, cancel).await;
        self.metrics
            .observe_score_latency(start.elapsed().as_secs_f64());

        match &result {
            Ok(score) => self.metrics.inc_classification(score.label),
            Err(e) => {
                self.metrics.inc_scoring_error(e.kind());
                self.logger.log_scoring_failure(&pod_name, node_name, e);
            }
        }

        result
    }

    async fn score_inner(
        &self,
        pod: &Pod,
        pod_name: &str,
        node_name: &str,
        cancel: &CancellationToken,
    ) -> ScoringResult<ScoreResult> {
        debug!(
            pod = %pod_name,
            node = %node_name,
            alpha = self.params.alpha,
            theta1 = self.params.theta1,
            theta2 = self.params.theta2,
            "Started edge node scoring"
        );

        let demand = extract_demand(pod)?;

        let fetch_start = Instant::now();
        let forecast = self.source.fetch_forecast(node_name, cancel).await;
        self.metrics
            .observe_fetch_latency(fetch_start.elapsed().as_secs_f64());
        let forecast = forecast?;

        let result = evaluate(&self.params, &demand, &forecast);
        self.logger
            .log_node_scored(pod_name, node_name, &demand, &forecast, &result);

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::StaticForecastSource;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn forecast(cpu_future: f64, mem_future: f64) -> ResourceForecast {
        ResourceForecast {
            cpu_current: 0.0,
            cpu_future,
            mem_current: 0.0,
            mem_future,
        }
    }

    fn demand(cpu: f64, mem: f64) -> ResourceDemand {
        ResourceDemand {
            cpu_requested: cpu,
            mem_requested: mem,
        }
    }

    fn pod(cpu: &str, mem: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some("web-0".to_string()),
                namespace: Some("edge".to_string()),
                labels: Some(
                    [
                        ("cpu-request".to_string(), cpu.to_string()),
                        ("mem-request".to_string(), mem.to_string()),
                    ]
                    .into_iter()
                    .collect(),
                ),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn engine(source: StaticForecastSource) -> ScoringEngine {
        ScoringEngine::new(ScoringParameters::default(), Arc::new(source)).unwrap()
    }

    #[test]
    fn test_schedulable_worked_example() {
        let params = ScoringParameters::default();
        let result = evaluate(&params, &demand(0.1, 0.1), &forecast(0.2, 0.3));

        assert_eq!(result.label, NodeLabel::Schedulable);
        assert!((result.signal - 0.25).abs() < 1e-12);
        assert!((result.raw_score - 0.65).abs() < 1e-12);
        assert_eq!(result.final_score, 65);
    }

    #[test]
    fn test_needs_migration_ignores_demand() {
        let params = ScoringParameters::default();
        for d in [demand(0.0, 0.0), demand(0.5, 0.5), demand(3.0, 0.0)] {
            let result = evaluate(&params, &d, &forecast(0.8, 0.8));
            assert_eq!(result.label, NodeLabel::NeedsMigration);
            assert_eq!(result.final_score, 0);
        }
    }

    #[test]
    fn test_unschedulable_between_thresholds() {
        let params = ScoringParameters::default();
        let result = evaluate(&params, &demand(0.0, 0.0), &forecast(0.5, 0.5));

        assert_eq!(result.label, NodeLabel::Unschedulable);
        assert_eq!(result.raw_score, 0.0);
        assert_eq!(result.final_score, 0);
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let params = ScoringParameters {
            alpha: 1.0,
            theta1: 0.4,
            theta2: 0.7,
        };
        assert_eq!(
            evaluate(&params, &demand(0.0, 0.0), &forecast(0.4, 0.0)).label,
            NodeLabel::Unschedulable
        );
        assert_eq!(
            evaluate(&params, &demand(0.0, 0.0), &forecast(0.7, 0.0)).label,
            NodeLabel::NeedsMigration
        );
    }

    #[test]
    fn test_large_demand_clamps_to_zero() {
        let params = ScoringParameters::default();
        let result = evaluate(&params, &demand(2.0, 2.0), &forecast(0.1, 0.1));

        assert_eq!(result.label, NodeLabel::Schedulable);
        assert_eq!(result.raw_score, 0.0);
        assert_eq!(result.final_score, 0);
    }

    #[test]
    fn test_negative_forecast_clamps_to_max() {
        let params = ScoringParameters::default();
        let result = evaluate(&params, &demand(0.0, 0.0), &forecast(-0.5, -0.5));

        assert_eq!(result.label, NodeLabel::Schedulable);
        assert_eq!(result.raw_score, 1.0);
        assert_eq!(result.final_score, MAX_NODE_SCORE);
    }

    #[test]
    fn test_final_score_always_in_range() {
        let params = ScoringParameters::default();
        let steps = [0.0, 0.05, 0.1, 0.2, 0.33, 0.39, 0.4, 0.55, 0.7, 0.9, 1.0, 1.5];

        for &cpu_f in &steps {
            for &mem_f in &steps {
                for &req in &steps {
                    let result = evaluate(&params, &demand(req, req), &forecast(cpu_f, mem_f));
                    assert!(
                        (0..=MAX_NODE_SCORE).contains(&result.final_score),
                        "score {} out of range",
                        result.final_score
                    );

                    if result.label == NodeLabel::Schedulable {
                        let expected = 1.0 - 0.5 * (cpu_f + req) - 0.5 * (mem_f + req);
                        let expected = (expected.clamp(0.0, 1.0) * 100.0).floor() as i64;
                        assert!((result.final_score - expected).abs() <= 1);
                    } else {
                        assert_eq!(result.final_score, 0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_alpha_weights_cpu() {
        let cpu_only = ScoringParameters {
            alpha: 1.0,
            ..Default::default()
        };
        // Memory is ignored entirely when alpha is 1
        let result = evaluate(&cpu_only, &demand(0.1, 5.0), &forecast(0.2, 0.9));

        assert_eq!(result.label, NodeLabel::Schedulable);
        assert_eq!(result.final_score, 70);
    }

    #[test]
    fn test_parameter_validation() {
        assert!(ScoringParameters::default().validate().is_ok());

        let bad_alpha = ScoringParameters {
            alpha: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            bad_alpha.validate(),
            Err(ScoringError::InvalidParameters(_))
        ));

        let inverted = ScoringParameters {
            alpha: 0.5,
            theta1: 0.8,
            theta2: 0.7,
        };
        assert!(matches!(
            inverted.validate(),
            Err(ScoringError::InvalidParameters(_))
        ));

        let nan = ScoringParameters {
            alpha: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_engine_rejects_invalid_parameters() {
        let params = ScoringParameters {
            alpha: -0.1,
            ..Default::default()
        };
        let result = ScoringEngine::new(params, Arc::new(StaticForecastSource::new()));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_engine_scores_pod() {
        let engine = engine(StaticForecastSource::new().with_forecast("edge-1", forecast(0.2, 0.3)));

        let result = engine
            .score(&pod("0.1", "0.1"), "edge-1", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.label, NodeLabel::Schedulable);
        assert_eq!(result.final_score, 65);
    }

    #[tokio::test]
    async fn test_engine_propagates_demand_error() {
        let engine = engine(StaticForecastSource::new().with_forecast("edge-1", forecast(0.2, 0.3)));

        let result = engine
            .score(&pod("0.1", "a lot"), "edge-1", &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(ScoringError::InvalidNumericValue { .. })
        ));
    }

    #[tokio::test]
    async fn test_engine_propagates_unknown_node() {
        let engine = engine(StaticForecastSource::new());

        let result = engine
            .score(&pod("0.1", "0.1"), "edge-9", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(ScoringError::UnknownNode(_))));
    }

    #[tokio::test]
    async fn test_engine_checks_demand_before_forecast() {
        // Both inputs are bad; the demand error wins
        let engine = engine(StaticForecastSource::new());
        let bare_pod = Pod::default();

        let result = engine
            .score(&bare_pod, "edge-9", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(ScoringError::MissingLabel(_))));
    }

    #[tokio::test]
    async fn test_engine_concurrent_calls() {
        let engine = Arc::new(engine(
            StaticForecastSource::new()
                .with_forecast("edge-1", forecast(0.2, 0.3))
                .with_forecast("edge-2", forecast(0.8, 0.8))
                .with_forecast("edge-3", forecast(0.5, 0.4)),
        ));
        let pod = Arc::new(pod("0.1", "0.1"));

        let mut handles = Vec::new();
        for node in ["edge-1", "edge-2", "edge-3"] {
            let engine = engine.clone();
            let pod = pod.clone();
            handles.push(tokio::spawn(async move {
                engine
                    .score(&pod, node, &CancellationToken::new())
                    .await
                    .map(|r| (node, r.label, r.final_score))
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(results[0], ("edge-1", NodeLabel::Schedulable, 65));
        assert_eq!(results[1], ("edge-2", NodeLabel::NeedsMigration, 0));
        assert_eq!(results[2], ("edge-3", NodeLabel::Unschedulable, 0));
    }
}
