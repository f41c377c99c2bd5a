//! HTTP API for node scoring, health checks and Prometheus metrics
//!
//! The scoring routes follow the host scheduler's two-phase protocol:
//! `score` rates one node for a pod, `normalize` adjusts the scores of all
//! nodes for that pod. `prioritize` runs both phases for a node list.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use scorer_lib::{
    CancellationToken, ForecastSource, HealthRegistry, NodeLabel,
    NodeScore, NodeTarget, Pod, ResourceForecast, ScoreNormalizer, ScoreResult, ScoringEngine,
    ScoringError, ScoringResult,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ScoringEngine>,
    pub normalizer: Arc<dyn ScoreNormalizer>,
    pub targets: Arc<Vec<NodeTarget>>,
    pub health_registry: HealthRegistry,
    /// Cancelled on shutdown; every request scores under a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        engine: Arc<ScoringEngine>,
        normalizer: Arc<dyn ScoreNormalizer>,
        targets: Vec<NodeTarget>,
        health_registry: HealthRegistry,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            engine,
            normalizer,
            targets: Arc::new(targets),
            health_registry,
            shutdown,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub pod: Pod,
    pub node_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub node_name: String,
    pub score: i64,
    pub label: NodeLabel,
    pub signal: f64,
    pub raw_score: f64,
}

impl ScoreResponse {
    fn new(node_name: String, result: ScoreResult) -> Self {
        Self {
            node_name,
            score: result.final_score,
            label: result.label,
            signal: result.signal,
            raw_score: result.raw_score,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NormalizeRequest {
    pub pod: Pod,
    pub scores: Vec<NodeScore>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NormalizeResponse {
    pub scores: Vec<NodeScore>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizeRequest {
    pub pod: Pod,
    pub node_names: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PrioritizeResponse {
    pub scores: Vec<NodeScore>,
    pub errors: Vec<NodeError>,
}

/// A node that could not be scored this cycle
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeError {
    pub node_name: String,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TargetList {
    pub targets: Vec<NodeTarget>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    pub node_name: String,
    pub forecast: ResourceForecast,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Scoring failure rendered as an HTTP error
pub struct ApiError(ScoringError);

impl From<ScoringError> for ApiError {
    fn from(err: ScoringError) -> Self {
        Self(err)
    }
}

/// HTTP status for a scoring failure
pub fn status_for(err: &ScoringError) -> StatusCode {
    match err {
        ScoringError::MissingLabel(_) | ScoringError::InvalidNumericValue { .. } => {
            StatusCode::BAD_REQUEST
        }
        ScoringError::UnknownNode(_) => StatusCode::NOT_FOUND,
        ScoringError::Transport { .. } | ScoringError::MalformedResponse { .. } => {
            StatusCode::BAD_GATEWAY
        }
        ScoringError::Cancelled(_) => StatusCode::SERVICE_UNAVAILABLE,
        ScoringError::InvalidParameters(_)
        | ScoringError::InvalidTarget { .. }
        | ScoringError::HttpClient(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.0.to_string(),
            code: self.0.kind().to_string(),
        };
        (status_for(&self.0), Json(body)).into_response()
    }
}

/// Health check response - always 200 while the process serves; the body
/// reports degraded forecast sources
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;
    (StatusCode::OK, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Score one node for a pod
async fn score(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let cancel = state.shutdown.child_token();
    let result = state.engine.score(&req.pod, &req.node_name, &cancel).await;
    state.health_registry.record_forecast_outcome(&result).await;

    Ok(Json(ScoreResponse::new(req.node_name, result?)))
}

/// Normalize the scores of all nodes for a pod
async fn normalize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NormalizeRequest>,
) -> Json<NormalizeResponse> {
    let scores = state.normalizer.normalize(&req.pod, req.scores);
    Json(NormalizeResponse { scores })
}

/// Score every listed node concurrently, then normalize the scored ones
async fn prioritize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PrioritizeRequest>,
) -> Json<PrioritizeResponse> {
    let pod = Arc::new(req.pod);
    let cancel = state.shutdown.child_token();
    let node_count = req.node_names.len();

    let mut tasks = JoinSet::new();
    for (index, node_name) in req.node_names.iter().cloned().enumerate() {
        let engine = state.engine.clone();
        let pod = pod.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let result = engine.score(&pod, &node_name, &cancel).await;
            (index, result)
        });
    }

    let mut outcomes: Vec<Option<ScoringResult<ScoreResult>>> =
        (0..node_count).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => {
                state.health_registry.record_forecast_outcome(&result).await;
                outcomes[index] = Some(result);
            }
            Err(e) => warn!(error = %e, "Scoring task failed"),
        }
    }

    let mut scores = Vec::with_capacity(node_count);
    let mut errors = Vec::new();
    for (node_name, outcome) in req.node_names.into_iter().zip(outcomes) {
        match outcome {
            Some(Ok(result)) => scores.push(NodeScore::new(node_name, result.final_score)),
            Some(Err(e)) => errors.push(NodeError {
                node_name,
                error: e.to_string(),
                code: e.kind().to_string(),
            }),
            None => errors.push(NodeError {
                node_name,
                error: "scoring task did not complete".to_string(),
                code: "internal".to_string(),
            }),
        }
    }

    let scores = state.normalizer.normalize(&pod, scores);
    Json(PrioritizeResponse { scores, errors })
}

/// List configured forecast targets
async fn targets(State(state): State<Arc<AppState>>) -> Json<TargetList> {
    Json(TargetList {
        targets: state.targets.as_ref().clone(),
    })
}

/// Fetch a node's current forecast
async fn forecast(
    State(state): State<Arc<AppState>>,
    Path(node_name): Path<String>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let cancel = state.shutdown.child_token();
    let result = state
        .engine
        .source()
        .fetch_forecast(&node_name, &cancel)
        .await;
    state.health_registry.record_forecast_outcome(&result).await;

    Ok(Json(ForecastResponse {
        node_name,
        forecast: result?,
    }))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/score", post(score))
        .route("/api/v1/normalize", post(normalize))
        .route("/api/v1/prioritize", post(prioritize))
        .route("/api/v1/targets", get(targets))
        .route("/api/v1/forecasts/:node", get(forecast))
        .with_state(state)
}

/// Start the API server; returns once `shutdown` is cancelled
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}
