//! HTTP client for node metrics endpoints
//!
//! Each edge node runs an agent answering `GET /metrics` with its current
//! and predicted utilization. The client:
//! - Resolves node names through a target table built once at startup
//! - Issues exactly one request per call, with no retry and no caching
//! - Bounds every request with a timeout and honors caller cancellation

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use super::{async_trait, ForecastSource};
use crate::error::{ScoringError, ScoringResult};
use crate::models::{NodeTarget, ResourceForecast};

/// Default upper bound on one metrics request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default upper bound on establishing the connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for the forecast client
#[derive(Debug, Clone)]
pub struct ForecastClientConfig {
    /// Total time allowed for one request, body included
    pub request_timeout: Duration,
    /// Time allowed for the TCP connect
    pub connect_timeout: Duration,
}

impl Default for ForecastClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Body returned by a node's metrics endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub cpu: MetricsResponseItem,
    pub mem: MetricsResponseItem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsResponseItem {
    pub current: f64,
    pub future: f64,
}

impl From<MetricsResponse> for ResourceForecast {
    fn from(resp: MetricsResponse) -> Self {
        Self {
            cpu_current: resp.cpu.current,
            cpu_future: resp.cpu.future,
            mem_current: resp.mem.current,
            mem_future: resp.mem.future,
        }
    }
}

/// Forecast source backed by the nodes' metrics endpoints
pub struct ForecastClient {
    client: Client,
    endpoints: HashMap<String, Url>,
}

impl ForecastClient {
    /// Build the client and its node-to-endpoint table.
    ///
    /// A later target with the same node name replaces an earlier one.
    pub fn new(targets: &[NodeTarget], config: ForecastClientConfig) -> ScoringResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ScoringError::HttpClient(e.to_string()))?;

        let mut endpoints = HashMap::with_capacity(targets.len());
        for target in targets {
            let url = Url::parse(&target.metrics_url()).map_err(|e| ScoringError::InvalidTarget {
                node: target.node_name.clone(),
                message: e.to_string(),
            })?;
            endpoints.insert(target.node_name.clone(), url);
        }

        info!(
            targets = endpoints.len(),
            request_timeout_ms = config.request_timeout.as_millis() as u64,
            connect_timeout_ms = config.connect_timeout.as_millis() as u64,
            "Forecast client configured"
        );

        Ok(Self { client, endpoints })
    }

    /// Build a client with default timeouts
    pub fn with_defaults(targets: &[NodeTarget]) -> ScoringResult<Self> {
        Self::new(targets, ForecastClientConfig::default())
    }

    /// Number of configured targets
    pub fn target_count(&self) -> usize {
        self.endpoints.len()
    }

    async fn request(&self, node_name: &str, url: &Url) -> ScoringResult<ResourceForecast> {
        debug!(node = %node_name, url = %url, "Fetching node forecast");
        let start = Instant::now();

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(node_name, e, start))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScoringError::Transport {
                node: node_name.to_string(),
                message: format!("metrics endpoint returned {}: {}", status, body),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(node_name, e, start))?;

        let decoded: MetricsResponse =
            serde_json::from_slice(&body).map_err(|e| ScoringError::MalformedResponse {
                node: node_name.to_string(),
                message: e.to_string(),
            })?;

        Ok(decoded.into())
    }
}

/// Either timeout may have fired, so report the time actually spent
fn transport_error(node_name: &str, err: reqwest::Error, start: Instant) -> ScoringError {
    let message = if err.is_timeout() {
        format!("request timed out after {} ms", start.elapsed().as_millis())
    } else {
        err.to_string()
    };
    ScoringError::Transport {
        node: node_name.to_string(),
        message,
    }
}

#[async_trait]
impl ForecastSource for ForecastClient {
    async fn fetch_forecast(
        &self,
        node_name: &str,
        cancel: &CancellationToken,
    ) -> ScoringResult<ResourceForecast> {
        let url = self
            .endpoints
            .get(node_name)
            .ok_or_else(|| ScoringError::UnknownNode(node_name.to_string()))?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ScoringError::Cancelled(node_name.to_string())),
            result = self.request(node_name, url) => result,
        }
    }
}
