//! Node utilization forecasts
//!
//! This module provides:
//! - The `ForecastSource` capability used by the scoring engine
//! - An HTTP client that queries each node's metrics endpoint
//! - A static in-memory source for dry runs and tests

mod client;

#[cfg(test)]
mod tests;

pub use client::{
    ForecastClient, ForecastClientConfig, MetricsResponse, MetricsResponseItem,
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT,
};

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

use crate::error::{ScoringError, ScoringResult};
use crate::models::ResourceForecast;

pub use async_trait::async_trait;

/// Trait for anything that can report a node's utilization forecast
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Fetch a fresh forecast for the node. Implementations must not cache.
    async fn fetch_forecast(
        &self,
        node_name: &str,
        cancel: &CancellationToken,
    ) -> ScoringResult<ResourceForecast>;
}

/// Forecast source answering from a fixed table
#[derive(Debug, Clone, Default)]
pub struct StaticForecastSource {
    forecasts: HashMap<String, ResourceForecast>,
}

impl StaticForecastSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forecast(mut self, node_name: impl Into<String>, forecast: ResourceForecast) -> Self {
        self.forecasts.insert(node_name.into(), forecast);
        self
    }
}

#[async_trait]
impl ForecastSource for StaticForecastSource {
    async fn fetch_forecast(
        &self,
        node_name: &str,
        cancel: &CancellationToken,
    ) -> ScoringResult<ResourceForecast> {
        let forecast = self
            .forecasts
            .get(node_name)
            .copied()
            .ok_or_else(|| ScoringError::UnknownNode(node_name.to_string()))?;

        if cancel.is_cancelled() {
            return Err(ScoringError::Cancelled(node_name.to_string()));
        }

        Ok(forecast)
    }
}
