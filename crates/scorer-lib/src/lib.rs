//! Edge node scoring library
//!
//! This crate provides the core functionality for:
//! - Extracting resource demand from pod labels
//! - Fetching per-node utilization forecasts
//! - Scoring and classifying nodes from their forecasts
//! - Cross-node score normalization
//! - Health checks and observability

pub mod demand;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod health;
pub mod models;
pub mod normalize;
pub mod observability;

pub use demand::{extract_demand, CPU_REQUEST_LABEL, MEM_REQUEST_LABEL};
pub use engine::{evaluate, ScoringEngine, ScoringParameters, PLUGIN_NAME};
pub use error::{ScoringError, ScoringResult};
pub use forecast::{ForecastClient, ForecastClientConfig, ForecastSource, StaticForecastSource};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use normalize::{IdentityNormalizer, MinMaxNormalizer, NormalizerKind, ScoreNormalizer};
pub use observability::{ScorerMetrics, StructuredLogger};

pub use k8s_openapi::api::core::v1::Pod;
pub use tokio_util::sync::CancellationToken;
