//! Scorer configuration

use anyhow::{bail, Context, Result};
use scorer_lib::{ForecastClientConfig, NodeTarget, NormalizerKind, ScoringParameters};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "EDGE_SCORER_CONFIG";

/// Prefix of environment overrides, e.g. `EDGE_SCORER__SCORING__ALPHA`
const ENV_PREFIX: &str = "EDGE_SCORER";

/// Scorer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScorerConfig {
    /// API server port for scoring, health and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Upper bound on one metrics request, in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Upper bound on connecting to a metrics endpoint, in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Cross-node normalization strategy
    #[serde(default)]
    pub normalizer: NormalizerKind,

    /// Weighting and thresholds of the scoring formula
    #[serde(default)]
    pub scoring: ScoringParameters,

    /// Metrics endpoint of each schedulable node
    #[serde(default)]
    pub targets: Vec<NodeTarget>,
}

fn default_api_port() -> u16 {
    8080
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_connect_timeout_ms() -> u64 {
    2000
}

impl ScorerConfig {
    /// Load configuration from the file named by `EDGE_SCORER_CONFIG`, if
    /// set, and the environment
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::load_from(path.as_deref())
    }

    /// Load configuration from an optional file, then environment overrides
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read scorer configuration")?;

        let config: ScorerConfig = config
            .try_deserialize()
            .context("Failed to parse scorer configuration")?;
        config.validate()?;

        Ok(config)
    }

    /// Reject configurations the scorer cannot run with
    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;

        if self.request_timeout_ms == 0 {
            bail!("request_timeout_ms must be greater than zero");
        }
        if self.connect_timeout_ms == 0 {
            bail!("connect_timeout_ms must be greater than zero");
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if target.node_name.is_empty() {
                bail!("target with ip {} has an empty nodeName", target.ip);
            }
            if target.ip.is_empty() || target.port.is_empty() {
                bail!("target {} must have both ip and port", target.node_name);
            }
            if !seen.insert(target.node_name.as_str()) {
                bail!("duplicate target for node {}", target.node_name);
            }
        }

        Ok(())
    }

    pub fn forecast_client_config(&self) -> ForecastClientConfig {
        ForecastClientConfig {
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
        }
    }
}
