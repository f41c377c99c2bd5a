//! Cross-node score normalization
//!
//! Runs once per pod after every candidate node has been scored. The
//! default strategy returns scores untouched; other strategies can be
//! swapped in without changing per-node scoring.

use std::sync::Arc;

use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{pod_key, NodeScore, MAX_NODE_SCORE, MIN_NODE_SCORE};

/// Trait for cross-node normalization strategies
pub trait ScoreNormalizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Normalize the scores of all nodes for one pod. Must keep the
    /// node order and cannot fail.
    fn normalize(&self, pod: &Pod, scores: Vec<NodeScore>) -> Vec<NodeScore>;
}

/// Returns every score unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNormalizer;

impl ScoreNormalizer for IdentityNormalizer {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn normalize(&self, pod: &Pod, scores: Vec<NodeScore>) -> Vec<NodeScore> {
        debug!(pod = %pod_key(pod), nodes = scores.len(), "Normalizing scores");
        scores
    }
}

/// Rescales scores so the best node gets the maximum and the worst the minimum
#[derive(Debug, Clone, Copy, Default)]
pub struct MinMaxNormalizer;

impl ScoreNormalizer for MinMaxNormalizer {
    fn name(&self) -> &'static str {
        "min_max"
    }

    fn normalize(&self, pod: &Pod, mut scores: Vec<NodeScore>) -> Vec<NodeScore> {
        // Out-of-range input is pulled into bounds so the rescale cannot overflow
        for entry in scores.iter_mut() {
            entry.score = entry.score.clamp(MIN_NODE_SCORE, MAX_NODE_SCORE);
        }

        let min = scores.iter().map(|s| s.score).min();
        let max = scores.iter().map(|s| s.score).max();

        let (min, max) = match (min, max) {
            (Some(min), Some(max)) if max > min => (min, max),
            // Empty or flat: nothing to spread
            _ => return scores,
        };

        let range = max - min;
        let span = MAX_NODE_SCORE - MIN_NODE_SCORE;
        for entry in scores.iter_mut() {
            entry.score = MIN_NODE_SCORE + (entry.score - min) * span / range;
        }

        debug!(
            pod = %pod_key(pod),
            nodes = scores.len(),
            min = min,
            max = max,
            "Rescaled scores"
        );
        scores
    }
}

/// Normalization strategy selected in configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizerKind {
    #[default]
    Identity,
    MinMax,
}

impl NormalizerKind {
    pub fn build(self) -> Arc<dyn ScoreNormalizer> {
        match self {
            NormalizerKind::Identity => Arc::new(IdentityNormalizer),
            NormalizerKind::MinMax => Arc::new(MinMaxNormalizer),
        }
    }
}
