//! Pod resource demand extraction
//!
//! Pods declare what they need through two labels holding utilization
//! fractions. Both are required on every scoring call.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod;

use crate::error::{ScoringError, ScoringResult};
use crate::models::ResourceDemand;

/// Label holding the requested CPU fraction
pub const CPU_REQUEST_LABEL: &str = "cpu-request";

/// Label holding the requested memory fraction
pub const MEM_REQUEST_LABEL: &str = "mem-request";

/// Read the resource demand declared on a pod
pub fn extract_demand(pod: &Pod) -> ScoringResult<ResourceDemand> {
    match pod.metadata.labels.as_ref() {
        Some(labels) => demand_from_labels(labels),
        None => Err(ScoringError::MissingLabel(CPU_REQUEST_LABEL.to_string())),
    }
}

/// Read the resource demand from a raw label map
pub fn demand_from_labels(labels: &BTreeMap<String, String>) -> ScoringResult<ResourceDemand> {
    let cpu_requested = parse_label(labels, CPU_REQUEST_LABEL)?;
    let mem_requested = parse_label(labels, MEM_REQUEST_LABEL)?;

    Ok(ResourceDemand {
        cpu_requested,
        mem_requested,
    })
}

fn parse_label(labels: &BTreeMap<String, String>, name: &str) -> ScoringResult<f64> {
    let raw = labels
        .get(name)
        .ok_or_else(|| ScoringError::MissingLabel(name.to_string()))?;

    let invalid = || ScoringError::InvalidNumericValue {
        label: name.to_string(),
        value: raw.clone(),
    };

    let value: f64 = raw.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }

    Ok(value)
}
