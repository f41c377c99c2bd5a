//! Kubernetes access for the CLI

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::api::Api;
use kube::config::{KubeConfigOptions, Kubeconfig};

/// Namespace used when a pod reference has none
pub const DEFAULT_NAMESPACE: &str = "default";

/// Build a Kubernetes client from an explicit kubeconfig or the default chain
pub async fn kube_client(kubeconfig: Option<&str>) -> Result<kube::Client> {
    let config = match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to read kubeconfig {}", path))?;
            kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .context("Invalid kubeconfig")?
        }
        None => kube::Config::infer()
            .await
            .context("Could not determine Kubernetes configuration")?,
    };

    kube::Client::try_from(config).context("Failed to create Kubernetes client")
}

/// Split `namespace/name` into its parts, defaulting the namespace
pub fn parse_pod_ref(pod_ref: &str) -> (&str, &str) {
    match pod_ref.split_once('/') {
        Some((namespace, name)) => (namespace, name),
        None => (DEFAULT_NAMESPACE, pod_ref),
    }
}

/// Read a pod from the cluster
pub async fn fetch_pod(kubeconfig: Option<&str>, pod_ref: &str) -> Result<Pod> {
    let (namespace, name) = parse_pod_ref(pod_ref);
    let client = kube_client(kubeconfig).await?;
    let pods: Api<Pod> = Api::namespaced(client, namespace);

    pods.get(name)
        .await
        .with_context(|| format!("Failed to read pod {}/{}", namespace, name))
}
