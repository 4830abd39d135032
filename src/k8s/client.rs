use crate::{Error, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use std::path::Path;
use tracing::{debug, info};

/// Handle to the cluster control plane.
///
/// Construction failures are final: the caller is expected to abort startup
/// and let the process supervisor restart it.
#[derive(Clone)]
pub struct K8sClient {
    client: Client,
}

impl K8sClient {
    /// Build a client from the service account credentials mounted in the pod.
    pub fn in_cluster() -> Result<Self> {
        debug!("Loading in-cluster Kubernetes configuration");

        let config = Config::incluster().map_err(|e| Error::Bootstrap(e.to_string()))?;
        Self::from_config(config)
    }

    /// Build a client from an explicit kubeconfig file, for running outside the cluster.
    pub async fn from_kubeconfig(path: &Path) -> Result<Self> {
        debug!("Loading kubeconfig from {}", path.display());

        let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
            Error::Bootstrap(format!(
                "failed to read kubeconfig {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| {
                Error::Bootstrap(format!(
                    "failed to load kubeconfig {}: {}",
                    path.display(),
                    e
                ))
            })?;

        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self> {
        let client = Client::try_from(config)
            .map_err(|e| Error::Bootstrap(format!("failed to create K8s client: {}", e)))?;

        info!("Kubernetes client ready");

        Ok(Self { client })
    }

    pub fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}
