//! Game kubehub: cluster connection and the Deployment-backed workload client.

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use game_core::{ClusterError, CreateStatus, DeleteStatus, DesiredWorkload, Game, ObservedWorkload, WorkloadClient};
use k8s_openapi::api::apps::v1::Deployment;
use kube::{
    api::{Api, DeleteParams, PostParams},
    config::{Config, KubeConfigOptions},
    Client,
};
use tracing::{debug, info};

mod status;

pub use status::{failed_status, patch_status, provisioned_status, status_patch};

/// Connect to the API server, preferring in-cluster credentials and falling
/// back to the local kubeconfig.
pub async fn connect() -> Result<Client> {
    let config = match Config::incluster() {
        Ok(cfg) => {
            info!("using in-cluster configuration");
            cfg
        }
        Err(e) => {
            debug!(error = %e, "in-cluster configuration unavailable");
            let cfg = Config::from_kubeconfig(&KubeConfigOptions::default())
                .await
                .context("loading local kubeconfig")?;
            info!(cluster_url = %cfg.cluster_url, "using local kubeconfig configuration");
            cfg
        }
    };
    Client::try_from(config).context("building kube client")
}

/// Games API scoped to one namespace, or all namespaces when `None`.
pub fn games_api(client: Client, namespace: Option<&str>) -> Api<Game> {
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}

/// Classify a kube error. Conflicts are handled by callers before this.
pub fn map_kube_error(e: kube::Error) -> ClusterError {
    match e {
        kube::Error::Api(resp) => ClusterError::Api { code: resp.code, reason: resp.reason, message: resp.message },
        other => ClusterError::Transport(other.to_string()),
    }
}

fn has_status(e: &kube::Error, code: u16) -> bool {
    matches!(e, kube::Error::Api(resp) if resp.code == code)
}

/// A 409 also covers update conflicts; only this reason means the name is taken.
fn is_already_exists(e: &kube::Error) -> bool {
    matches!(e, kube::Error::Api(resp) if resp.code == 409 && resp.reason == "AlreadyExists")
}

fn observed(d: Deployment) -> ObservedWorkload {
    ObservedWorkload {
        name: d.metadata.name.unwrap_or_default(),
        namespace: d.metadata.namespace.unwrap_or_default(),
        replicas: d.spec.and_then(|s| s.replicas),
        annotations: d.metadata.annotations.unwrap_or_default(),
    }
}

/// [`WorkloadClient`] backed by `apps/v1` Deployments.
#[derive(Clone)]
pub struct KubeWorkloads {
    client: Client,
}

impl KubeWorkloads {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait::async_trait]
impl WorkloadClient for KubeWorkloads {
    async fn create(&self, workload: &DesiredWorkload) -> Result<CreateStatus, ClusterError> {
        let deployment = game_manifest::to_deployment(workload);
        match self.api(&workload.namespace).create(&PostParams::default(), &deployment).await {
            Ok(_) => Ok(CreateStatus::Created),
            Err(e) if is_already_exists(&e) => Ok(CreateStatus::AlreadyExists),
            Err(e) => Err(map_kube_error(e)),
        }
    }

    async fn get(&self, name: &str, namespace: &str) -> Result<Option<ObservedWorkload>, ClusterError> {
        let found = self.api(namespace).get_opt(name).await.map_err(map_kube_error)?;
        Ok(found.map(observed))
    }

    async fn delete(&self, name: &str, namespace: &str) -> Result<DeleteStatus, ClusterError> {
        match self.api(namespace).delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(DeleteStatus::Deleted),
            Err(e) if has_status(&e, 404) => Ok(DeleteStatus::NotFound),
            Err(e) => Err(map_kube_error(e)),
        }
    }
}
