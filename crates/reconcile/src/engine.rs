use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use game_core::{
    ClusterError, Conflict, CreateStatus, DeleteStatus, Effect, InstanceRef, LifecycleEvent, Outcome,
    ResourceInstance, WorkloadClient,
};
use game_manifest::ManifestBuilder;
use metrics::{counter, histogram};
use tracing::{debug, error, info, warn};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Drives the cluster toward the state each Game declares.
///
/// Holds no per-instance state; the cluster is the only record.
#[derive(Clone)]
pub struct Engine {
    client: Arc<dyn WorkloadClient>,
    manifests: ManifestBuilder,
    call_timeout: Duration,
}

impl Engine {
    pub fn new(client: Arc<dyn WorkloadClient>, manifests: ManifestBuilder) -> Self {
        Self { client, manifests, call_timeout: DEFAULT_CALL_TIMEOUT }
    }

    /// Bound applied to every cluster call; an elapsed bound is a [`ClusterError::Timeout`].
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn manifests(&self) -> &ManifestBuilder {
        &self.manifests
    }

    /// Dispatch one lifecycle event to its handler.
    pub async fn handle(&self, event: &LifecycleEvent) -> Outcome {
        let outcome = match event {
            LifecycleEvent::Created(inst) => self.on_created(inst).await,
            LifecycleEvent::Deleted(r) => self.on_deleted(r).await,
            LifecycleEvent::Resumed(inst) | LifecycleEvent::TimerTick(inst) => self.ensure_converged(inst).await,
        };
        let r = event.instance_ref();
        debug!(name = %r.name, namespace = %r.namespace, event = event.kind(), outcome = outcome.label(), "event handled");
        counter!("game_reconcile_total", 1u64, "event" => event.kind(), "outcome" => outcome.label());
        outcome
    }

    /// Provision the workload for a newly declared instance.
    ///
    /// Any failure other than "already exists" is terminal.
    pub async fn on_created(&self, inst: &ResourceInstance) -> Outcome {
        info!(name = %inst.name, namespace = %inst.namespace, "creating deployment for game");
        let desired = self.manifests.build(&inst.name, &inst.namespace);
        match self.bounded("create", self.client.create(&desired)).await {
            Ok(CreateStatus::Created) => {
                info!(name = %inst.name, namespace = %inst.namespace, "deployment created");
                Outcome::Ok(Effect::Created)
            }
            Ok(CreateStatus::AlreadyExists) => {
                info!(name = %inst.name, namespace = %inst.namespace, "deployment already exists");
                Outcome::Conflict(Conflict::AlreadyExists)
            }
            Err(e) => {
                error!(name = %inst.name, namespace = %inst.namespace, error = %e, "failed to create deployment");
                Outcome::Terminal(e)
            }
        }
    }

    /// Tear down the workload of a deleted instance. Never terminal.
    pub async fn on_deleted(&self, r: &InstanceRef) -> Outcome {
        info!(name = %r.name, namespace = %r.namespace, "deleting deployment for game");
        match self.bounded("delete", self.client.delete(&r.name, &r.namespace)).await {
            Ok(DeleteStatus::Deleted) => {
                info!(name = %r.name, namespace = %r.namespace, "deployment deleted");
                Outcome::Ok(Effect::Deleted)
            }
            Ok(DeleteStatus::NotFound) => {
                debug!(name = %r.name, namespace = %r.namespace, "deployment already gone");
                Outcome::Conflict(Conflict::AlreadyAbsent)
            }
            Err(e) => {
                error!(name = %r.name, namespace = %r.namespace, error = %e, "failed to delete deployment");
                Outcome::Transient(e)
            }
        }
    }

    /// Self-heal: recreate the workload if it is missing, otherwise do nothing.
    /// Invoked on resume and on every timer tick.
    pub async fn ensure_converged(&self, inst: &ResourceInstance) -> Outcome {
        match self.bounded("get", self.client.get(&inst.name, &inst.namespace)).await {
            Ok(Some(_)) => {
                debug!(name = %inst.name, namespace = %inst.namespace, "deployment exists");
                Outcome::Ok(Effect::Unchanged)
            }
            Ok(None) => {
                info!(name = %inst.name, namespace = %inst.namespace, "deployment not found, recreating");
                let desired = self.manifests.build(&inst.name, &inst.namespace);
                match self.bounded("create", self.client.create(&desired)).await {
                    Ok(CreateStatus::Created) => {
                        info!(name = %inst.name, namespace = %inst.namespace, "deployment recreated");
                        Outcome::Ok(Effect::Created)
                    }
                    // Appeared between the check and the create.
                    Ok(CreateStatus::AlreadyExists) => Outcome::Conflict(Conflict::AlreadyExists),
                    Err(e) => {
                        warn!(name = %inst.name, namespace = %inst.namespace, error = %e, "failed to recreate deployment");
                        Outcome::Transient(e)
                    }
                }
            }
            Err(e) => {
                warn!(name = %inst.name, namespace = %inst.namespace, error = %e, "error checking deployment");
                Outcome::Transient(e)
            }
        }
    }

    async fn bounded<T, F>(&self, op: &'static str, call: F) -> Result<T, ClusterError>
    where
        F: Future<Output = Result<T, ClusterError>>,
    {
        let t0 = Instant::now();
        let res = match tokio::time::timeout(self.call_timeout, call).await {
            Ok(r) => r,
            Err(_) => Err(ClusterError::Timeout(self.call_timeout)),
        };
        histogram!("game_cluster_call_ms", t0.elapsed().as_secs_f64() * 1000.0, "op" => op);
        res
    }
}
