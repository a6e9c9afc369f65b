use crate::{ClusterError, DesiredWorkload, ObservedWorkload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStatus {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    Deleted,
    NotFound,
}

/// Cluster state client used by the reconciliation engine.
///
/// Implementations must be safe to share across concurrent handler
/// invocations for distinct instances.
#[async_trait::async_trait]
pub trait WorkloadClient: Send + Sync {
    async fn create(&self, workload: &DesiredWorkload) -> Result<CreateStatus, ClusterError>;

    /// `Ok(None)` when no workload exists under `name` in `namespace`.
    async fn get(&self, name: &str, namespace: &str) -> Result<Option<ObservedWorkload>, ClusterError>;

    async fn delete(&self, name: &str, namespace: &str) -> Result<DeleteStatus, ClusterError>;
}
