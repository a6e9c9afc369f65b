use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Workload a Game instance implies should exist in the cluster.
///
/// `labels` is the single source for the selector, the pod template labels and
/// the object labels; keeping one map makes a selector/pod mismatch impossible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredWorkload {
    /// Always equal to the owning instance name; used as the lookup key.
    pub name: String,
    pub namespace: String,
    pub replicas: i32,
    pub image: String,
    pub port: i32,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

impl DesiredWorkload {
    pub fn selector(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn pod_labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }
}

/// What the cluster currently holds for a name/namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObservedWorkload {
    pub name: String,
    pub namespace: String,
    pub replicas: Option<i32>,
    pub annotations: BTreeMap<String, String>,
}
