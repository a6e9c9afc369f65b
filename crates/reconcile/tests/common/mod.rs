#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use game_core::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Create,
    Get,
    Delete,
}

/// Scripted behaviour for the next call of an op.
#[derive(Debug, Clone)]
pub enum Script {
    Fail(ClusterError),
    /// `get` reports absent although the workload exists (lost race).
    HideOnce,
    /// Call sleeps this long before proceeding.
    Stall(Duration),
}

/// In-memory cluster recording every call it receives.
#[derive(Default)]
pub struct FakeCluster {
    workloads: Mutex<BTreeMap<(String, String), DesiredWorkload>>,
    calls: Mutex<Vec<(Op, String, String)>>,
    scripts: Mutex<VecDeque<(Op, Script)>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, op: Op, s: Script) {
        self.scripts.lock().unwrap().push_back((op, s));
    }

    /// Out-of-band deletion; not recorded as a call.
    pub fn remove_external(&self, name: &str, ns: &str) -> Option<DesiredWorkload> {
        self.workloads.lock().unwrap().remove(&(ns.to_string(), name.to_string()))
    }

    /// Out-of-band creation; not recorded as a call.
    pub fn insert_external(&self, w: DesiredWorkload) {
        self.workloads.lock().unwrap().insert((w.namespace.clone(), w.name.clone()), w);
    }

    pub fn workload(&self, name: &str, ns: &str) -> Option<DesiredWorkload> {
        self.workloads.lock().unwrap().get(&(ns.to_string(), name.to_string())).cloned()
    }

    pub fn len(&self) -> usize {
        self.workloads.lock().unwrap().len()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls.lock().unwrap().iter().filter(|(o, _, _)| *o == op).count()
    }

    fn take_script(&self, op: Op) -> Option<Script> {
        let mut q = self.scripts.lock().unwrap();
        let idx = q.iter().position(|(o, _)| *o == op)?;
        q.remove(idx).map(|(_, s)| s)
    }

    async fn enter(&self, op: Op, name: &str, ns: &str) -> Option<Script> {
        self.calls.lock().unwrap().push((op, name.to_string(), ns.to_string()));
        match self.take_script(op) {
            Some(Script::Stall(d)) => {
                tokio::time::sleep(d).await;
                None
            }
            other => other,
        }
    }
}

#[async_trait::async_trait]
impl WorkloadClient for FakeCluster {
    async fn create(&self, w: &DesiredWorkload) -> Result<CreateStatus, ClusterError> {
        if let Some(Script::Fail(e)) = self.enter(Op::Create, &w.name, &w.namespace).await {
            return Err(e);
        }
        let mut map = self.workloads.lock().unwrap();
        let key = (w.namespace.clone(), w.name.clone());
        if map.contains_key(&key) {
            return Ok(CreateStatus::AlreadyExists);
        }
        map.insert(key, w.clone());
        Ok(CreateStatus::Created)
    }

    async fn get(&self, name: &str, ns: &str) -> Result<Option<ObservedWorkload>, ClusterError> {
        match self.enter(Op::Get, name, ns).await {
            Some(Script::Fail(e)) => return Err(e),
            Some(Script::HideOnce) => return Ok(None),
            _ => {}
        }
        let map = self.workloads.lock().unwrap();
        Ok(map.get(&(ns.to_string(), name.to_string())).map(|w| ObservedWorkload {
            name: w.name.clone(),
            namespace: w.namespace.clone(),
            replicas: Some(w.replicas),
            annotations: w.annotations.clone(),
        }))
    }

    async fn delete(&self, name: &str, ns: &str) -> Result<DeleteStatus, ClusterError> {
        if let Some(Script::Fail(e)) = self.enter(Op::Delete, name, ns).await {
            return Err(e);
        }
        match self.workloads.lock().unwrap().remove(&(ns.to_string(), name.to_string())) {
            Some(_) => Ok(DeleteStatus::Deleted),
            None => Ok(DeleteStatus::NotFound),
        }
    }
}

pub fn api_error(code: u16) -> ClusterError {
    ClusterError::Api { code, reason: "Test".into(), message: format!("scripted {}", code) }
}
