//! Game controller core types: the custom resource, reconciliation events and
//! outcomes, and the seam to the cluster state client.

#![forbid(unsafe_code)]

mod client;
mod event;
mod outcome;
mod resource;
mod workload;

pub use client::{CreateStatus, DeleteStatus, WorkloadClient};
pub use event::LifecycleEvent;
pub use outcome::{ClusterError, Conflict, Effect, Outcome};
pub use resource::{Game, GamePhase, GameSpec, GameStatus, InstanceRef, ResourceInstance};
pub use workload::{DesiredWorkload, ObservedWorkload};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("game {0} has no metadata.namespace")]
    MissingNamespace(String),
}

pub mod prelude {
    pub use super::{
        ClusterError, Conflict, CreateStatus, DeleteStatus, DesiredWorkload, Effect, Game, GameSpec, GameStatus,
        InstanceRef, LifecycleEvent, ObservedWorkload, Outcome, ResourceInstance, WorkloadClient,
    };
}
