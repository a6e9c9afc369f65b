use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Failure talking to the cluster. Conflicts (already exists / not found) are
/// reported as statuses by [`crate::WorkloadClient`] and never land here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClusterError {
    #[error("api error {code} ({reason}): {message}")]
    Api { code: u16, reason: String, message: String },
    #[error("transport: {0}")]
    Transport(String),
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
}

/// Mutation (or lack of one) a handler performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Created,
    Deleted,
    Unchanged,
}

/// Cluster was already in the requested state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conflict {
    AlreadyExists,
    AlreadyAbsent,
}

/// Result of handling one lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok(Effect),
    Conflict(Conflict),
    /// Left for the next timer tick.
    Transient(ClusterError),
    /// The host should stop retrying until the spec changes.
    Terminal(ClusterError),
}

impl Outcome {
    /// True when desired and observed state match after the handler ran.
    pub fn is_converged(&self) -> bool {
        matches!(self, Outcome::Ok(_) | Outcome::Conflict(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Outcome::Terminal(_))
    }

    pub fn error(&self) -> Option<&ClusterError> {
        match self {
            Outcome::Transient(e) | Outcome::Terminal(e) => Some(e),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Ok(Effect::Created) => "created",
            Outcome::Ok(Effect::Deleted) => "deleted",
            Outcome::Ok(Effect::Unchanged) => "unchanged",
            Outcome::Conflict(Conflict::AlreadyExists) => "already_exists",
            Outcome::Conflict(Conflict::AlreadyAbsent) => "already_absent",
            Outcome::Transient(_) => "transient",
            Outcome::Terminal(_) => "terminal",
        }
    }
}
