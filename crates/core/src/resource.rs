use std::collections::BTreeMap;
use std::fmt;

use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Desired state declared by a user for one game.
///
/// `workload` identifies what the game runs; every other key is carried
/// through untouched so users can attach their own data.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[kube(
    group = "mygames.com",
    version = "v1",
    kind = "Game",
    plural = "games",
    namespaced,
    status = "GameStatus",
    schema = "disabled",
    derive = "PartialEq"
)]
pub struct GameSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Provisioned,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<GamePhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Generation of the spec the phase was computed for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// RFC 3339 timestamp of the last status write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reconciled: Option<String>,
}

/// Identity of one Game instance: `(name, namespace)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceRef {
    pub name: String,
    pub namespace: String,
}

impl InstanceRef {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self { name: name.into(), namespace: namespace.into() }
    }
}

impl fmt::Display for InstanceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Read-only view of a Game handed to the engine for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceInstance {
    pub name: String,
    pub namespace: String,
    pub spec: GameSpec,
}

impl ResourceInstance {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, spec: GameSpec) -> Self {
        Self { name: name.into(), namespace: namespace.into(), spec }
    }

    pub fn instance_ref(&self) -> InstanceRef {
        InstanceRef::new(self.name.clone(), self.namespace.clone())
    }
}

impl TryFrom<&Game> for ResourceInstance {
    type Error = CoreError;

    fn try_from(game: &Game) -> Result<Self, Self::Error> {
        let name = game.name_any();
        let namespace = game.namespace().ok_or_else(|| CoreError::MissingNamespace(name.clone()))?;
        Ok(Self { name, namespace, spec: game.spec.clone() })
    }
}

impl Game {
    pub fn phase(&self) -> Option<GamePhase> {
        self.status.as_ref().and_then(|s| s.phase)
    }

    /// Generation recorded in status alongside the phase, if any.
    pub fn observed_generation(&self) -> Option<i64> {
        self.status.as_ref().and_then(|s| s.observed_generation)
    }
}
