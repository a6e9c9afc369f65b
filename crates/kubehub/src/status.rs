use chrono::{DateTime, SecondsFormat, Utc};
use game_core::{Game, GamePhase, GameStatus};
use kube::api::{Api, Patch, PatchParams};
use serde_json::{json, Value as Json};

pub fn provisioned_status(generation: Option<i64>, now: DateTime<Utc>) -> GameStatus {
    GameStatus {
        phase: Some(GamePhase::Provisioned),
        message: None,
        observed_generation: generation,
        last_reconciled: Some(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
    }
}

pub fn failed_status(generation: Option<i64>, message: impl Into<String>, now: DateTime<Utc>) -> GameStatus {
    GameStatus {
        phase: Some(GamePhase::Failed),
        message: Some(message.into()),
        observed_generation: generation,
        last_reconciled: Some(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
    }
}

/// Merge patch body for a status write. Every field is written explicitly
/// so an absent message clears a stale one.
pub fn status_patch(status: &GameStatus) -> Json {
    json!({
        "status": {
            "phase": status.phase,
            "message": status.message,
            "observedGeneration": status.observed_generation,
            "lastReconciled": status.last_reconciled,
        }
    })
}

pub async fn patch_status(api: &Api<Game>, name: &str, status: &GameStatus) -> Result<(), kube::Error> {
    let patch = status_patch(status);
    api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(())
}
