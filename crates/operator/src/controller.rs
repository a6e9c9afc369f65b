//! Event source for the engine: a kube-runtime controller over Game objects.
//!
//! The runtime serializes reconciles per object. Deletion goes through a
//! finalizer so the Deployment is torn down before the Game disappears.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use game_core::{CoreError, Game, GameStatus, InstanceRef, LifecycleEvent, Outcome, ResourceInstance};
use game_reconcile::{Engine, RetryPolicy};
use kube::{
    api::{Api, ListParams},
    runtime::{
        controller::{Action, Controller},
        finalizer::{finalizer, Event as Finalizer},
        watcher,
    },
    Client, ResourceExt,
};
use metrics::counter;
use tracing::{debug, error, info, warn};

use crate::classify::{classify, Trigger};
use crate::tracker::Tracker;

pub const FINALIZER: &str = "mygames.com/game-controller";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("finalizer: {0}")]
    Finalizer(#[source] Box<kube::runtime::finalizer::Error<Error>>),
}

pub struct Context {
    pub client: Client,
    pub engine: Engine,
    pub tracker: Tracker,
    pub retry: RetryPolicy,
    /// Consecutive failures before alerting; 0 disables.
    pub alert_after: u32,
}

/// Watch Games (one namespace or all) until a shutdown signal arrives.
pub async fn run(ctx: Arc<Context>, namespace: Option<&str>) -> Result<()> {
    let games = game_kubehub::games_api(ctx.client.clone(), namespace);
    games
        .list(&ListParams::default().limit(1))
        .await
        .context("Game CRD is not queryable; is deploy/crd.yaml applied?")?;
    info!(ns = ?namespace, retry = ?ctx.retry, "game controller started");

    Controller::new(games, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => debug!(game = %obj, "reconciled"),
                Err(e) => warn!(error = %e, "reconcile failed"),
            }
        })
        .await;
    info!("game controller terminated");
    Ok(())
}

async fn reconcile(game: Arc<Game>, ctx: Arc<Context>) -> Result<Action, Error> {
    let ns = game.namespace().ok_or_else(|| CoreError::MissingNamespace(game.name_any()))?;
    let api: Api<Game> = Api::namespaced(ctx.client.clone(), &ns);
    finalizer(&api, FINALIZER, game, |event| async {
        match event {
            Finalizer::Apply(g) => apply(g, &api, &ctx).await,
            Finalizer::Cleanup(g) => cleanup(g, &ctx).await,
        }
    })
    .await
    .map_err(|e| Error::Finalizer(Box::new(e)))
}

fn error_policy(game: Arc<Game>, err: &Error, ctx: Arc<Context>) -> Action {
    warn!(name = %game.name_any(), namespace = ?game.namespace(), error = %err, "reconcile error");
    Action::requeue(ctx.retry.delay(0))
}

async fn apply(game: Arc<Game>, api: &Api<Game>, ctx: &Context) -> Result<Action, Error> {
    let inst = ResourceInstance::try_from(game.as_ref())?;
    let r = inst.instance_ref();
    let trigger = classify(&game, ctx.tracker.observe(&r));
    let outcome = ctx.engine.handle(&trigger.event(inst)).await;
    if trigger == Trigger::Created {
        record_creation(api, &game, &outcome).await;
    }

    let (action, failures) = settle(&ctx.tracker, &r, &outcome, &ctx.retry);
    if should_alert(failures, ctx.alert_after) {
        error!(
            name = %r.name,
            namespace = %r.namespace,
            failures,
            error = ?outcome.error().map(ToString::to_string),
            "game keeps failing to converge"
        );
        counter!(crate::telemetry::ALERTS_TOTAL, 1u64);
    }
    Ok(action)
}

/// Status a creation attempt leaves on the Game.
fn creation_status(outcome: &Outcome, generation: Option<i64>, now: DateTime<Utc>) -> GameStatus {
    match outcome {
        Outcome::Terminal(e) => game_kubehub::failed_status(generation, e.to_string(), now),
        _ => game_kubehub::provisioned_status(generation, now),
    }
}

/// A lost write leaves the status unset, so the next reconcile redoes the
/// idempotent create and writes again.
async fn record_creation(api: &Api<Game>, game: &Game, outcome: &Outcome) {
    let status = creation_status(outcome, game.metadata.generation, Utc::now());
    if let Err(e) = game_kubehub::patch_status(api, &game.name_any(), &status).await {
        warn!(name = %game.name_any(), error = %e, "status write failed");
    }
}

/// Record `outcome` and schedule the next check. Every outcome requeues,
/// terminal creations included: only `Created` is held back for them.
fn settle(tracker: &Tracker, r: &InstanceRef, outcome: &Outcome, retry: &RetryPolicy) -> (Action, u32) {
    let failures = tracker.record(r, outcome);
    (Action::requeue(retry.delay(failures)), failures)
}

/// Alert once per failure streak, when it reaches `alert_after` (0 = never).
fn should_alert(failures: u32, alert_after: u32) -> bool {
    alert_after > 0 && failures == alert_after
}

async fn cleanup(game: Arc<Game>, ctx: &Context) -> Result<Action, Error> {
    let r = InstanceRef::new(game.name_any(), game.namespace().unwrap_or_default());
    retire(&ctx.engine, &ctx.tracker, &r).await;
    debug!(name = %r.name, namespace = %r.namespace, tracked = ctx.tracker.len(), "game retired");
    Ok(Action::await_change())
}

/// Tear down and forget a deleted game. The outcome is logged by the engine
/// and never holds the finalizer.
async fn retire(engine: &Engine, tracker: &Tracker, r: &InstanceRef) -> Outcome {
    let outcome = engine.handle(&LifecycleEvent::Deleted(r.clone())).await;
    tracker.forget(r);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use chrono::TimeZone;
    use game_core::{
        ClusterError, Conflict, CreateStatus, DeleteStatus, DesiredWorkload, Effect, GamePhase, ObservedWorkload,
        WorkloadClient,
    };
    use game_manifest::ManifestBuilder;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn transient() -> Outcome {
        Outcome::Transient(ClusterError::Transport("connection reset".into()))
    }

    fn terminal() -> Outcome {
        Outcome::Terminal(ClusterError::Api { code: 422, reason: "Invalid".into(), message: "bad image".into() })
    }

    #[test]
    fn creation_status_follows_outcome() {
        for ok in [Outcome::Ok(Effect::Created), Outcome::Conflict(Conflict::AlreadyExists)] {
            let st = creation_status(&ok, Some(2), t0());
            assert_eq!(st.phase, Some(GamePhase::Provisioned));
            assert_eq!(st.observed_generation, Some(2));
            assert_eq!(st.message, None);
        }
        let st = creation_status(&terminal(), Some(3), t0());
        assert_eq!(st.phase, Some(GamePhase::Failed));
        assert_eq!(st.observed_generation, Some(3));
        assert_eq!(st.message.as_deref(), Some("api error 422 (Invalid): bad image"));
    }

    #[test]
    fn terminal_creation_keeps_timer_running() {
        let tracker = Tracker::new();
        let r = InstanceRef::new("g1", "ns1");
        let (action, failures) = settle(&tracker, &r, &terminal(), &RetryPolicy::default());
        assert_eq!(failures, 1);
        assert_eq!(action, Action::requeue(Duration::from_secs(5)));
        assert_ne!(action, Action::await_change());
    }

    #[test]
    fn settle_backs_off_and_resets() {
        let tracker = Tracker::new();
        let r = InstanceRef::new("g1", "ns1");
        let retry = RetryPolicy::Exponential { base: Duration::from_secs(5), max: Duration::from_secs(60) };
        let delays: Vec<Action> = (0..3).map(|_| settle(&tracker, &r, &transient(), &retry).0).collect();
        assert_eq!(
            delays,
            vec![
                Action::requeue(Duration::from_secs(5)),
                Action::requeue(Duration::from_secs(10)),
                Action::requeue(Duration::from_secs(20)),
            ]
        );
        let (action, failures) = settle(&tracker, &r, &Outcome::Ok(Effect::Unchanged), &retry);
        assert_eq!(failures, 0);
        assert_eq!(action, Action::requeue(Duration::from_secs(5)));
    }

    #[test]
    fn alert_fires_once_per_streak() {
        let tracker = Tracker::new();
        let r = InstanceRef::new("g1", "ns1");
        let alerts: Vec<bool> = (0..5)
            .map(|_| should_alert(settle(&tracker, &r, &transient(), &RetryPolicy::default()).1, 3))
            .collect();
        assert_eq!(alerts, vec![false, false, true, false, false]);
    }

    #[test]
    fn alert_disabled_at_zero() {
        assert!((0..100).all(|n| !should_alert(n, 0)));
    }

    #[derive(Default)]
    struct Recorder {
        deletes: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl WorkloadClient for Recorder {
        async fn create(&self, _w: &DesiredWorkload) -> Result<CreateStatus, ClusterError> {
            Ok(CreateStatus::Created)
        }
        async fn get(&self, _name: &str, _ns: &str) -> Result<Option<ObservedWorkload>, ClusterError> {
            Ok(None)
        }
        async fn delete(&self, name: &str, _ns: &str) -> Result<DeleteStatus, ClusterError> {
            self.deletes.lock().unwrap().push(name.to_string());
            Ok(DeleteStatus::Deleted)
        }
    }

    #[tokio::test]
    async fn retired_game_is_forgotten() {
        let client = Arc::new(Recorder::default());
        let engine = Engine::new(client.clone(), ManifestBuilder::default());
        let tracker = Tracker::new();
        let g1 = InstanceRef::new("g1", "ns1");
        tracker.observe(&g1);
        tracker.observe(&InstanceRef::new("g2", "ns1"));

        assert_eq!(retire(&engine, &tracker, &g1).await, Outcome::Ok(Effect::Deleted));
        assert_eq!(*client.deletes.lock().unwrap(), vec!["g1".to_string()]);
        assert_eq!(tracker.len(), 1);
        // A later game reusing the name starts over as a first sighting.
        assert!(tracker.observe(&g1));
    }
}
