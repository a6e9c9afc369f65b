use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Parser;
use game_core::{Game, ResourceInstance};
use game_kubehub::KubeWorkloads;
use game_reconcile::Engine;
use kube::Api;
use tracing::error;

mod classify;
mod config;
mod controller;
mod telemetry;
mod tracker;

use config::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Manifest { name } => {
            let ns = cli.namespace.as_deref().unwrap_or("default");
            let desired = cli.workload.manifests().build(&name, ns);
            println!("{}", serde_json::to_string_pretty(&game_manifest::to_deployment(&desired))?);
        }
        Commands::Reconcile { name, api_timeout_secs } => {
            let client = game_kubehub::connect().await?;
            let ns = cli.namespace.clone().unwrap_or_else(|| client.default_namespace().to_string());
            let games: Api<Game> = Api::namespaced(client.clone(), &ns);
            let game = games.get(&name).await.with_context(|| format!("reading game {}/{}", ns, name))?;
            let inst = ResourceInstance::try_from(&game)?;
            let engine = Engine::new(Arc::new(KubeWorkloads::new(client)), cli.workload.manifests())
                .with_call_timeout(Duration::from_secs(api_timeout_secs.max(1)));
            let outcome = engine.ensure_converged(&inst).await;
            match outcome.error() {
                None => println!("{}/{}: {}", ns, name, outcome.label()),
                Some(e) => {
                    error!(name = %name, namespace = %ns, error = %e, "reconcile failed");
                    eprintln!("{}/{}: {} ({})", ns, name, outcome.label(), e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Run(run) => {
            telemetry::init_metrics();
            let client = game_kubehub::connect().await?;
            let engine = Engine::new(Arc::new(KubeWorkloads::new(client.clone())), cli.workload.manifests())
                .with_call_timeout(run.api_timeout());
            let ctx = Arc::new(controller::Context {
                client,
                engine,
                tracker: tracker::Tracker::new(),
                retry: run.retry_policy(),
                alert_after: run.alert_after,
            });
            controller::run(ctx, cli.namespace.as_deref()).await?;
        }
    }
    Ok(())
}
