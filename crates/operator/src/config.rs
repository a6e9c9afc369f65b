use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use game_manifest::{ManifestBuilder, DEFAULT_IMAGE, DEFAULT_PORT};
use game_reconcile::RetryPolicy;

#[derive(Parser, Debug)]
#[command(name = "game-operator", version, about = "Keeps one Deployment per Game custom resource")]
pub struct Cli {
    /// Kubernetes namespace (run: all namespaces when unset; other commands: current context)
    #[arg(long = "ns", env = "GAME_NAMESPACE", global = true)]
    pub namespace: Option<String>,

    #[command(flatten)]
    pub workload: WorkloadArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct WorkloadArgs {
    /// Container image for game Deployments
    #[arg(long = "image", env = "GAME_IMAGE", global = true, default_value = DEFAULT_IMAGE)]
    pub image: String,

    /// Container port exposed by game Deployments
    #[arg(long = "port", env = "GAME_PORT", global = true, default_value_t = DEFAULT_PORT)]
    pub port: i32,
}

impl WorkloadArgs {
    pub fn manifests(&self) -> ManifestBuilder {
        ManifestBuilder::new(self.image.clone(), self.port)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the controller until SIGINT/SIGTERM
    Run(RunArgs),
    /// Print the desired Deployment for a game as JSON
    Manifest {
        /// Game name
        name: String,
    },
    /// Check one game once and recreate its Deployment if missing
    Reconcile {
        /// Game name
        name: String,
        /// Bound on each API call
        #[arg(long = "api-timeout-secs", env = "GAME_API_TIMEOUT_SECS", default_value_t = 10)]
        api_timeout_secs: u64,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Backoff {
    Fixed,
    Exponential,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Seconds between self-heal checks of each game
    #[arg(long = "interval-secs", env = "GAME_RECONCILE_INTERVAL_SECS", default_value_t = 5)]
    pub interval_secs: u64,

    /// Bound on each API call
    #[arg(long = "api-timeout-secs", env = "GAME_API_TIMEOUT_SECS", default_value_t = 10)]
    pub api_timeout_secs: u64,

    /// Delay growth after consecutive transient failures
    #[arg(long = "backoff", env = "GAME_BACKOFF", value_enum, default_value_t = Backoff::Fixed)]
    pub backoff: Backoff,

    /// Cap for exponential backoff
    #[arg(long = "backoff-max-secs", env = "GAME_BACKOFF_MAX_SECS", default_value_t = 300)]
    pub backoff_max_secs: u64,

    /// Log an alert after this many consecutive failures of one game (0 = off)
    #[arg(long = "alert-after", env = "GAME_ALERT_AFTER", default_value_t = 0)]
    pub alert_after: u32,
}

impl RunArgs {
    pub fn retry_policy(&self) -> RetryPolicy {
        let base = Duration::from_secs(self.interval_secs.max(1));
        match self.backoff {
            Backoff::Fixed => RetryPolicy::Fixed(base),
            Backoff::Exponential => {
                RetryPolicy::Exponential { base, max: Duration::from_secs(self.backoff_max_secs).max(base) }
            }
        }
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs.max(1))
    }
}
