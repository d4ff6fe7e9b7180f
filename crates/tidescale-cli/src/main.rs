//! tidescale — threshold-band autoscaler.
//!
//! Evaluates metric thresholds against a local redb state file and
//! adjusts group capacity accordingly.
//!
//! # Usage
//!
//! ```text
//! tidescale group put workers --region local --desired 2 --min 1 --max 10
//! tidescale series push --query queue.depth --value 140
//! tidescale evaluate --config tidescale.toml --dry-run
//! tidescale watch --config tidescale.toml --interval 60
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::PassOptions;

#[derive(Parser)]
#[command(
    name = "tidescale",
    about = "Threshold-band autoscaler",
    version,
    propagate_version = true
)]
struct Cli {
    /// Local state database.
    #[arg(long, global = true, default_value = "tidescale.redb")]
    state: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one evaluation pass per configured metric.
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        /// Log intended capacity changes without applying them.
        #[arg(long)]
        dry_run: bool,
        /// Per-pass budget in seconds (overrides the config file).
        #[arg(long)]
        timeout: Option<u64>,
        /// Only evaluate these metrics (repeatable).
        #[arg(short, long = "metric")]
        metrics: Vec<String>,
    },
    /// Evaluate on a fixed cadence until interrupted.
    Watch {
        #[arg(short, long)]
        config: PathBuf,
        /// Seconds between evaluation rounds.
        #[arg(short, long, default_value = "60")]
        interval: u64,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        timeout: Option<u64>,
        #[arg(short, long = "metric")]
        metrics: Vec<String>,
    },
    /// Check a config file for fatal findings and warnings.
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Manage local group records.
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },
    /// Manage local metric series.
    Series {
        #[command(subcommand)]
        action: SeriesAction,
    },
}

#[derive(Subcommand)]
enum GroupAction {
    /// Create or replace a group.
    Put {
        name: String,
        #[arg(long, default_value = "")]
        region: String,
        #[arg(long)]
        desired: i64,
        #[arg(long)]
        min: i64,
        #[arg(long)]
        max: i64,
        /// Cooldown after each change, in seconds.
        #[arg(long, default_value = "0")]
        cooldown: u64,
    },
    /// Print one group, or all groups when no name is given.
    Show {
        name: Option<String>,
        #[arg(long, default_value = "")]
        region: String,
    },
    /// Print the scaling activity log of a group.
    Activity {
        name: String,
        #[arg(long, default_value = "")]
        region: String,
    },
}

#[derive(Subcommand)]
enum SeriesAction {
    /// Append a sample to a metric series.
    Push {
        #[arg(short, long)]
        query: String,
        #[arg(short, long, allow_negative_numbers = true)]
        value: f64,
        /// Unix seconds (default: now).
        #[arg(short, long)]
        timestamp: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json)?;

    match cli.command {
        Commands::Evaluate {
            config,
            dry_run,
            timeout,
            metrics,
        } => {
            let options = PassOptions {
                dry_run,
                timeout,
                metrics,
            };
            commands::evaluate::evaluate(&cli.state, &config, &options).await
        }
        Commands::Watch {
            config,
            interval,
            dry_run,
            timeout,
            metrics,
        } => {
            let options = PassOptions {
                dry_run,
                timeout,
                metrics,
            };
            commands::watch::watch(&cli.state, &config, interval, &options).await
        }
        Commands::Validate { config } => commands::validate::validate(&config),
        Commands::Group { action } => match action {
            GroupAction::Put {
                name,
                region,
                desired,
                min,
                max,
                cooldown,
            } => commands::group::put(&cli.state, &name, &region, desired, min, max, cooldown),
            GroupAction::Show { name, region } => {
                commands::group::show(&cli.state, name.as_deref(), &region)
            }
            GroupAction::Activity { name, region } => {
                commands::group::activity(&cli.state, &name, &region)
            }
        },
        Commands::Series { action } => match action {
            SeriesAction::Push {
                query,
                value,
                timestamp,
            } => commands::series::push(&cli.state, &query, value, timestamp),
        },
    }
}

/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,tidescale=debug"))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
