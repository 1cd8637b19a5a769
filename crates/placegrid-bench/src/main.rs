//! placegrid — drive the placement engine from the command line.
//!
//! # Usage
//!
//! ```text
//! placegrid bench --groups 128 --replicas 3 --threads 64
//! placegrid init --groups 4 --output placegrid.toml
//! placegrid schedule --config placegrid.toml --replicas 2
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use placegrid_core::{DiskStatus, PlacementStrategyKind};

mod commands;

#[derive(Parser)]
#[command(
    name = "placegrid",
    about = "placegrid — replica placement over a bucket/disk topology",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure scheduling throughput on a synthetic ROOT → SITE → GROUP topology.
    Bench {
        /// Number of groups under the site.
        #[arg(long, default_value = "64")]
        groups: usize,
        #[arg(long, default_value = "12")]
        disks_per_group: usize,
        #[arg(long, default_value = "2")]
        replicas: u16,
        /// Concurrent scheduling threads.
        #[arg(long, default_value = "8")]
        threads: usize,
        /// Schedule calls per thread.
        #[arg(long, default_value = "100000")]
        iterations: usize,
        #[arg(long, value_enum, default_value = "both")]
        strategy: StrategyArg,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Write a scaffold placegrid.toml.
    Init {
        #[arg(long, default_value = "4")]
        groups: usize,
        #[arg(long, default_value = "12")]
        disks_per_group: usize,
        #[arg(short, long, default_value = "placegrid.toml")]
        output: PathBuf,
    },
    /// Place replicas once against the topology in a config file and print
    /// the result as JSON.
    Schedule {
        #[arg(short, long, default_value = "placegrid.toml")]
        config: PathBuf,
        #[arg(short, long)]
        replicas: u16,
        /// Raw bucket id to place under (0 is the root).
        #[arg(long, allow_hyphen_values = true, default_value = "0")]
        bucket: i32,
        /// Override the configured minimum disk status (off, ro, rw).
        #[arg(long)]
        status: Option<DiskStatus>,
        /// Use rule-driven BFS instead of default placement.
        #[arg(long)]
        bfs: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    RoundRobin,
    ThreadLocal,
    Both,
}

impl StrategyArg {
    fn kinds(self) -> Vec<PlacementStrategyKind> {
        match self {
            StrategyArg::RoundRobin => vec![PlacementStrategyKind::RoundRobin],
            StrategyArg::ThreadLocal => vec![PlacementStrategyKind::ThreadLocalRoundRobin],
            StrategyArg::Both => vec![
                PlacementStrategyKind::RoundRobin,
                PlacementStrategyKind::ThreadLocalRoundRobin,
            ],
        }
    }
}

/// Filter used when `RUST_LOG` is unset. Placement events are emitted
/// under the `placegrid_scheduler` / `placegrid_placement` targets.
const DEFAULT_LOG_FILTER: &str = "info";

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Bench {
            groups,
            disks_per_group,
            replicas,
            threads,
            iterations,
            strategy,
            format,
        } => {
            let params = commands::bench::BenchParams {
                groups,
                disks_per_group,
                replicas,
                threads,
                iterations,
            };
            commands::bench::run(&params, &strategy.kinds(), &format)
        }
        Commands::Init {
            groups,
            disks_per_group,
            output,
        } => commands::init::init(groups, disks_per_group, &output),
        Commands::Schedule {
            config,
            replicas,
            bucket,
            status,
            bfs,
        } => commands::schedule::schedule(&config, replicas, bucket, status, bfs),
    }
}
