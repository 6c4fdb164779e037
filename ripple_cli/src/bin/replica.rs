//! `replica <id> [<status>]` (`spec.md` §6).
//!
//! Starts the co-located reference cluster (every replica's
//! `ReplicaManager` in this one process, see `ripple_cli::cluster`),
//! applies `<status>` to replica `<id>` if given — disabling its
//! auto-status sampling — and runs the gossip loop until interrupted.

use clap::Parser;
use ripple_cli::cluster::{Cluster, InitialStatus};
use ripple_cli::config::{self, FileConfig, Overrides};
use ripple_core::ReplicaId;
use ripple_replication::Status;
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// This replica's id (0..N-1).
    id: usize,

    /// Initial status; when given, auto-status sampling starts disabled
    /// for this replica.
    status: Option<String>,

    /// Directory holding a seed `movies.csv`; every replica gets its own
    /// `replica-<i>/` subdirectory under it.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Optional TOML file overriding the operational-parameter defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    n: Option<usize>,
    #[arg(long)]
    failure_prob: Option<f64>,
    #[arg(long)]
    overload_prob: Option<f64>,
    #[arg(long)]
    gossip_interval_secs: Option<u64>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _logging_guard = ripple_cli::logging::init();

    let file_config = match args.config.as_ref().map(|path| FileConfig::load(path)) {
        Some(Ok(config)) => Some(config),
        Some(Err(error)) => {
            log::error!("{error}");
            return ExitCode::FAILURE;
        }
        None => None,
    };
    let engine_config = config::resolve(
        file_config,
        Overrides {
            n: args.n,
            failure_prob: args.failure_prob,
            overload_prob: args.overload_prob,
            gossip_interval_secs: args.gossip_interval_secs,
        },
    );

    if args.id >= engine_config.n {
        log::error!("replica id {} is out of range for N={}", args.id, engine_config.n);
        return ExitCode::FAILURE;
    }

    let status = match args.status.as_deref() {
        None => None,
        Some(raw) => match Status::parse(raw) {
            Some(status) => Some(status),
            None => {
                log::error!("invalid status `{raw}`: must be active, overloaded, or offline");
                return ExitCode::FAILURE;
            }
        },
    };
    let auto_status = status.is_none();
    let status = status.unwrap_or(Status::Active);

    let initial = [InitialStatus {
        id: ReplicaId::new(args.id),
        status,
        auto_status,
    }];

    let cluster = match Cluster::start(&args.data_dir, engine_config, &initial) {
        Ok(cluster) => cluster,
        Err(error) => {
            log::error!("{error}");
            return ExitCode::FAILURE;
        }
    };

    let gossip_threads = cluster.spawn_gossip();
    log::info!(
        "replica {} ready (status={status}, auto_status={auto_status}); running {} co-located replicas",
        args.id,
        cluster.replicas.len()
    );

    wait_for_enter();

    log::info!("shutting down...");
    cluster.shutdown();
    for handle in gossip_threads {
        let _ = handle.join();
    }

    ExitCode::SUCCESS
}

fn wait_for_enter() {
    let mut reader = std::io::BufReader::new(std::io::stdin());
    let mut line = String::new();
    println!("Press Enter to stop...");
    let _ = reader.read_line(&mut line);
}
