//! `control <replica_id> <active|overloaded|offline|auto|manual>`
//! (`spec.md` §6).
//!
//! `spec.md` doesn't mandate a replica-to-replica wire transport, and we
//! never built one (`ripple_replication::ReplicaHandle` is an in-process
//! call surface — see `ripple_cli::cluster`). A standalone `control`
//! process therefore can't reach another process's replica set over a
//! socket; this command boots the same co-located cluster a `replica`
//! process would, applies the requested status change to the named
//! replica, reports the result, and exits. It still exercises the CLI
//! surface and exit-code contract `spec.md` §6 specifies.

use clap::Parser;
use ripple_cli::cluster::Cluster;
use ripple_cli::config::{self, FileConfig, Overrides};
use ripple_core::ReplicaId;
use ripple_replication::{ReplicaHandle, Status};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The replica to control (0..N-1).
    replica_id: usize,

    /// `active`, `overloaded`, `offline`, `auto`, or `manual`.
    command: String,

    /// Directory holding a seed `movies.csv`; must match the one the
    /// target `replica` process was started with.
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

    if args.replica_id >= engine_config.n {
        log::error!("replica id {} is out of range for N={}", args.replica_id, engine_config.n);
        return ExitCode::FAILURE;
    }

    let cluster = match Cluster::start(&args.data_dir, engine_config, &[]) {
        Ok(cluster) => cluster,
        Err(error) => {
            log::error!("{error}");
            return ExitCode::FAILURE;
        }
    };

    let replica = cluster
        .replica(ReplicaId::new(args.replica_id))
        .expect("replica_id already range-checked against N");

    match args.command.as_str() {
        "active" => replica.set_status(Status::Active),
        "overloaded" => replica.set_status(Status::Overloaded),
        "offline" => replica.set_status(Status::Offline),
        "auto" => replica.toggle_auto_status(true),
        "manual" => replica.toggle_auto_status(false),
        other => {
            log::error!("invalid command `{other}`: must be one of active, overloaded, offline, auto, manual");
            return ExitCode::FAILURE;
        }
    }

    println!(
        "replica {}: status={}, auto_status={}",
        args.replica_id,
        replica.get_status(),
        replica.auto_status_enabled()
    );

    ExitCode::SUCCESS
}
