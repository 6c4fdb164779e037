//! Boots the co-located reference deployment: every replica's
//! `ReplicaManager` in one process, sharing one in-memory `Directory`.
//!
//! `spec.md` §6 treats replica-to-replica calls as boundary-crossing RPCs
//! over a pluggable address book but doesn't mandate a wire transport; we
//! never built one (`ripple_replication::handle::ReplicaHandle` is the
//! in-process call surface). A single process hosting the whole replica
//! set, each with its own data directory and gossip thread, is therefore
//! the reference deployment these binaries actually run.

use ripple_core::ReplicaId;
use ripple_directory::{names, Directory};
use ripple_domain::{DomainError, Handlers, Store};
use ripple_replication::{gossip, Config, ReplicaHandle, ReplicaManager, Status, Stopper};
use snafu::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ClusterError {
    #[snafu(display("failed to prepare data directory {path:?}: {source}"))]
    DataDir { path: PathBuf, source: std::io::Error },

    #[snafu(display("replica {id} store failed to open: {source}"))]
    Store { id: usize, source: DomainError },
}

/// An initial status override for one replica; every replica not named
/// here starts `Active` with auto-status sampling on.
pub struct InitialStatus {
    pub id: ReplicaId,
    pub status: Status,
    pub auto_status: bool,
}

pub struct Cluster {
    pub directory: Arc<Directory<Arc<dyn ReplicaHandle>>>,
    pub replicas: Vec<Arc<ReplicaManager>>,
    pub stopper: Stopper,
}

impl Cluster {
    /// `base_data_dir` must contain a seed `movies.csv`; each replica gets
    /// its own `replica-<i>/` subdirectory seeded from it on first run.
    pub fn start(
        base_data_dir: &Path,
        config: Config,
        initial: &[InitialStatus],
    ) -> Result<Self, ClusterError> {
        let directory = Arc::new(Directory::new());
        let stopper = Stopper::new();
        let mut replicas = Vec::with_capacity(config.n);

        for i in 0..config.n {
            let id = ReplicaId::new(i);
            let data_dir = replica_data_dir(base_data_dir, id)?;
            let store = Store::open(&data_dir).context(StoreSnafu { id: i })?;

            let (status, auto_status) = initial
                .iter()
                .find(|entry| entry.id == id)
                .map(|entry| (entry.status, entry.auto_status))
                .unwrap_or((Status::Active, true));

            let rm = Arc::new(ReplicaManager::new(
                id,
                store,
                Handlers::movie_ratings(),
                config.clone(),
                status,
                auto_status,
                directory.clone(),
                stopper.clone(),
            ));
            directory.register(names::replica(id), rm.clone() as Arc<dyn ReplicaHandle>);
            replicas.push(rm);
        }

        Ok(Self {
            directory,
            replicas,
            stopper,
        })
    }

    pub fn replica(&self, id: ReplicaId) -> Option<Arc<ReplicaManager>> {
        self.replicas.get(id.get()).cloned()
    }

    /// Spawns the gossip ticker for every replica in the cluster.
    pub fn spawn_gossip(&self) -> Vec<JoinHandle<()>> {
        self.replicas.iter().map(|rm| gossip::spawn(rm.clone())).collect()
    }

    pub fn shutdown(&self) {
        self.stopper.stop();
    }
}

fn replica_data_dir(base: &Path, id: ReplicaId) -> Result<PathBuf, ClusterError> {
    let dir = base.join(format!("replica-{}", id.get()));
    std::fs::create_dir_all(&dir).context(DataDirSnafu { path: dir.clone() })?;

    let movies = dir.join("movies.csv");
    if !movies.exists() {
        let seed = base.join("movies.csv");
        std::fs::copy(&seed, &movies).context(DataDirSnafu { path: movies.clone() })?;
    }
    Ok(dir)
}
