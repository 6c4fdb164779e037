//! The gossip ticker (`spec.md` §4.3 "Gossip loop (state machine)"):
//! **Tick → Discover → Send → Sample → Sleep**, run on its own thread per
//! replica for the lifetime of the process.

use crate::handle::ReplicaHandle;
use crate::manager::ReplicaManager;
use crate::status::Status;
use ripple_directory::names;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Spawns the gossip loop. The returned handle finishes once
/// `manager.stopper()` is signalled.
pub fn spawn(manager: Arc<ReplicaManager>) -> JoinHandle<()> {
    thread::Builder::new()
        .name(format!("gossip-{}", manager.id()))
        .spawn(move || run(manager))
        .expect("failed to spawn gossip thread")
}

fn run(manager: Arc<ReplicaManager>) {
    let stopper = manager.stopper().clone();
    while !stopper.is_stopped() {
        tick(&manager);
        if stopper.wait_timeout(manager.gossip_interval()) {
            break;
        }
    }
    manager.cancel_pending();
    log::info!("replica {}: gossip loop stopped", manager.id());
}

fn tick(manager: &Arc<ReplicaManager>) {
    if manager.get_status() != Status::Offline {
        discover_and_send(manager);
    }
    if manager.auto_status_enabled() {
        manager.run_status_sample();
    }
    log::debug!("replica {}: status now {}", manager.id(), manager.get_status());
}

fn discover_and_send(manager: &Arc<ReplicaManager>) {
    let peers = manager.directory().list(&names::replica_prefix());

    for (name, peer) in peers {
        let parsed: Option<usize> = name.segments().last().and_then(|seg| seg.as_ref().parse::<usize>().ok());
        let peer_id = match parsed.map(ripple_core::ReplicaId::new) {
            Some(id) if id != manager.id() => id,
            _ => continue,
        };

        log::debug!("replica {}: sending gossip to replica {peer_id}", manager.id());
        manager.send_gossip_to(peer_id, peer.as_ref());
    }
}
