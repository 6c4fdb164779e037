//! The RPC boundary between replicas, and between the front end and a
//! replica (`spec.md` §6's "RPC surface"). `spec.md` does not mandate a
//! wire transport — the directory resolves logical names to *something*
//! that answers these calls — so this is a trait, letting the in-process
//! deployment hand out `Arc<ReplicaManager>` directly while tests can
//! substitute a mock without touching a socket.

use crate::error::Result;
use crate::log_record::LogRecord;
use crate::status::Status;
use ripple_core::{ReplicaId, VectorClock};
use ripple_domain::DomainValue;
use ripple_messages::Request;

pub trait ReplicaHandle: Send + Sync {
    /// `None` return means the update id was already applied
    /// (`spec.md` §4.3's "DuplicateUpdate" sentinel).
    fn send_update(&self, op: Request, prev: VectorClock, update_id: String) -> Result<Option<VectorClock>>;

    /// Blocks the calling thread until `q_prev` is stable at this replica.
    fn send_query(&self, op: Request, prev: VectorClock) -> Result<(DomainValue, VectorClock)>;

    /// Best-effort, fire-and-forget (`spec.md` §4.3).
    fn send_gossip(&self, log: Vec<LogRecord>, ts: VectorClock, origin: ReplicaId);

    fn get_status(&self) -> Status;

    fn set_status(&self, status: Status);

    fn toggle_auto_status(&self, enabled: bool);
}
