//! `UpdateLog` entries (`spec.md` §3 `UpdateRecord`).

use ripple_core::{ReplicaId, UpdateId, VectorClock};
use ripple_messages::{ParamValue, Request};

/// A single accepted update, as held in `ReplicaManager`'s in-memory log.
#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    pub origin: ReplicaId,
    pub ts: VectorClock,
    pub op: Request,
    pub prev: VectorClock,
    pub update_id: UpdateId,
}

/// Convenience constructor for call sites that only have typed domain
/// params handy (tests, the front end before it goes over the wire).
pub fn request(opcode: impl Into<String>, params: Vec<ParamValue>) -> Request {
    Request::new(opcode, params)
}
