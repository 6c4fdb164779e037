//! The pending-query rendezvous (`spec.md` §3 `PendingQuery`, §9 "Replace
//! the awaited single-slot queue with a typed one-shot channel per pending
//! key"). Each waiting query gets its own bounded(1) channel; delivery
//! happens from whichever gossip merge first makes its `q_prev` stable.

use crate::error::{CancelledSnafu, ReplicationError};
use ripple_core::VectorClock;
use ripple_domain::DomainValue;
use ripple_messages::Request;
use std::sync::Mutex;

pub type QueryOutcome = Result<(DomainValue, VectorClock), ReplicationError>;

struct Waiter {
    op: Request,
    prev: VectorClock,
    sender: crossbeam_channel::Sender<QueryOutcome>,
}

/// Keyed by `(q_op, q_prev)`; lookup is linear since the replica set is
/// small and concurrently pending queries are rare, but each slot is its
/// own channel so delivering one never blocks on another
/// ("fine-grained locking per key", `spec.md` §5).
#[derive(Default)]
pub struct PendingQueries {
    waiters: Mutex<Vec<Waiter>>,
}

impl PendingQueries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new pending slot, returning the receiver end the RPC
    /// handler blocks on.
    pub fn register(&self, op: Request, prev: VectorClock) -> crossbeam_channel::Receiver<QueryOutcome> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.waiters.lock().expect("pending queries lock poisoned").push(Waiter {
            op,
            prev,
            sender: tx,
        });
        rx
    }

    /// Delivers every waiter whose `prev` is now `<= value_ts`, computing
    /// its result via `compute`. Waiters whose handler itself fails still
    /// count as delivered (the error crosses the channel).
    pub fn deliver_stable(
        &self,
        value_ts: &VectorClock,
        mut compute: impl FnMut(&Request) -> QueryOutcome,
    ) {
        let mut waiters = self.waiters.lock().expect("pending queries lock poisoned");
        waiters.retain(|waiter| {
            if waiter.prev.le(value_ts) {
                let _ = waiter.sender.send(compute(&waiter.op));
                false
            } else {
                true
            }
        });
    }

    /// Fails every still-pending waiter with `Cancelled` (shutdown).
    pub fn cancel_all(&self) {
        let mut waiters = self.waiters.lock().expect("pending queries lock poisoned");
        for waiter in waiters.drain(..) {
            let _ = waiter.sender.send(Err(CancelledSnafu.build()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_messages::Request;

    #[test]
    fn delivers_only_stable_waiters() {
        let pending = PendingQueries::new();
        let rx = pending.register(Request::new("q.get_avg_rating", vec![]), VectorClock::from_iterable([1, 0, 0]));

        pending.deliver_stable(&VectorClock::from_iterable([0, 0, 0]), |_| {
            Ok((DomainValue::Float(0.0), VectorClock::new(3)))
        });
        assert!(rx.try_recv().is_err());

        pending.deliver_stable(&VectorClock::from_iterable([1, 0, 0]), |_| {
            Ok((DomainValue::Float(4.0), VectorClock::from_iterable([1, 0, 0])))
        });
        let (value, _) = rx.try_recv().unwrap().unwrap();
        assert_eq!(value, DomainValue::Float(4.0));
    }

    #[test]
    fn cancel_all_fails_pending_waiters() {
        let pending = PendingQueries::new();
        let rx = pending.register(Request::new("q.get_avg_rating", vec![]), VectorClock::from_iterable([1, 0, 0]));
        pending.cancel_all();
        assert!(rx.recv().unwrap().is_err());
    }
}
