//! `ReplicaManager`: the gossip-architecture engine (`spec.md` §4.3). Owns
//! `replicaTs`, `valueTs`, the update log, the executed-id set, the
//! timestamp table, and the pending-query waiters; serves `send_update`,
//! `send_query`, `send_gossip`, `get_status`; runs the gossip ticker.

use crate::error::{ReplicationError, Result};
use crate::handle::ReplicaHandle;
use crate::log_record::LogRecord;
use crate::pending::PendingQueries;
use crate::shutdown::Stopper;
use crate::status::{sample_status, Status, StatusCell, StatusSamplerConfig};
use ripple_core::{ReplicaId, UpdateId, VectorClock};
use ripple_directory::Directory;
use ripple_domain::{DomainValue, Handlers, Store};
use ripple_messages::Request;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Operational parameters (`spec.md` §6, default values N=3,
/// failureProb=0.10, overloadProb=0.20, gossipInterval=8s).
#[derive(Clone, Debug)]
pub struct Config {
    pub n: usize,
    pub failure_prob: f64,
    pub overload_prob: f64,
    pub gossip_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            n: 3,
            failure_prob: 0.10,
            overload_prob: 0.20,
            gossip_interval: Duration::from_secs(8),
        }
    }
}

/// `valueTs` plus the executed-id set, guarded together: the set is
/// mutated only while holding this lock (`spec.md` §5).
struct ValueState {
    ts: VectorClock,
    executed: HashSet<UpdateId>,
}

pub struct ReplicaManager {
    id: ReplicaId,
    store: Store,
    handlers: Handlers,
    replica_ts: Mutex<VectorClock>,
    update_log: Mutex<Vec<LogRecord>>,
    value_ts: Mutex<ValueState>,
    ts_table: Mutex<Vec<Option<VectorClock>>>,
    pending: PendingQueries,
    status: StatusCell,
    auto_status: AtomicBool,
    sampler_config: StatusSamplerConfig,
    config: Config,
    directory: Arc<Directory<Arc<dyn ReplicaHandle>>>,
    stopper: Stopper,
}

impl ReplicaManager {
    pub fn new(
        id: ReplicaId,
        store: Store,
        handlers: Handlers,
        config: Config,
        initial_status: Status,
        auto_status: bool,
        directory: Arc<Directory<Arc<dyn ReplicaHandle>>>,
        stopper: Stopper,
    ) -> Self {
        let n = config.n;
        let ts_table = (0..n)
            .map(|i| if i == id.get() { None } else { Some(VectorClock::new(n)) })
            .collect();

        Self {
            id,
            store,
            handlers,
            replica_ts: Mutex::new(VectorClock::new(n)),
            update_log: Mutex::new(Vec::new()),
            value_ts: Mutex::new(ValueState {
                ts: VectorClock::new(n),
                executed: HashSet::new(),
            }),
            ts_table: Mutex::new(ts_table),
            pending: PendingQueries::new(),
            status: StatusCell::new(initial_status),
            auto_status: AtomicBool::new(auto_status),
            sampler_config: StatusSamplerConfig {
                failure_prob: config.failure_prob,
                overload_prob: config.overload_prob,
            },
            config,
            directory,
            stopper,
        }
    }

    pub fn id(&self) -> ReplicaId {
        self.id
    }

    pub fn stopper(&self) -> &Stopper {
        &self.stopper
    }

    pub fn gossip_interval(&self) -> Duration {
        self.config.gossip_interval
    }

    pub fn directory(&self) -> &Arc<Directory<Arc<dyn ReplicaHandle>>> {
        &self.directory
    }

    fn apply_update(&self, op: &Request) -> Result<()> {
        self.handlers
            .apply_update(&self.store, &op.opcode, &op.params)
            .map_err(Into::into)
    }

    fn apply_query(&self, op: &Request) -> Result<DomainValue> {
        self.handlers
            .apply_query(&self.store, &op.opcode, &op.params)
            .map_err(Into::into)
    }

    /// `_executeUpdate` (`spec.md` §4.3): idempotent on `update_id`, must
    /// run under the value-timestamp lock.
    fn execute_update(&self, op: &Request, update_id: &UpdateId, ts: &VectorClock) -> Result<()> {
        let mut state = self.value_ts.lock().expect("valueTs lock poisoned");
        if state.executed.contains(update_id) {
            return Ok(());
        }
        self.apply_update(op)?;
        state.ts = state.ts.merge(ts)?;
        state.executed.insert(update_id.clone());
        Ok(())
    }

    /// Applies every update that has become stable, looping to a fixed
    /// point: each application can only grow `valueTs`, which may make
    /// further records stable, so we keep scanning until nothing new
    /// qualifies. This is a valid linear extension of the happens-before
    /// order (`spec.md` §5) because a record is only picked once its
    /// `prev` is already covered by `valueTs`.
    fn apply_stable_updates(&self) {
        loop {
            let next = {
                // Fixed lock order (`spec.md` §5): updateLog before valueTs.
                let log = self.update_log.lock().expect("update log lock poisoned");
                let state = self.value_ts.lock().expect("valueTs lock poisoned");
                log.iter()
                    .find(|r| !state.executed.contains(&r.update_id) && r.prev.le(&state.ts))
                    .cloned()
            };
            match next {
                Some(record) => {
                    if let Err(error) = self.execute_update(&record.op, &record.update_id, &record.ts) {
                        log::warn!("replica {}: failed to apply stable update: {error}", self.id);
                        break;
                    }
                }
                None => break,
            }
        }
    }

    fn value_ts_snapshot(&self) -> VectorClock {
        self.value_ts.lock().expect("valueTs lock poisoned").ts.clone()
    }

    /// `_getRecentUpdates` (`spec.md` §4.3): records not yet known to
    /// `peer_ts`.
    pub fn recent_updates_for(&self, peer_ts: &VectorClock) -> Vec<LogRecord> {
        self.update_log
            .lock()
            .expect("update log lock poisoned")
            .iter()
            .filter(|record| !record.ts.le(peer_ts))
            .cloned()
            .collect()
    }

    pub fn ts_table_entry(&self, peer: ReplicaId) -> VectorClock {
        self.ts_table
            .lock()
            .expect("ts table lock poisoned")
            .get(peer.get())
            .and_then(Clone::clone)
            .unwrap_or_else(|| VectorClock::new(self.config.n))
    }

    pub fn replica_ts_snapshot(&self) -> VectorClock {
        self.replica_ts.lock().expect("replicaTs lock poisoned").clone()
    }

    /// Sends one gossip round to a single peer — the body of the "Send"
    /// state for one peer, also handy for driving gossip exchanges
    /// directly in tests without the ticker's sleep/discover cycle.
    pub fn send_gossip_to(&self, peer_id: ReplicaId, peer: &dyn ReplicaHandle) {
        let peer_ts = self.ts_table_entry(peer_id);
        let recent = self.recent_updates_for(&peer_ts);
        let replica_ts = self.replica_ts_snapshot();
        peer.send_gossip(recent, replica_ts, self.id);
    }

    pub fn auto_status_enabled(&self) -> bool {
        self.auto_status.load(Ordering::SeqCst)
    }

    pub(crate) fn set_auto_status(&self, enabled: bool) {
        self.auto_status.store(enabled, Ordering::SeqCst);
    }

    pub(crate) fn run_status_sample(&self) {
        if self.auto_status_enabled() {
            self.status.set(sample_status(self.sampler_config));
        }
    }

    pub(crate) fn cancel_pending(&self) {
        self.pending.cancel_all();
    }
}

impl ReplicaHandle for ReplicaManager {
    fn send_update(&self, op: Request, prev: VectorClock, update_id: String) -> Result<Option<VectorClock>> {
        let update_id = UpdateId::from(update_id);

        if self
            .value_ts
            .lock()
            .expect("valueTs lock poisoned")
            .executed
            .contains(&update_id)
        {
            return Ok(None);
        }

        let ts = {
            let mut replica_ts = self.replica_ts.lock().expect("replicaTs lock poisoned");
            let incremented = replica_ts.increment(self.id.get())?;
            let mut values = prev.value().to_vec();
            values[self.id.get()] = incremented.value()[self.id.get()];
            *replica_ts = incremented;
            VectorClock::from_iterable(values)
        };

        let record = LogRecord {
            origin: self.id,
            ts: ts.clone(),
            op: op.clone(),
            prev: prev.clone(),
            update_id: update_id.clone(),
        };
        self.update_log.lock().expect("update log lock poisoned").push(record);

        if prev.le(&self.value_ts_snapshot()) {
            self.execute_update(&op, &update_id, &ts)?;
        }

        Ok(Some(ts))
    }

    fn send_query(&self, op: Request, prev: VectorClock) -> Result<(DomainValue, VectorClock)> {
        {
            let state = self.value_ts.lock().expect("valueTs lock poisoned");
            if prev.le(&state.ts) {
                let value = self.apply_query(&op)?;
                return Ok((value, state.ts.clone()));
            }
        }

        let rx = self.pending.register(op, prev);
        rx.recv().unwrap_or(Err(ReplicationError::Cancelled))
    }

    fn send_gossip(&self, m_log: Vec<LogRecord>, m_ts: VectorClock, r_id: ReplicaId) {
        if self.status.get() == Status::Offline {
            return;
        }

        {
            let replica_ts = self.replica_ts.lock().expect("replicaTs lock poisoned");
            let mut log = self.update_log.lock().expect("update log lock poisoned");
            for record in m_log {
                let already_present = log.contains(&record);
                let covered = record.ts.le(&replica_ts);
                if !already_present && !covered {
                    log.push(record);
                }
            }
        }

        {
            let mut replica_ts = self.replica_ts.lock().expect("replicaTs lock poisoned");
            match replica_ts.merge(&m_ts) {
                Ok(merged) => *replica_ts = merged,
                Err(error) => log::warn!("replica {}: gossip timestamp merge failed: {error}", self.id),
            }
        }

        self.apply_stable_updates();

        if let Some(slot) = self.ts_table.lock().expect("ts table lock poisoned").get_mut(r_id.get()) {
            *slot = Some(m_ts);
        }

        let value_ts = self.value_ts_snapshot();
        self.pending.deliver_stable(&value_ts, |op| {
            self.apply_query(op).map(|value| (value, value_ts.clone()))
        });
    }

    fn get_status(&self) -> Status {
        self.status.get()
    }

    fn set_status(&self, status: Status) {
        self.status.set(status);
    }

    fn toggle_auto_status(&self, enabled: bool) {
        self.set_auto_status(enabled);
    }
}
