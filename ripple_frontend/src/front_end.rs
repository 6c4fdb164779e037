//! `FrontEnd`: the client-facing causal session proxy (`spec.md` §4.4).
//!
//! Holds the session's front-end timestamp `feTs`, forwards requests to a
//! chosen replica, and merges every returned timestamp back into `feTs` so
//! a session never observes its own writes go backwards in time. Also owns
//! replica selection (`spec.md` §4.4 `_chooseReplica`): prefer an active
//! replica, fall back to an overloaded one, and fail only when every known
//! replica is offline.

use crate::error::{FrontEndError, NoReplicasSnafu, Result};
use ripple_core::VectorClock;
use ripple_directory::{names, Directory, NameResolver};
use ripple_domain::DomainValue;
use ripple_messages::{ParamValue, Request};
use ripple_replication::{ReplicaHandle, ReplicationError, Status};
use rand::Rng;
use std::sync::{Arc, Mutex};

/// The opcode whose rating parameter the front end snaps before it ever
/// reaches a replica (`spec.md` §8 scenario S6): clients submit a rating on
/// any scale, the front end rounds it to the nearest half-star.
const ADD_RATING_OPCODE: &str = "u.add_rating";
const RATING_PARAM_INDEX: usize = 2;

/// What a completed request handed back: an update has nothing to return
/// beyond "it happened", a query returns the domain value it read.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Ack,
    Value(DomainValue),
}

pub struct FrontEnd {
    n: usize,
    fe_ts: Mutex<VectorClock>,
    directory: Arc<Directory<Arc<dyn ReplicaHandle>>>,
    current: Mutex<Option<Arc<dyn ReplicaHandle>>>,
}

impl FrontEnd {
    pub fn new(n: usize, directory: Arc<Directory<Arc<dyn ReplicaHandle>>>) -> Self {
        Self {
            n,
            fe_ts: Mutex::new(VectorClock::new(n)),
            directory,
            current: Mutex::new(None),
        }
    }

    pub fn ts(&self) -> VectorClock {
        self.fe_ts.lock().expect("feTs lock poisoned").clone()
    }

    /// `send_request` (`spec.md` §4.4): classify, snap ratings, pick a
    /// replica if the session doesn't already have a usable one, forward the
    /// request, and fold the replica's timestamp back into `feTs`.
    pub fn send_request(&self, request: Request) -> Result<Response> {
        let kind = request.kind()?;
        let request = snap_rating(request);
        let prev = self.ts();

        match kind {
            ripple_core::OpKind::Update => {
                let update_id = ripple_core::UpdateId::generate();
                let ts = self.call_with_retry(|replica| {
                    replica.send_update(request.clone(), prev.clone(), update_id.to_string())
                })?;
                if let Some(ts) = ts {
                    self.merge_ts(&ts)?;
                }
                Ok(Response::Ack)
            }
            ripple_core::OpKind::Query => {
                let (value, ts) = self.call_with_retry(|replica| replica.send_query(request.clone(), prev.clone()))?;
                self.merge_ts(&ts)?;
                Ok(Response::Value(value))
            }
        }
    }

    fn merge_ts(&self, other: &VectorClock) -> Result<()> {
        let mut fe_ts = self.fe_ts.lock().expect("feTs lock poisoned");
        *fe_ts = fe_ts.merge(other).map_err(FrontEndError::from)?;
        Ok(())
    }

    /// Runs `attempt` against the currently-selected replica. If that
    /// replica turns out to be unavailable, picks a fresh one and retries
    /// exactly once before giving up.
    fn call_with_retry<T>(
        &self,
        attempt: impl Fn(&dyn ReplicaHandle) -> ripple_replication::Result<T>,
    ) -> Result<T> {
        let replica = self.ensure_replica()?;
        match attempt(replica.as_ref()) {
            Ok(value) => Ok(value),
            Err(ReplicationError::PeerUnavailable { .. }) => {
                let replica = self.choose_replica()?;
                *self.current.lock().expect("current-replica lock poisoned") = Some(replica.clone());
                attempt(replica.as_ref()).map_err(FrontEndError::from)
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Returns the currently-selected replica, re-selecting if there isn't
    /// one yet or the selected one has gone offline since.
    fn ensure_replica(&self) -> Result<Arc<dyn ReplicaHandle>> {
        let mut current = self.current.lock().expect("current-replica lock poisoned");
        let needs_new = match current.as_ref() {
            None => true,
            Some(replica) => replica.get_status() == Status::Offline,
        };
        if needs_new {
            let chosen = self.choose_replica()?;
            *current = Some(chosen.clone());
            Ok(chosen)
        } else {
            Ok(current.clone().expect("just checked Some"))
        }
    }

    /// `_chooseReplica` (`spec.md` §4.4): prefer an active replica chosen
    /// uniformly at random; if none are active, fall back to an overloaded
    /// one; fail only when every known replica is offline.
    fn choose_replica(&self) -> Result<Arc<dyn ReplicaHandle>> {
        let candidates = self.directory.list(&names::replica_prefix());
        let mut active = Vec::new();
        let mut overloaded = Vec::new();
        for (_, replica) in candidates {
            match replica.get_status() {
                Status::Active => active.push(replica),
                Status::Overloaded => overloaded.push(replica),
                Status::Offline => {}
            }
        }

        let pool = if !active.is_empty() { active } else { overloaded };
        if pool.is_empty() {
            return NoReplicasSnafu.fail();
        }
        let index = rand::thread_rng().gen_range(0..pool.len());
        Ok(pool[index].clone())
    }

    pub fn replica_count(&self) -> usize {
        self.n
    }
}

fn snap_rating(request: Request) -> Request {
    if request.opcode != ADD_RATING_OPCODE {
        return request;
    }
    let Some(rating) = request.params.get(RATING_PARAM_INDEX).and_then(ParamValue::as_f64) else {
        return request;
    };

    let snapped = (rating * 2.0).round() / 2.0;
    let mut params = request.params;
    params[RATING_PARAM_INDEX] = ParamValue::Float(snapped);
    Request { opcode: request.opcode, params }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_domain::{Handlers, Store};
    use ripple_replication::{Config, ReplicaManager, Stopper};
    use ripple_core::ReplicaId;

    fn harness(n: usize) -> (FrontEnd, Vec<Arc<ReplicaManager>>, Vec<tempfile::TempDir>) {
        let directory = Arc::new(Directory::new());
        let mut replicas = Vec::new();
        let mut dirs = Vec::new();
        for i in 0..n {
            let tmp = tempfile::tempdir().unwrap();
            std::fs::write(
                tmp.path().join("movies.csv"),
                "movieId,title,genres\n1,Toy Story (1995),Animation|Comedy\n",
            )
            .unwrap();
            let store = Store::open(tmp.path()).unwrap();
            let rm = Arc::new(ReplicaManager::new(
                ReplicaId::new(i),
                store,
                Handlers::movie_ratings(),
                Config {
                    n,
                    ..Config::default()
                },
                Status::Active,
                false,
                directory.clone(),
                Stopper::new(),
            ));
            directory.register(names::replica(ReplicaId::new(i)), rm.clone() as Arc<dyn ReplicaHandle>);
            replicas.push(rm);
            dirs.push(tmp);
        }
        (FrontEnd::new(n, directory), replicas, dirs)
    }

    #[test]
    fn s6_rating_snap_rounds_to_nearest_half_star() {
        let (fe, _replicas, _dirs) = harness(1);
        let request = Request::new("u.add_rating", vec![7i64.into(), "toy story".into(), 3.7.into()]);
        let response = fe.send_request(request).unwrap();
        assert_eq!(response, Response::Ack);

        let value = fe
            .send_request(Request::new("q.get_avg_rating", vec!["toy story".into()]))
            .unwrap();
        assert_eq!(value, Response::Value(DomainValue::Float(3.5)));
    }

    #[test]
    fn non_rating_updates_pass_through_unchanged() {
        let (fe, _replicas, _dirs) = harness(1);
        let request = Request::new("u.add_tag", vec![7i64.into(), "toy story".into(), "classic".into()]);
        assert_eq!(fe.send_request(request).unwrap(), Response::Ack);
    }

    #[test]
    fn update_and_query_merge_the_front_end_timestamp() {
        let (fe, _replicas, _dirs) = harness(1);
        assert_eq!(fe.ts().value(), &[0]);
        fe.send_request(Request::new(
            "u.add_rating",
            vec![7i64.into(), "toy story".into(), 4.0.into()],
        ))
        .unwrap();
        assert_eq!(fe.ts().value(), &[1]);
    }

    #[test]
    fn all_replicas_offline_fails_with_no_replicas() {
        let (fe, replicas, _dirs) = harness(2);
        for replica in &replicas {
            replica.set_status(Status::Offline);
        }
        let error = fe
            .send_request(Request::new("q.get_avg_rating", vec!["toy story".into()]))
            .unwrap_err();
        assert!(matches!(error, FrontEndError::NoReplicas));
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let (fe, _replicas, _dirs) = harness(1);
        let error = fe.send_request(Request::new("bogus", vec![])).unwrap_err();
        assert!(matches!(error, FrontEndError::BadRequest { .. }));
    }
}
