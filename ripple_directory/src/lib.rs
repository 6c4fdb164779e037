//! `ripple_directory`: the naming/discovery service (`spec.md` §6).
//!
//! A directory maps logical names (`network.replica.<i>`, `network.frontend`)
//! to peer endpoints, with exact lookup and prefix listing. The reference
//! deployment has a fixed, static replica set, so this is a concurrent
//! in-memory address book rather than the mDNS/zeroconf peer-announcement
//! service the teacher crate built for dynamic membership — `spec.md`
//! treats naming/discovery as an external, synchronous lookup and the
//! replica set size `N` never changes at runtime.

use ripple_core::identifier::{Identifier, TrieMap};
use snafu::prelude::*;
use std::sync::RwLock;

pub type Result<T, E = DirectoryError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DirectoryError {
    #[snafu(display("no entry registered for `{name}`"))]
    NotFound { name: Identifier },
}

/// Resolves logical names to peer endpoints. Production code is backed by
/// [`Directory`]; tests substitute whatever `Endpoint` they need (an
/// in-memory `ReplicaManager` handle, a mock, ...).
pub trait NameResolver {
    type Endpoint: Clone;

    fn lookup(&self, name: &Identifier) -> Result<Self::Endpoint>;

    /// All `(name, endpoint)` pairs whose name starts with `prefix`.
    fn list(&self, prefix: &Identifier) -> Vec<(Identifier, Self::Endpoint)>;
}

/// A concurrent, in-memory address book.
pub struct Directory<E> {
    entries: RwLock<TrieMap<E>>,
}

impl<E> Directory<E> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(TrieMap::new()),
        }
    }

    /// Registers (or replaces) an endpoint under `name`.
    pub fn register(&self, name: Identifier, endpoint: E) {
        log::debug!("directory: registering {name}");
        self.entries
            .write()
            .expect("directory lock poisoned")
            .insert(name, endpoint);
    }

    pub fn deregister(&self, name: &Identifier) -> Option<E> {
        log::debug!("directory: deregistering {name}");
        self.entries.write().expect("directory lock poisoned").remove(name)
    }
}

impl<E> Default for Directory<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> NameResolver for Directory<E> {
    type Endpoint = E;

    fn lookup(&self, name: &Identifier) -> Result<E> {
        self.entries
            .read()
            .expect("directory lock poisoned")
            .get(name)
            .cloned()
            .context(NotFoundSnafu { name: name.clone() })
    }

    fn list(&self, prefix: &Identifier) -> Vec<(Identifier, E)> {
        self.entries
            .read()
            .expect("directory lock poisoned")
            .list_prefix(prefix)
            .into_iter()
            .map(|(name, endpoint)| (name, endpoint.clone()))
            .collect()
    }
}

/// Well-known names, matching `spec.md` §6's naming scheme exactly.
pub mod names {
    use ripple_core::identifier::Identifier;
    use ripple_core::ReplicaId;

    pub fn replica(id: ReplicaId) -> Identifier {
        Identifier::from_array([
            "network".to_string(),
            "replica".to_string(),
            id.get().to_string(),
        ])
    }

    pub fn replica_prefix() -> Identifier {
        Identifier::from_array(["network", "replica"])
    }

    pub fn frontend() -> Identifier {
        Identifier::from_array(["network", "frontend"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_core::ReplicaId;

    #[test]
    fn lookup_exact_and_missing() {
        let dir: Directory<u32> = Directory::new();
        dir.register(names::replica(ReplicaId::new(0)), 100);
        assert_eq!(dir.lookup(&names::replica(ReplicaId::new(0))).unwrap(), 100);
        assert!(dir.lookup(&names::replica(ReplicaId::new(9))).is_err());
    }

    #[test]
    fn list_by_prefix_excludes_frontend() {
        let dir: Directory<u32> = Directory::new();
        dir.register(names::replica(ReplicaId::new(0)), 0);
        dir.register(names::replica(ReplicaId::new(1)), 1);
        dir.register(names::replica(ReplicaId::new(2)), 2);
        dir.register(names::frontend(), 99);

        let replicas = dir.list(&names::replica_prefix());
        assert_eq!(replicas.len(), 3);
        assert!(dir.lookup(&names::frontend()).is_ok());
    }

    #[test]
    fn deregister_removes_entry() {
        let dir: Directory<u32> = Directory::new();
        let name = names::replica(ReplicaId::new(0));
        dir.register(name.clone(), 42);
        assert_eq!(dir.deregister(&name), Some(42));
        assert!(dir.lookup(&name).is_err());
    }
}
