//! Small identifier newtypes used throughout the engine.

use std::fmt;
use uuid::Uuid;

/// A replica's position in the fixed `0..N` replica set. Used directly as a
/// [`crate::vector_clock::VectorClock`] index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplicaId(usize);

impl ReplicaId {
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A globally-unique id assigned to each update by the front end that
/// submits it. Used by replicas to detect and ignore duplicate delivery
/// (direct resubmission or redundant gossip).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UpdateId(String);

impl UpdateId {
    /// A fresh, process-wide unique id (UUIDv4), matching the front end's
    /// `str(uuid.uuid4())` in the reference implementation.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UpdateId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UpdateId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for UpdateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        let a = UpdateId::generate();
        let b = UpdateId::generate();
        assert_ne!(a, b);
    }
}
