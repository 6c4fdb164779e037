//! The replication-engine slice of the error taxonomy (`spec.md` §7).
//! *DuplicateUpdate* is deliberately absent: it is a benign sentinel
//! (`Ok(None)`), not an error.

use ripple_core::CoreError;
use ripple_domain::DomainError;
use snafu::prelude::*;

pub type Result<T, E = ReplicationError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ReplicationError {
    #[snafu(display("{source}"))]
    Core { source: CoreError },

    #[snafu(display("{source}"))]
    Domain { source: DomainError },

    #[snafu(display("no acceptable replica available"))]
    NoReplicas,

    #[snafu(display("peer {peer} unavailable"))]
    PeerUnavailable { peer: String },

    #[snafu(display("operation cancelled by shutdown"))]
    Cancelled,
}

impl From<CoreError> for ReplicationError {
    fn from(source: CoreError) -> Self {
        Self::Core { source }
    }
}

impl From<DomainError> for ReplicationError {
    fn from(source: DomainError) -> Self {
        Self::Domain { source }
    }
}
