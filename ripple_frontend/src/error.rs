//! The front end's slice of the error taxonomy (`spec.md` §7).

use ripple_core::CoreError;
use ripple_replication::ReplicationError;
use snafu::prelude::*;

pub type Result<T, E = FrontEndError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FrontEndError {
    #[snafu(display("{source}"))]
    BadRequest { source: CoreError },

    #[snafu(display("system unavailable, retry later"))]
    NoReplicas,

    #[snafu(display("{source}"))]
    Replica { source: ReplicationError },
}

impl From<CoreError> for FrontEndError {
    fn from(source: CoreError) -> Self {
        Self::BadRequest { source }
    }
}

impl From<ReplicationError> for FrontEndError {
    fn from(source: ReplicationError) -> Self {
        match source {
            ReplicationError::NoReplicas => Self::NoReplicas,
            other => Self::Replica { source: other },
        }
    }
}
