//! Error types shared by the vector clock and identifier registries. Errors
//! specific to the domain store, the replication engine, and the front end
//! live in their own crates and wrap [`CoreError`] where they cross into it.

use snafu::prelude::*;

pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CoreError {
    #[snafu(display("vector clock length mismatch: expected {expected}, got {actual}"))]
    ShapeMismatch { expected: usize, actual: usize },

    #[snafu(display("index {index} is out of range for a vector clock of length {len}"))]
    IndexOutOfRange { index: usize, len: usize },

    #[snafu(display("unrecognised opcode `{opcode}`: must start with `u.` or `q.`"))]
    BadRequest { opcode: String },
}
