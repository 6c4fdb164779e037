//! Core value types shared by every `ripple` crate: the happened-before
//! vector clock, dotted identifiers (replica and opcode names), and the
//! error taxonomy that every RPC boundary in the system surfaces.

pub mod error;
pub mod happened_before;
pub mod identifier;
pub mod ids;
pub mod opcode;
pub mod vector_clock;

pub use error::{CoreError, Result};
pub use happened_before::{HappenedBeforeOrd, HappenedBeforeOrdering};
pub use identifier::{Identifier, IdentifierSegment, TrieMap, TrieSet};
pub use ids::{ReplicaId, UpdateId};
pub use opcode::{OpCode, OpKind};
pub use vector_clock::VectorClock;
