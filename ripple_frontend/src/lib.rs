//! The front end: the client-facing causal session proxy (`spec.md` §4.4).

pub mod error;
pub mod front_end;

pub use error::{FrontEndError, Result};
pub use front_end::{FrontEnd, Response};
