//! Operation codes. Every operation is a dotted string whose first segment
//! classifies it as an update (`u.*`) or a query (`q.*`); the engine never
//! looks past that classification (`spec.md` §4.2).

use crate::error::{BadRequestSnafu, CoreError};
use crate::identifier::Identifier;
use crate::Result;
use snafu::prelude::*;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    Update,
    Query,
}

/// A classified opcode, e.g. `u.add_rating` or `q.search_title`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OpCode {
    id: Identifier,
    kind: OpKind,
}

impl OpCode {
    /// Parses and classifies a dotted opcode string.
    ///
    /// # Errors
    /// Returns [`CoreError::BadRequest`] if the first segment is neither
    /// `u` nor `q`.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let id = Identifier::parse(s);
        let kind = match id.first_segment() {
            Some("u") => OpKind::Update,
            Some("q") => OpKind::Query,
            _ => {
                return BadRequestSnafu {
                    opcode: s.to_string(),
                }
                .fail()
            }
        };
        Ok(Self { id, kind })
    }

    pub fn kind(&self) -> OpKind {
        self.kind
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
