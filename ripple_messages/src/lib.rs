//! Request types exchanged across the replica/front-end RPC boundary
//! (`spec.md` §4.4, §4.3).
//!
//! Everything here stays in-process: `ripple_replication::ReplicaHandle` is
//! called directly, never serialized, so these are plain `serde`-derived
//! types rather than a wire codec.

use ripple_core::error::CoreError;
use ripple_core::{OpCode, OpKind, Result};
use serde::{Deserialize, Serialize};

/// A single parameter value passed to a domain operation. The domain layer
/// never sees anything more exotic than these three shapes (`spec.md` §6's
/// tabular columns are all integers, floats or text).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// A request as submitted by a client: an opcode plus its positional
/// parameters. This is `request` in `spec.md` §4.4 and `u_op`/`q_op` in
/// §4.3.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub opcode: String,
    pub params: Vec<ParamValue>,
}

impl Request {
    pub fn new(opcode: impl Into<String>, params: Vec<ParamValue>) -> Self {
        Self {
            opcode: opcode.into(),
            params,
        }
    }

    /// Classifies the opcode as update or query, failing with
    /// [`CoreError::BadRequest`] for anything else (`spec.md` §4.4 step 1).
    pub fn kind(&self) -> Result<OpKind, CoreError> {
        OpCode::parse(&self.opcode).map(|op| op.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_kind_classifies_opcode() {
        let update = Request::new("u.add_rating", vec![]);
        assert_eq!(update.kind().unwrap(), OpKind::Update);
        let query = Request::new("q.get_avg_rating", vec![]);
        assert_eq!(query.kind().unwrap(), OpKind::Query);
        let bad = Request::new("bogus", vec![]);
        assert!(bad.kind().is_err());
    }
}
