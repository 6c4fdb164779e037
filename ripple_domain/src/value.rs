//! The result shape a query handler produces. Update handlers return `()`
//! (`spec.md` §4.2); queries return one of these, which the front end/CLI
//! renders however it likes.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DomainValue {
    Float(f64),
    Text(String),
    List(Vec<DomainValue>),
    Record(Vec<(String, DomainValue)>),
    Unit,
}

impl DomainValue {
    pub fn record(fields: impl IntoIterator<Item = (&'static str, DomainValue)>) -> Self {
        Self::Record(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}

impl From<f64> for DomainValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for DomainValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for DomainValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl<T: Into<DomainValue>> From<Vec<T>> for DomainValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}
