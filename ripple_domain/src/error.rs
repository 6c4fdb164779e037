//! The *DomainError* branch of the error taxonomy (`spec.md` §7): failures
//! raised by a handler, never by the engine itself.

use snafu::prelude::*;
use std::path::PathBuf;

pub type Result<T, E = DomainError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DomainError {
    #[snafu(display("no movie found for title `{title}`"))]
    NoMovieForTitle { title: String },

    #[snafu(display("no movie found for id {movie_id}"))]
    NoMovieForId { movie_id: i64 },

    #[snafu(display("no ratings recorded for `{title}`"))]
    NoRatings { title: String },

    #[snafu(display("unrecognised opcode `{opcode}`"))]
    UnknownOperation { opcode: String },

    #[snafu(display("operation `{opcode}` expected parameter {index} to be {expected}"))]
    BadParam {
        opcode: String,
        index: usize,
        expected: &'static str,
    },

    #[snafu(display("required domain data file missing: {path}"))]
    MissingDataFile { path: PathBuf },

    #[snafu(display("I/O error on {path}: {source}"))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("CSV error on {path}: {source}"))]
    Csv { path: PathBuf, source: csv::Error },
}
