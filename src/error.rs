//! Error types for this crate.
use std::path::PathBuf;

use thiserror::Error;

/// Any kind of error that can happen when parsing a field of a source row.
/// Always recoverable: the offending row is skipped and its siblings continue.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Error)]
pub enum ParseError {
    #[error("'{0}' is not a numeric amount")]
    BadAmount(String),
    #[error("'{0}' is not a calendar date")]
    BadDate(String),
}

/// Failures raised by the store and the loaders. `RowInsert` and `RowParse`
/// are caught per row by the loaders; the other variants abort the run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot open sales store: {0}")]
    Connection(#[source] rusqlite::Error),
    #[error("store query failed: {0}")]
    Query(#[source] rusqlite::Error),
    #[error("row rejected by store: {0}")]
    RowInsert(#[source] rusqlite::Error),
    #[error("row failed to parse: {0}")]
    RowParse(#[source] csv::Error),
    #[error("cannot read {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
