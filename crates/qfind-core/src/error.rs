//! Error types for qfind.
//!
//! One variant per engine error kind (spec §7). Every fallible engine
//! operation returns this type; there is no exception-like unwinding.

use thiserror::Error;

/// qfind error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Any allocation failure. Fatal for the current operation; the engine
    /// remains usable afterward.
    #[error("out of memory")]
    OutOfMemory,

    /// Null/empty/oversized arguments (e.g. an empty query, a path longer
    /// than `PATH_MAX`).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A submission ring or update batch is full; the caller may retry.
    #[error("busy, retry later: {0}")]
    Busy(String),

    /// Delete of a path that is not present in the index.
    #[error("not found: {0}")]
    NotFound(String),

    /// A posting list failed to decode. The affected trigram is skipped and
    /// the query continues with reduced recall; the caller logs this at
    /// ERROR severity.
    #[error("corruption decoding posting list: {0}")]
    Corruption(String),

    /// Upstream walker/notifier/config I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for qfind operations.
pub type Result<T> = std::result::Result<T, Error>;
