//! Load-time error types.
//!
//! Check-time findings are not errors; they are [`Issue`](crate::Issue)
//! records. Only failures that prevent the snapshot from being loaded at all
//! surface through this module.

use std::io;
use thiserror::Error;

/// Convenience alias for fallible loader operations.
pub type Result<T> = std::result::Result<T, DbCheckError>;

/// A failure that aborts the run before any checking happens.
#[derive(Debug, Error)]
pub enum DbCheckError {
    /// The snapshot file could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The document is not a parseable database export.
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}
