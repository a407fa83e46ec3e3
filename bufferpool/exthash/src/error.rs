//! Error types for hash table operations.

use std::fmt;

/// Errors that can occur during hash table operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// More keys share a single indexable hash prefix than one bucket
    /// can hold, so no number of splits can make room. Splits performed
    /// before the condition was detected are kept; every table
    /// invariant still holds and no entry is lost.
    CapacityExceeded,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded => {
                write!(f, "bucket capacity exceeded by colliding hash prefixes")
            }
        }
    }
}

impl std::error::Error for TableError {}

/// Result type for hash table operations.
pub type TableResult<T> = Result<T, TableError>;
