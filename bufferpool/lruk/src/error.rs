//! Error types for replacer operations.

use std::fmt;

/// Errors that can occur during replacer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacerError {
    /// The frame is tracked but currently pinned (not evictable).
    /// Removal is refused and the frame's state is left untouched.
    NotEvictable,
}

impl fmt::Display for ReplacerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEvictable => write!(f, "frame is not evictable"),
        }
    }
}

impl std::error::Error for ReplacerError {}

/// Result type for replacer operations.
pub type ReplacerResult<T> = Result<T, ReplacerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", ReplacerError::NotEvictable),
            "frame is not evictable"
        );
    }

    #[test]
    fn test_error_is_error_trait() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<ReplacerError>();
    }
}
