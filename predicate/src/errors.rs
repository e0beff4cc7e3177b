//! Predicate errors

use thiserror::Error;

/// Errors decoding predicate data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PredicateError {
    #[error("predicate data must be {expected} bytes, got {found}")]
    InvalidLength { expected: usize, found: usize },

    #[error("predicate field {0} is out of range")]
    OutOfRange(&'static str),
}
