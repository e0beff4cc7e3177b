//! Error types for proof generation and verification

use thiserror::Error;

/// Errors that can occur while proving or handling circuit artifacts.
///
/// Messages never carry secret values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZkError {
    #[error("secret parameters do not hash to the declared commitment")]
    CommitmentMismatch,

    #[error("offered price is below the hidden minimum price")]
    PriceConstraintViolated,

    #[error("offered amount is below the hidden minimum amount")]
    AmountConstraintViolated,

    #[error("Proof generation failed: {0}")]
    ProofGenerationFailed(String),

    #[error("Proof generation cancelled")]
    Cancelled,

    #[error("Setup error: {0}")]
    SetupError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Circuit artifact mismatch: expected {expected}, found {found}")]
    ArtifactMismatch { expected: String, found: String },

    #[error("Invalid public input: {0}")]
    InvalidPublicInput(String),
}

impl ZkError {
    /// Constraint and mismatch errors cannot succeed with the same inputs
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ZkError::CommitmentMismatch
                | ZkError::PriceConstraintViolated
                | ZkError::AmountConstraintViolated
                | ZkError::InvalidPublicInput(_)
        )
    }
}

impl From<std::io::Error> for ZkError {
    fn from(err: std::io::Error) -> Self {
        ZkError::SerializationError(err.to_string())
    }
}

impl From<ark_serialize::SerializationError> for ZkError {
    fn from(err: ark_serialize::SerializationError) -> Self {
        ZkError::SerializationError(err.to_string())
    }
}
