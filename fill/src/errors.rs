//! Fill errors and retry classification

use shade_predicate::RejectionReason;
use shade_zk::ZkError;
use thiserror::Error;

use crate::steps::StepId;

/// Errors during a fill attempt
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FillError {
    #[error("Proof error: {0}")]
    Proof(#[from] ZkError),

    #[error("Authorization refused: {message}")]
    AuthorizationRefused { message: String, retryable: bool },

    #[error("Authorization rejected: {0}")]
    Rejected(RejectionReason),

    #[error("Authorization expired; a new fill request is required")]
    AuthorizationExpired,

    #[error("Malformed authorization response: {0}")]
    MalformedResponse(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order expired")]
    OrderExpired,

    #[error("Secrets unavailable for order commitment")]
    SecretsUnavailable,

    #[error("Invalid fill request: {0}")]
    InvalidRequest(String),

    #[error("Token approval failed: {0}")]
    ApprovalFailed(String),

    #[error("Settlement reverted: {0}")]
    SettlementReverted(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timed out during {0} step")]
    Timeout(StepId),

    #[error("Fill cancelled")]
    Cancelled,

    #[error("State error: {0}")]
    InvalidState(String),

    #[error("Step {step} failed: {cause}")]
    StepFailed { step: StepId, cause: Box<FillError> },

    #[error("Retry refused at {step} step: {reason}")]
    RetryRefused { step: StepId, reason: String },
}

impl FillError {
    /// Whether re-entering the failed step can succeed with the same request.
    ///
    /// Mismatch, constraint, verification, binding and on-chain rejections
    /// are terminal and need a new fill request.
    pub fn is_retryable(&self) -> bool {
        match self {
            FillError::Proof(e) => !e.is_terminal() && *e != ZkError::Cancelled,
            FillError::AuthorizationRefused { retryable, .. } => *retryable,
            FillError::MalformedResponse(_)
            | FillError::ApprovalFailed(_)
            | FillError::Network(_)
            | FillError::Timeout(_) => true,
            FillError::StepFailed { cause, .. } => cause.is_retryable(),
            FillError::Rejected(_)
            | FillError::AuthorizationExpired
            | FillError::OrderNotFound(_)
            | FillError::OrderExpired
            | FillError::SecretsUnavailable
            | FillError::InvalidRequest(_)
            | FillError::SettlementReverted(_)
            | FillError::Cancelled
            | FillError::InvalidState(_)
            | FillError::RetryRefused { .. } => false,
        }
    }

    /// Innermost cause
    pub fn root_cause(&self) -> &FillError {
        match self {
            FillError::StepFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

/// Result type for fill operations
pub type FillResult<T> = Result<T, FillError>;
