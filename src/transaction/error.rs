//! Transaction error types.

use thiserror::Error;

use crate::transaction::resource::ResourceError;

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;

/// Errors that can occur during transaction operations.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Operation not allowed in the coordinator's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Unrecognized or unsupported argument (e.g. an isolation level).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation requires an active transaction but none is open.
    #[error("no active transaction")]
    NoActiveTransaction,

    /// Commit attempted on a transaction marked rollback-only.
    #[error("transaction is marked rollback-only and cannot be committed")]
    RollbackOnly,

    /// The resource failed to start a physical transaction.
    #[error("begin failed: {0}")]
    BeginFailed(#[source] ResourceError),

    /// The resource failed to commit the physical transaction.
    #[error("commit failed: {0}")]
    CommitFailed(#[source] ResourceError),

    /// The resource failed to roll back the physical transaction.
    #[error("rollback failed: {0}")]
    RollbackFailed(#[source] ResourceError),

    /// Any other resource failure.
    #[error("resource error: {0}")]
    Resource(#[from] ResourceError),
}

impl TransactionError {
    /// Check if this error is retryable.
    ///
    /// State is left untouched by these failures, so the caller may retry
    /// the same call or roll back.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransactionError::BeginFailed(_) | TransactionError::CommitFailed(_)
        )
    }

    /// Check if this error reports a misuse of the coordinator API.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            TransactionError::InvalidState(_)
                | TransactionError::InvalidArgument(_)
                | TransactionError::NoActiveTransaction
                | TransactionError::RollbackOnly
        )
    }
}
