//! Error types for ledger operations

use thiserror::Error;

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Main error type for ledger operations.
///
/// The variants deliberately separate "the acting user declined"
/// ([`LedgerError::UserRejected`]) from infrastructure failures, because
/// retry policy differs: a user rejection must never be retried unchanged,
/// while connection errors and timeouts may be.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The user declined to sign the transaction in their wallet
    #[error("Transaction rejected by user: {message}")]
    UserRejected { message: String },

    /// Network or RPC connection error
    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    /// Transaction submitted but failed or reverted
    #[error("Transaction failed: {message}")]
    TransactionError {
        message: String,
        tx_hash: Option<String>,
    },

    /// Timeout waiting for submission or confirmation
    #[error("Ledger operation timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Insufficient funds to lock the escrow value or pay for gas
    #[error("Insufficient funds: {message}")]
    InsufficientFunds { message: String },

    /// Ledger-side contract not found
    #[error("Ledger contract not found: {id}")]
    NotFound { id: String },

    /// Invalid configuration (bad address, bad key, bad RPC URL)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Wrapper for other error types
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LedgerError {
    /// Create a user rejection error
    pub fn user_rejected(message: impl Into<String>) -> Self {
        Self::UserRejected {
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    /// Create a transaction error
    pub fn transaction(message: impl Into<String>, tx_hash: Option<String>) -> Self {
        Self::TransactionError {
            message: message.into(),
            tx_hash,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True when this failure came from the acting user declining, as
    /// opposed to the infrastructure failing.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::UserRejected { .. })
    }

    /// True when retrying the same call unchanged could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionError { .. } | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_rejection_is_not_retryable() {
        let err = LedgerError::user_rejected("denied in wallet");
        assert!(err.is_user_rejection());
        assert!(!err.is_retryable());
    }

    #[test]
    fn timeout_is_retryable_infrastructure_failure() {
        let err = LedgerError::Timeout { seconds: 30 };
        assert!(!err.is_user_rejection());
        assert!(err.is_retryable());
        assert!(err.to_string().contains("30 seconds"));
    }

    #[test]
    fn transaction_error_carries_hash() {
        let err = LedgerError::transaction("reverted", Some("0xabc".to_string()));
        assert!(!err.is_retryable());
        match err {
            LedgerError::TransactionError { tx_hash, .. } => {
                assert_eq!(tx_hash.as_deref(), Some("0xabc"))
            }
            _ => panic!("wrong variant"),
        }
    }
}
