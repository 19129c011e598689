//! Error taxonomy for escrow operations
//!
//! Validation errors are detected before any mutation and carry no side
//! effects; `Ledger` and `Conflict` are the only kinds where a retry can
//! make sense, and callers must be able to tell them apart from "your
//! request was invalid".

use crate::types::ContractStatus;
use fairlance_ledger_trait::LedgerError;
use thiserror::Error;

/// Result type for escrow operations
pub type EscrowResult<T> = Result<T, EscrowError>;

/// Main error type for escrow operations
#[derive(Error, Debug)]
pub enum EscrowError {
    /// No valid caller identity
    #[error("Unauthenticated: {message}")]
    Unauthenticated { message: String },

    /// Caller known but not authorized for this operation on this contract
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// Malformed input
    #[error("Invalid {parameter}: {message}")]
    InvalidArgument { parameter: String, message: String },

    /// Operation not legal given current lifecycle state
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// Requested status transition is not an edge of the lifecycle machine
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: ContractStatus,
        to: ContractStatus,
    },

    /// Resource not found
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// Concurrent modification detected by the optimistic version check
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// External ledger call failed; the store was not modified
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Durable store failure
    #[error("Store error: {message}")]
    Store { message: String },

    /// A stored record failed validation at the store boundary
    #[error("Invalid stored record: {message}")]
    InvalidRecord { message: String },
}

impl EscrowError {
    /// Create an unauthenticated error
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create an invalid record error
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// True when retrying the same call unchanged could plausibly succeed.
    ///
    /// Validation failures are never retryable; an external-system failure
    /// or a concurrent-modification conflict may be, unless the user
    /// themselves declined the ledger transaction.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::Ledger(e) => !e.is_user_rejection(),
            Self::Store { .. } => true,
            _ => false,
        }
    }
}

impl From<sea_orm::DbErr> for EscrowError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Store {
            message: err.to_string(),
        }
    }
}
