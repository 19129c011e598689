//! Error types for the Ethereum ledger layer

use fairlance_ledger_trait::LedgerError;
use thiserror::Error;

/// Result type alias for Ethereum ledger operations
pub type Result<T> = std::result::Result<T, EthereumLedgerError>;

/// Errors that can occur in the Ethereum ledger layer
#[derive(Debug, Error)]
pub enum EthereumLedgerError {
    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Contract call (read operation) failed
    #[error("Contract call failed: {0}")]
    ContractCall(String),

    /// Transaction (write operation) failed
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// RPC connection or network error
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Gas price exceeds configured maximum
    #[error("Gas price too high: current {current} gwei exceeds max {max} gwei")]
    GasPriceTooHigh { current: f64, max: f64 },

    /// No private key configured for a write operation
    #[error("No private key configured - cannot sign transactions")]
    NoPrivateKey,

    /// Invalid Ethereum address format
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Wallet or signer error
    #[error("Wallet error: {0}")]
    WalletError(String),

    /// Provider construction error
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Event log parsing error
    #[error("Event parsing error: {0}")]
    EventParsing(String),

    /// Operation timed out
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),
}

/// True when a provider error message indicates the user declined to sign
/// in their wallet (EIP-1193 code 4001 and the common message spellings).
pub(crate) fn is_user_rejection_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("4001")
        || lower.contains("user rejected")
        || lower.contains("user denied")
        || lower.contains("rejected by user")
}

impl From<EthereumLedgerError> for LedgerError {
    fn from(err: EthereumLedgerError) -> Self {
        match err {
            EthereumLedgerError::Configuration(msg)
            | EthereumLedgerError::InvalidAddress(msg)
            | EthereumLedgerError::WalletError(msg) => LedgerError::configuration(msg),
            EthereumLedgerError::NoPrivateKey => {
                LedgerError::configuration("no private key configured")
            }
            EthereumLedgerError::Rpc(msg) | EthereumLedgerError::ProviderError(msg) => {
                LedgerError::connection(msg)
            }
            EthereumLedgerError::Timeout(seconds) => LedgerError::Timeout { seconds },
            EthereumLedgerError::Transaction(msg) | EthereumLedgerError::ContractCall(msg) => {
                if is_user_rejection_message(&msg) {
                    LedgerError::user_rejected(msg)
                } else {
                    LedgerError::transaction(msg, None)
                }
            }
            EthereumLedgerError::GasPriceTooHigh { current, max } => {
                LedgerError::transaction(
                    format!("gas price {current} gwei exceeds configured max {max} gwei"),
                    None,
                )
            }
            EthereumLedgerError::EventParsing(msg) => LedgerError::transaction(msg, None),
        }
    }
}
