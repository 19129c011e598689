//! Types shared by all ledger layers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status as represented on the ledger.
///
/// Only the post-registration states exist on-chain; a draft contract has
/// no ledger counterpart yet, so there is no `Draft` here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerContractStatus {
    /// Registered, awaiting freelancer acceptance
    Pending,
    /// Accepted, work in progress
    Active,
    /// Work marked done by the freelancer
    Completed,
    /// Cancelled by either party
    Cancelled,
}

impl LedgerContractStatus {
    /// Numeric encoding used by the on-chain status enum
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Active => 1,
            Self::Completed => 2,
            Self::Cancelled => 3,
        }
    }
}

impl fmt::Display for LedgerContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Active => write!(f, "Active"),
            Self::Completed => write!(f, "Completed"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Result of registering a contract on the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredContract {
    /// Ledger-side identity of the contract (format depends on the layer;
    /// a decimal uint256 for EVM layers)
    pub ledger_contract_id: String,

    /// Address of the escrow contract holding the locked value
    pub contract_address: String,

    /// Hash of the registration transaction
    pub tx_hash: String,
}

/// Receipt for a committed ledger write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction hash, 0x-prefixed
    pub tx_hash: String,

    /// Block the transaction was included in, when known
    pub block_number: Option<u64>,
}
