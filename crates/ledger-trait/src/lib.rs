//! Ledger Bridge - Core abstraction for external escrow ledgers
//!
//! This crate defines the `LedgerBridge` trait which provides a unified
//! interface for external append-only ledgers that mirror marketplace
//! contracts and hold the escrowed value (EVM chains today, other layers
//! later).
//!
//! The ledger is an *optional secondary* record: the durable store remains
//! the system of record for contracts and deliverables, and callers decide
//! per operation whether a ledger failure aborts the operation or is merely
//! logged.

use async_trait::async_trait;

pub mod error;
pub mod layer;
pub mod types;

pub use error::{LedgerError, LedgerResult};
pub use layer::LedgerLayer;
pub use types::{LedgerContractStatus, RegisteredContract, TxReceipt};

/// Main trait that all ledger layers must implement.
///
/// Every call crosses a network boundary and may fail; implementations must
/// map failures into [`LedgerError`] so callers can distinguish a user
/// cancelling a wallet prompt from an infrastructure failure or a timeout.
#[async_trait]
pub trait LedgerBridge: Send + Sync {
    /// Get the type of this ledger layer
    fn ledger_layer(&self) -> LedgerLayer;

    /// Get the chain/network ID
    fn chain_id(&self) -> String;

    /// Register a new escrow contract on the ledger, locking `locked_value`
    /// (in minor units of the chain's native asset) for the freelancer at
    /// `freelancer_address`.
    ///
    /// Returns the ledger-side contract identity and the submission
    /// transaction hash.
    async fn register_contract(
        &self,
        freelancer_address: &str,
        locked_value: u64,
        terms_ref: &str,
    ) -> LedgerResult<RegisteredContract>;

    /// Mirror a lifecycle status change for a previously registered contract.
    async fn update_status(
        &self,
        ledger_contract_id: &str,
        status: LedgerContractStatus,
    ) -> LedgerResult<TxReceipt>;

    /// Attach a deliverable reference (URI or content hash) to a registered
    /// contract. Advisory data only; the durable store owns the deliverable.
    async fn add_deliverable_ref(
        &self,
        ledger_contract_id: &str,
        reference: &str,
    ) -> LedgerResult<TxReceipt>;

    /// Release the locked value to the freelancer address registered at
    /// contract creation. Only valid for completed contracts; the ledger
    /// contract itself enforces this on-chain.
    async fn release(&self, ledger_contract_id: &str) -> LedgerResult<TxReceipt>;
}
