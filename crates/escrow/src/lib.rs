//! Contract lifecycle and escrow state machine for the marketplace
//!
//! This crate provides:
//! - The contract lifecycle state machine with per-party authorization
//! - The deliverable sub-lifecycle gated by the parent contract
//! - A durable-store boundary with optimistic concurrency (SeaORM and
//!   in-memory implementations)
//! - Reconciliation with an optional external ledger via
//!   `fairlance-ledger-trait`
//! - JWT Ed25519 identity verification
//!
//! Can be embedded by any caller-facing layer; it has no wire protocol of
//! its own.

pub mod auth;
pub mod database;
pub mod entity;
pub mod error;
pub mod memory;
pub mod service;
pub mod store;
pub mod transitions;
pub mod types;

// Re-export commonly used types
pub use auth::{create_jwt, verify_jwt};
pub use database::{Database, SeaOrmStore};
pub use error::{EscrowError, EscrowResult};
pub use memory::InMemoryStore;
pub use service::EscrowService;
pub use store::{ContractChanges, ContractStore, DeliverableChanges};
pub use transitions::{check_transition, transition_rule, TransitionRule};
pub use types::{
    Caller, Contract, ContractDetail, ContractStatus, Deliverable, DeliverableStatus,
    LedgerLinkage, NewContract, NewDeliverable, PartyProfileSummary, PartyRole,
};
