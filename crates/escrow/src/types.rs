//! Domain types for contracts, deliverables and parties
//!
//! Records crossing the store boundary are explicitly typed; status values
//! are parsed at that boundary and unknown values rejected rather than
//! carried around as strings.

use chrono::{DateTime, Utc};
use fairlance_ledger_trait::LedgerContractStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Contract lifecycle status (maps to SQL ENUM)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStatus {
    /// Created, not yet submitted to the freelancer
    Draft,
    /// Awaiting freelancer acceptance
    Pending,
    /// Accepted, work in progress
    Active,
    /// Work marked done by the freelancer
    Completed,
    /// Cancelled by either party
    Cancelled,
    /// Ledger registration failed during creation; terminal, with the
    /// failure reason in `error_message`. Never entered through the
    /// transition table.
    Failed,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(Self::Draft),
            "PENDING" => Some(Self::Pending),
            "ACTIVE" => Some(Self::Active),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// The ledger-side representation of this status, for statuses that
    /// exist on-chain. `Draft` and `Failed` have no ledger counterpart.
    pub fn ledger_status(&self) -> Option<LedgerContractStatus> {
        match self {
            Self::Pending => Some(LedgerContractStatus::Pending),
            Self::Active => Some(LedgerContractStatus::Active),
            Self::Completed => Some(LedgerContractStatus::Completed),
            Self::Cancelled => Some(LedgerContractStatus::Cancelled),
            Self::Draft | Self::Failed => None,
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deliverable status; `Approved` and `Rejected` are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliverableStatus {
    Pending,
    Approved,
    Rejected,
}

impl DeliverableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for DeliverableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role of a party in the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartyRole {
    Investor,
    Freelancer,
}

impl PartyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Investor => "investor",
            Self::Freelancer => "freelancer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "investor" => Some(Self::Investor),
            "freelancer" => Some(Self::Freelancer),
            _ => None,
        }
    }
}

impl fmt::Display for PartyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Authenticated caller identity, threaded explicitly into every service
/// call. Produced by [`crate::auth::verify_jwt`]; never read ambiently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Stable party id from the identity provider
    pub id: String,
    /// Role tag from the identity provider
    pub role: PartyRole,
}

/// Linkage between a stored contract and its on-ledger counterpart.
///
/// Modeled as a single optional unit so a contract is either fully
/// on-ledger or fully off-ledger; partial linkage is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLinkage {
    /// Ledger-side contract identity
    pub ledger_contract_id: String,
    /// Address of the escrow contract holding the locked value
    pub ledger_address: String,
    /// Hash of the registration transaction
    pub transaction_hash: String,
}

/// A marketplace contract between an investor and a freelancer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    pub id: Uuid,
    pub investor_id: String,
    pub freelancer_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Escrowed amount in minor units; never negative
    pub value: i64,
    /// Opaque terms text or URI
    pub terms: Option<String>,
    pub status: ContractStatus,
    pub linkage: Option<LedgerLinkage>,
    /// Set only on a completed contract, when the investor confirms the
    /// deliverables and authorizes release of the escrowed value
    pub verified: bool,
    /// Failure reason for `Failed` contracts
    pub error_message: Option<String>,
    /// Optimistic concurrency token; bumped on every committed mutation
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A deliverable attached to an active contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deliverable {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub file_url: Option<String>,
    pub status: DeliverableStatus,
    /// Best-effort ledger reference; may lag or be absent
    pub ledger_uri: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Typed join result for party profile lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyProfileSummary {
    pub id: String,
    pub display_name: String,
    pub role: PartyRole,
    pub ledger_address: Option<String>,
}

/// Contract together with both party profiles, when known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDetail {
    pub contract: Contract,
    pub investor: Option<PartyProfileSummary>,
    pub freelancer: Option<PartyProfileSummary>,
}

/// Input for contract creation
#[derive(Debug, Clone)]
pub struct NewContract {
    pub investor_id: String,
    pub freelancer_id: String,
    pub title: String,
    pub description: Option<String>,
    pub value: i64,
    pub terms: Option<String>,
    /// Register the contract on the ledger during creation
    pub on_ledger: bool,
    /// Freelancer's ledger address; required when `on_ledger` is set
    pub freelancer_ledger_address: Option<String>,
}

/// Input for deliverable creation
#[derive(Debug, Clone)]
pub struct NewDeliverable {
    pub title: String,
    pub description: Option<String>,
    pub file_url: Option<String>,
}
