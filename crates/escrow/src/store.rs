//! Durable store boundary
//!
//! The store is the system of record for contracts and deliverables. All
//! mutations go through conditional updates keyed on the record's
//! `version`: an update presented with a stale version fails with
//! `Conflict` and changes nothing, so two racing read-modify-write cycles
//! can never silently discard each other's transition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::EscrowResult;
use crate::types::{
    Contract, ContractStatus, Deliverable, DeliverableStatus, LedgerLinkage, PartyProfileSummary,
};

/// Field changes for a conditional contract update.
///
/// Unset fields are left untouched. `linkage` is set-once by construction
/// of the calling code; the store does not overwrite an existing linkage.
#[derive(Debug, Clone, Default)]
pub struct ContractChanges {
    pub status: Option<ContractStatus>,
    pub linkage: Option<LedgerLinkage>,
    pub verified: Option<bool>,
    pub error_message: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ContractChanges {
    /// Apply the changes to a domain record, bumping the version token.
    /// Shared by every store implementation so conditional-update semantics
    /// stay identical across backends.
    pub fn apply(&self, contract: &mut Contract) {
        if let Some(status) = self.status {
            contract.status = status;
        }
        if let Some(linkage) = &self.linkage {
            contract.linkage = Some(linkage.clone());
        }
        if let Some(verified) = self.verified {
            contract.verified = verified;
        }
        if let Some(message) = &self.error_message {
            contract.error_message = Some(message.clone());
        }
        if let Some(completed_at) = self.completed_at {
            contract.completed_at = Some(completed_at);
        }
        contract.version += 1;
        contract.updated_at = Utc::now();
    }
}

/// Field changes for a conditional deliverable update
#[derive(Debug, Clone, Default)]
pub struct DeliverableChanges {
    pub status: Option<DeliverableStatus>,
    pub ledger_uri: Option<String>,
}

impl DeliverableChanges {
    pub fn apply(&self, deliverable: &mut Deliverable) {
        if let Some(status) = self.status {
            deliverable.status = status;
        }
        if let Some(uri) = &self.ledger_uri {
            deliverable.ledger_uri = Some(uri.clone());
        }
        deliverable.version += 1;
        deliverable.updated_at = Utc::now();
    }
}

/// Store operations the escrow service depends on.
///
/// All operations are atomic at the single-record level; no cross-record
/// transaction is assumed.
#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn insert_contract(&self, contract: Contract) -> EscrowResult<Contract>;

    async fn get_contract(&self, id: Uuid) -> EscrowResult<Option<Contract>>;

    /// Conditional update: fails with `Conflict` when the stored version
    /// does not match `expected_version`, leaving the record unchanged.
    async fn update_contract(
        &self,
        id: Uuid,
        expected_version: i64,
        changes: ContractChanges,
    ) -> EscrowResult<Contract>;

    async fn list_contracts_for_party(
        &self,
        party_id: &str,
        status: Option<ContractStatus>,
    ) -> EscrowResult<Vec<Contract>>;

    async fn insert_deliverable(&self, deliverable: Deliverable) -> EscrowResult<Deliverable>;

    async fn get_deliverable(&self, id: Uuid) -> EscrowResult<Option<Deliverable>>;

    /// Conditional update with the same version semantics as
    /// [`ContractStore::update_contract`].
    async fn update_deliverable(
        &self,
        id: Uuid,
        expected_version: i64,
        changes: DeliverableChanges,
    ) -> EscrowResult<Deliverable>;

    async fn list_deliverables(&self, contract_id: Uuid) -> EscrowResult<Vec<Deliverable>>;

    async fn get_party_profile(&self, party_id: &str)
        -> EscrowResult<Option<PartyProfileSummary>>;

    async fn upsert_party_profile(&self, profile: PartyProfileSummary) -> EscrowResult<()>;
}
