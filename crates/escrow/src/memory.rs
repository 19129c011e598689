//! In-memory store implementation
//!
//! Backs the integration tests and embedders that do not need a database.
//! Conditional-update semantics are identical to the SeaORM store.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{EscrowError, EscrowResult};
use crate::store::{ContractChanges, ContractStore, DeliverableChanges};
use crate::types::{Contract, ContractStatus, Deliverable, PartyProfileSummary};

/// In-memory `ContractStore`
#[derive(Default)]
pub struct InMemoryStore {
    contracts: RwLock<HashMap<Uuid, Contract>>,
    deliverables: RwLock<HashMap<Uuid, Deliverable>>,
    profiles: RwLock<HashMap<String, PartyProfileSummary>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContractStore for InMemoryStore {
    async fn insert_contract(&self, contract: Contract) -> EscrowResult<Contract> {
        let mut contracts = self.contracts.write().await;
        if contracts.contains_key(&contract.id) {
            return Err(EscrowError::store(format!(
                "duplicate contract id {}",
                contract.id
            )));
        }
        contracts.insert(contract.id, contract.clone());
        Ok(contract)
    }

    async fn get_contract(&self, id: Uuid) -> EscrowResult<Option<Contract>> {
        Ok(self.contracts.read().await.get(&id).cloned())
    }

    async fn update_contract(
        &self,
        id: Uuid,
        expected_version: i64,
        changes: ContractChanges,
    ) -> EscrowResult<Contract> {
        let mut contracts = self.contracts.write().await;
        let contract = contracts
            .get_mut(&id)
            .ok_or_else(|| EscrowError::not_found("contract", id))?;

        if contract.version != expected_version {
            return Err(EscrowError::conflict(format!(
                "contract {} changed underneath the caller: expected version {}, found {}",
                id, expected_version, contract.version
            )));
        }

        changes.apply(contract);
        Ok(contract.clone())
    }

    async fn list_contracts_for_party(
        &self,
        party_id: &str,
        status: Option<ContractStatus>,
    ) -> EscrowResult<Vec<Contract>> {
        let contracts = self.contracts.read().await;
        let mut out: Vec<Contract> = contracts
            .values()
            .filter(|c| c.investor_id == party_id || c.freelancer_id == party_id)
            .filter(|c| status.map_or(true, |s| c.status == s))
            .cloned()
            .collect();
        out.sort_by_key(|c| c.created_at);
        Ok(out)
    }

    async fn insert_deliverable(&self, deliverable: Deliverable) -> EscrowResult<Deliverable> {
        let mut deliverables = self.deliverables.write().await;
        if deliverables.contains_key(&deliverable.id) {
            return Err(EscrowError::store(format!(
                "duplicate deliverable id {}",
                deliverable.id
            )));
        }
        deliverables.insert(deliverable.id, deliverable.clone());
        Ok(deliverable)
    }

    async fn get_deliverable(&self, id: Uuid) -> EscrowResult<Option<Deliverable>> {
        Ok(self.deliverables.read().await.get(&id).cloned())
    }

    async fn update_deliverable(
        &self,
        id: Uuid,
        expected_version: i64,
        changes: DeliverableChanges,
    ) -> EscrowResult<Deliverable> {
        let mut deliverables = self.deliverables.write().await;
        let deliverable = deliverables
            .get_mut(&id)
            .ok_or_else(|| EscrowError::not_found("deliverable", id))?;

        if deliverable.version != expected_version {
            return Err(EscrowError::conflict(format!(
                "deliverable {} changed underneath the caller: expected version {}, found {}",
                id, expected_version, deliverable.version
            )));
        }

        changes.apply(deliverable);
        Ok(deliverable.clone())
    }

    async fn list_deliverables(&self, contract_id: Uuid) -> EscrowResult<Vec<Deliverable>> {
        let deliverables = self.deliverables.read().await;
        let mut out: Vec<Deliverable> = deliverables
            .values()
            .filter(|d| d.contract_id == contract_id)
            .cloned()
            .collect();
        out.sort_by_key(|d| d.created_at);
        Ok(out)
    }

    async fn get_party_profile(
        &self,
        party_id: &str,
    ) -> EscrowResult<Option<PartyProfileSummary>> {
        Ok(self.profiles.read().await.get(party_id).cloned())
    }

    async fn upsert_party_profile(&self, profile: PartyProfileSummary) -> EscrowResult<()> {
        self.profiles
            .write()
            .await
            .insert(profile.id.clone(), profile);
        Ok(())
    }
}
