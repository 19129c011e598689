//! Escrow service: command and query surface over the contract lifecycle
//!
//! Orchestrates the two systems of record. For status transitions and
//! payment release the ledger is mirrored *before* the store commits, and
//! a ledger failure aborts the whole operation so the two never diverge.
//! Deliverable creation is the one deliberate exception: the store is
//! authoritative for deliverables and the ledger reference is advisory, so
//! a ledger failure there is logged and swallowed.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use fairlance_ledger_trait::LedgerBridge;

use crate::error::{EscrowError, EscrowResult};
use crate::store::{ContractChanges, ContractStore, DeliverableChanges};
use crate::transitions::check_transition;
use crate::types::{
    Caller, Contract, ContractDetail, ContractStatus, Deliverable, DeliverableStatus,
    LedgerLinkage, NewContract, NewDeliverable, PartyRole,
};

/// Contract lifecycle service
pub struct EscrowService {
    store: Arc<dyn ContractStore>,
    ledger: Option<Arc<dyn LedgerBridge>>,
}

impl EscrowService {
    pub fn new(store: Arc<dyn ContractStore>, ledger: Option<Arc<dyn LedgerBridge>>) -> Self {
        Self { store, ledger }
    }

    /// Which party of `contract` the caller is, by identity of record.
    /// The role tag from the identity provider is not trusted for this;
    /// only the ids stored on the contract are.
    fn party_of(contract: &Contract, caller: &Caller) -> Option<PartyRole> {
        if contract.investor_id == caller.id {
            Some(PartyRole::Investor)
        } else if contract.freelancer_id == caller.id {
            Some(PartyRole::Freelancer)
        } else {
            None
        }
    }

    /// Load a contract and resolve the caller's party, or `Forbidden`
    async fn load_for_party(
        &self,
        caller: &Caller,
        id: Uuid,
    ) -> EscrowResult<(Contract, PartyRole)> {
        let contract = self
            .store
            .get_contract(id)
            .await?
            .ok_or_else(|| EscrowError::not_found("contract", id))?;

        let party = Self::party_of(&contract, caller)
            .ok_or_else(|| EscrowError::forbidden("caller is not a party to this contract"))?;

        Ok((contract, party))
    }

    fn ledger_bridge(&self) -> EscrowResult<&Arc<dyn LedgerBridge>> {
        self.ledger.as_ref().ok_or_else(|| {
            EscrowError::Ledger(fairlance_ledger_trait::LedgerError::configuration(
                "contract is ledger-linked but no ledger bridge is configured",
            ))
        })
    }

    // ===== Contract lifecycle =====

    /// Create a contract in `Draft`, optionally registering it on the
    /// ledger and advancing to `Pending`.
    ///
    /// Ledger registration failure does not delete the row: the record is
    /// marked `Failed` with the reason and returned as-is.
    pub async fn create_contract(
        &self,
        caller: &Caller,
        new: NewContract,
    ) -> EscrowResult<Contract> {
        if caller.role != PartyRole::Investor || caller.id != new.investor_id {
            return Err(EscrowError::forbidden(
                "contracts are created by the investor of record",
            ));
        }

        if new.title.trim().is_empty() {
            return Err(EscrowError::invalid_argument("title", "must not be empty"));
        }
        if new.investor_id == new.freelancer_id {
            return Err(EscrowError::invalid_argument(
                "freelancer_id",
                "investor and freelancer must be distinct parties",
            ));
        }
        if new.value < 0 {
            return Err(EscrowError::invalid_argument(
                "value",
                "must be non-negative",
            ));
        }

        let ledger_address = if new.on_ledger {
            Some(
                new.freelancer_ledger_address
                    .clone()
                    .filter(|a| !a.is_empty())
                    .ok_or_else(|| {
                        EscrowError::invalid_argument(
                            "freelancer_ledger_address",
                            "required when creating on the ledger",
                        )
                    })?,
            )
        } else {
            None
        };

        let now = Utc::now();
        let contract = Contract {
            id: Uuid::new_v4(),
            investor_id: new.investor_id,
            freelancer_id: new.freelancer_id,
            title: new.title,
            description: new.description,
            value: new.value,
            terms: new.terms,
            status: ContractStatus::Draft,
            linkage: None,
            verified: false,
            error_message: None,
            version: 1,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        let contract = self.store.insert_contract(contract).await?;
        info!(contract_id = %contract.id, "contract created in draft");

        let Some(address) = ledger_address else {
            return Ok(contract);
        };

        let ledger = self.ledger_bridge()?;
        let terms_ref = contract.terms.clone().unwrap_or_default();

        match ledger
            .register_contract(&address, contract.value as u64, &terms_ref)
            .await
        {
            Ok(registered) => {
                let changes = ContractChanges {
                    status: Some(ContractStatus::Pending),
                    linkage: Some(LedgerLinkage {
                        ledger_contract_id: registered.ledger_contract_id,
                        ledger_address: registered.contract_address,
                        transaction_hash: registered.tx_hash,
                    }),
                    ..Default::default()
                };
                let contract = self
                    .store
                    .update_contract(contract.id, contract.version, changes)
                    .await?;
                info!(
                    contract_id = %contract.id,
                    ledger_contract_id = %contract.linkage.as_ref().map(|l| l.ledger_contract_id.as_str()).unwrap_or(""),
                    "contract registered on ledger"
                );
                Ok(contract)
            }
            Err(e) => {
                warn!(contract_id = %contract.id, error = %e, "ledger registration failed");
                let changes = ContractChanges {
                    status: Some(ContractStatus::Failed),
                    error_message: Some(format!("ledger registration failed: {}", e)),
                    ..Default::default()
                };
                let contract = self
                    .store
                    .update_contract(contract.id, contract.version, changes)
                    .await?;
                Ok(contract)
            }
        }
    }

    /// Drive a lifecycle transition, mirroring it on the ledger first for
    /// linked contracts. A ledger failure aborts with the store untouched.
    pub async fn transition_status(
        &self,
        caller: &Caller,
        contract_id: Uuid,
        target: ContractStatus,
    ) -> EscrowResult<Contract> {
        let (contract, party) = self.load_for_party(caller, contract_id).await?;

        check_transition(contract.status, target, party)?;

        if let Some(linkage) = &contract.linkage {
            // Draft/Failed never reach here: linked contracts start at
            // Pending and the transition table has no edge back.
            if let Some(ledger_status) = target.ledger_status() {
                let ledger = self.ledger_bridge()?;
                let receipt = ledger
                    .update_status(&linkage.ledger_contract_id, ledger_status)
                    .await?;
                debug!(
                    contract_id = %contract.id,
                    tx_hash = %receipt.tx_hash,
                    "ledger status mirrored"
                );
            }
        }

        let changes = ContractChanges {
            status: Some(target),
            completed_at: (target == ContractStatus::Completed).then(Utc::now),
            ..Default::default()
        };

        let updated = self
            .store
            .update_contract(contract.id, contract.version, changes)
            .await?;

        info!(
            contract_id = %updated.id,
            from = %contract.status,
            to = %updated.status,
            party = %party,
            "contract transitioned"
        );
        Ok(updated)
    }

    /// Investor confirmation of a completed contract: releases the
    /// escrowed value for linked contracts and marks the record verified.
    /// Terminal; calling again on a verified contract is a no-op.
    pub async fn verify_and_release_payment(
        &self,
        caller: &Caller,
        contract_id: Uuid,
    ) -> EscrowResult<Contract> {
        let (contract, party) = self.load_for_party(caller, contract_id).await?;

        if party != PartyRole::Investor {
            return Err(EscrowError::forbidden(
                "only the investor may verify and release payment",
            ));
        }
        if contract.status != ContractStatus::Completed {
            return Err(EscrowError::invalid_state(format!(
                "payment can only be released for a completed contract, status is {}",
                contract.status
            )));
        }
        if contract.verified {
            // Already released; never release twice.
            return Ok(contract);
        }

        if let Some(linkage) = &contract.linkage {
            let ledger = self.ledger_bridge()?;
            let receipt = ledger.release(&linkage.ledger_contract_id).await?;
            info!(
                contract_id = %contract.id,
                tx_hash = %receipt.tx_hash,
                "escrowed value released to freelancer"
            );
        }

        let changes = ContractChanges {
            verified: Some(true),
            ..Default::default()
        };
        let updated = self
            .store
            .update_contract(contract.id, contract.version, changes)
            .await?;

        info!(contract_id = %updated.id, "contract verified");
        Ok(updated)
    }

    // ===== Deliverable sub-lifecycle =====

    /// Attach a deliverable to an active contract.
    ///
    /// The ledger reference is best-effort by design: the deliverable
    /// already exists in the store (the authoritative record), so a ledger
    /// failure here is logged and swallowed rather than propagated. Do not
    /// "fix" this into a hard failure; the asymmetry with status
    /// transitions is intentional.
    pub async fn add_deliverable(
        &self,
        caller: &Caller,
        contract_id: Uuid,
        new: NewDeliverable,
    ) -> EscrowResult<Deliverable> {
        let (contract, party) = self.load_for_party(caller, contract_id).await?;

        if party != PartyRole::Freelancer {
            return Err(EscrowError::forbidden(
                "only the freelancer may add deliverables",
            ));
        }
        if contract.status != ContractStatus::Active {
            return Err(EscrowError::invalid_state(format!(
                "deliverables can only be added to an active contract, status is {}",
                contract.status
            )));
        }
        if new.title.trim().is_empty() {
            return Err(EscrowError::invalid_argument("title", "must not be empty"));
        }

        let now = Utc::now();
        let deliverable = Deliverable {
            id: Uuid::new_v4(),
            contract_id: contract.id,
            title: new.title,
            description: new.description,
            file_url: new.file_url,
            status: DeliverableStatus::Pending,
            ledger_uri: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        let deliverable = self.store.insert_deliverable(deliverable).await?;
        info!(
            contract_id = %contract.id,
            deliverable_id = %deliverable.id,
            "deliverable added"
        );

        let Some(linkage) = &contract.linkage else {
            return Ok(deliverable);
        };
        let Some(ledger) = self.ledger.as_ref() else {
            warn!(
                contract_id = %contract.id,
                "ledger-linked contract but no bridge configured; skipping deliverable reference"
            );
            return Ok(deliverable);
        };

        let reference = deliverable
            .file_url
            .clone()
            .unwrap_or_else(|| format!("deliverable:{}", deliverable.id));

        match ledger
            .add_deliverable_ref(&linkage.ledger_contract_id, &reference)
            .await
        {
            Ok(receipt) => {
                debug!(
                    deliverable_id = %deliverable.id,
                    tx_hash = %receipt.tx_hash,
                    "deliverable reference registered on ledger"
                );
                let changes = DeliverableChanges {
                    ledger_uri: Some(reference),
                    ..Default::default()
                };
                self.store
                    .update_deliverable(deliverable.id, deliverable.version, changes)
                    .await
            }
            Err(e) => {
                warn!(
                    deliverable_id = %deliverable.id,
                    error = %e,
                    "ledger reference failed; deliverable kept without it"
                );
                Ok(deliverable)
            }
        }
    }

    /// Investor verdict on a pending deliverable of an active contract
    pub async fn update_deliverable_status(
        &self,
        caller: &Caller,
        deliverable_id: Uuid,
        target: DeliverableStatus,
    ) -> EscrowResult<Deliverable> {
        if target == DeliverableStatus::Pending {
            return Err(EscrowError::invalid_argument(
                "status",
                "deliverables can only be approved or rejected",
            ));
        }

        let deliverable = self
            .store
            .get_deliverable(deliverable_id)
            .await?
            .ok_or_else(|| EscrowError::not_found("deliverable", deliverable_id))?;

        let (contract, party) = self.load_for_party(caller, deliverable.contract_id).await?;

        if party != PartyRole::Investor {
            return Err(EscrowError::forbidden(
                "only the investor may approve or reject deliverables",
            ));
        }
        if contract.status != ContractStatus::Active {
            return Err(EscrowError::invalid_state(format!(
                "deliverables can only be reviewed while the contract is active, status is {}",
                contract.status
            )));
        }
        if deliverable.status != DeliverableStatus::Pending {
            return Err(EscrowError::invalid_state(format!(
                "deliverable is already {}, no further transition is defined",
                deliverable.status
            )));
        }

        let changes = DeliverableChanges {
            status: Some(target),
            ..Default::default()
        };
        let updated = self
            .store
            .update_deliverable(deliverable.id, deliverable.version, changes)
            .await?;

        info!(
            deliverable_id = %updated.id,
            status = %updated.status,
            "deliverable reviewed"
        );
        Ok(updated)
    }

    // ===== Queries =====

    /// Fetch a contract; restricted to its parties
    pub async fn get_contract(&self, caller: &Caller, id: Uuid) -> EscrowResult<Contract> {
        let (contract, _) = self.load_for_party(caller, id).await?;
        Ok(contract)
    }

    /// Fetch a contract with both party profile summaries, when known
    pub async fn get_contract_detail(
        &self,
        caller: &Caller,
        id: Uuid,
    ) -> EscrowResult<ContractDetail> {
        let (contract, _) = self.load_for_party(caller, id).await?;

        let investor = self.store.get_party_profile(&contract.investor_id).await?;
        let freelancer = self
            .store
            .get_party_profile(&contract.freelancer_id)
            .await?;

        Ok(ContractDetail {
            contract,
            investor,
            freelancer,
        })
    }

    /// List the caller's contracts, optionally filtered by status
    pub async fn list_contracts(
        &self,
        caller: &Caller,
        status: Option<ContractStatus>,
    ) -> EscrowResult<Vec<Contract>> {
        self.store.list_contracts_for_party(&caller.id, status).await
    }

    /// List a contract's deliverables; restricted to its parties
    pub async fn list_deliverables(
        &self,
        caller: &Caller,
        contract_id: Uuid,
    ) -> EscrowResult<Vec<Deliverable>> {
        let (contract, _) = self.load_for_party(caller, contract_id).await?;
        self.store.list_deliverables(contract.id).await
    }
}
