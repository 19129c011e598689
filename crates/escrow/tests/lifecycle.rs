//! Integration tests for the contract lifecycle service
//!
//! Driven against the in-memory store and a scripted ledger bridge, so no
//! external services are required.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use escrow::{
    Caller, ContractStatus, DeliverableStatus, EscrowError, EscrowService, InMemoryStore,
    NewContract, NewDeliverable, PartyProfileSummary, PartyRole,
};
use fairlance_ledger_trait::{
    LedgerBridge, LedgerContractStatus, LedgerError, LedgerLayer, LedgerResult,
    RegisteredContract, TxReceipt,
};
use uuid::Uuid;

/// Scripted outcome for a ledger operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Ok,
    Timeout,
    UserRejected,
    Reverted,
}

impl Outcome {
    fn error(self) -> LedgerError {
        match self {
            Outcome::Timeout => LedgerError::Timeout { seconds: 30 },
            Outcome::UserRejected => LedgerError::user_rejected("user denied in wallet"),
            Outcome::Reverted => {
                LedgerError::transaction("execution reverted", Some("0xdead".to_string()))
            }
            Outcome::Ok => unreachable!("Ok has no error"),
        }
    }
}

/// Ledger bridge with scripted outcomes and call recording
struct ScriptedLedger {
    register: Outcome,
    update: Outcome,
    /// Overrides `update` when mirroring `Completed`, so a ledger can
    /// accept earlier transitions and fail only at completion
    update_on_completed: Option<Outcome>,
    deliverable: Outcome,
    release: Outcome,
    calls: Mutex<Vec<String>>,
}

impl ScriptedLedger {
    fn succeeding() -> Self {
        Self {
            register: Outcome::Ok,
            update: Outcome::Ok,
            update_on_completed: None,
            deliverable: Outcome::Ok,
            release: Outcome::Ok,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn receipt() -> TxReceipt {
        TxReceipt {
            tx_hash: "0xfeed".to_string(),
            block_number: Some(12),
        }
    }
}

#[async_trait]
impl LedgerBridge for ScriptedLedger {
    fn ledger_layer(&self) -> LedgerLayer {
        LedgerLayer::Ethereum
    }

    fn chain_id(&self) -> String {
        "31337".to_string()
    }

    async fn register_contract(
        &self,
        freelancer_address: &str,
        locked_value: u64,
        _terms_ref: &str,
    ) -> LedgerResult<RegisteredContract> {
        self.record(format!("register:{}:{}", freelancer_address, locked_value));
        match self.register {
            Outcome::Ok => Ok(RegisteredContract {
                ledger_contract_id: "7".to_string(),
                contract_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
                tx_hash: "0xabc123".to_string(),
            }),
            other => Err(other.error()),
        }
    }

    async fn update_status(
        &self,
        ledger_contract_id: &str,
        status: LedgerContractStatus,
    ) -> LedgerResult<TxReceipt> {
        self.record(format!("update:{}:{}", ledger_contract_id, status));
        let outcome = if status == LedgerContractStatus::Completed {
            self.update_on_completed.unwrap_or(self.update)
        } else {
            self.update
        };
        match outcome {
            Outcome::Ok => Ok(Self::receipt()),
            other => Err(other.error()),
        }
    }

    async fn add_deliverable_ref(
        &self,
        ledger_contract_id: &str,
        reference: &str,
    ) -> LedgerResult<TxReceipt> {
        self.record(format!("deliverable:{}:{}", ledger_contract_id, reference));
        match self.deliverable {
            Outcome::Ok => Ok(Self::receipt()),
            other => Err(other.error()),
        }
    }

    async fn release(&self, ledger_contract_id: &str) -> LedgerResult<TxReceipt> {
        self.record(format!("release:{}", ledger_contract_id));
        match self.release {
            Outcome::Ok => Ok(Self::receipt()),
            other => Err(other.error()),
        }
    }
}

/// Test fixture with two parties and an outsider
struct Fixture {
    store: Arc<InMemoryStore>,
    service: EscrowService,
    investor: Caller,
    freelancer: Caller,
    outsider: Caller,
}

impl Fixture {
    fn new() -> Self {
        Self::build(None)
    }

    fn with_ledger(ledger: ScriptedLedger) -> (Self, Arc<ScriptedLedger>) {
        let ledger = Arc::new(ledger);
        let fixture = Self::build(Some(ledger.clone()));
        (fixture, ledger)
    }

    fn build(ledger: Option<Arc<ScriptedLedger>>) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let service = EscrowService::new(
            store.clone(),
            ledger.map(|l| l as Arc<dyn LedgerBridge>),
        );
        Self {
            store,
            service,
            investor: Caller {
                id: "investor-1".to_string(),
                role: PartyRole::Investor,
            },
            freelancer: Caller {
                id: "freelancer-1".to_string(),
                role: PartyRole::Freelancer,
            },
            outsider: Caller {
                id: "investor-2".to_string(),
                role: PartyRole::Investor,
            },
        }
    }

    fn new_contract(&self, on_ledger: bool) -> NewContract {
        NewContract {
            investor_id: self.investor.id.clone(),
            freelancer_id: self.freelancer.id.clone(),
            title: "Brand identity".to_string(),
            description: Some("Full logo and style guide".to_string()),
            value: 5000,
            terms: Some("ipfs://terms".to_string()),
            on_ledger,
            freelancer_ledger_address: on_ledger
                .then(|| "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string()),
        }
    }

    /// Create an off-ledger contract and drive it to `Active`
    async fn active_contract(&self) -> Uuid {
        let contract = self
            .service
            .create_contract(&self.investor, self.new_contract(false))
            .await
            .unwrap();
        self.service
            .transition_status(&self.investor, contract.id, ContractStatus::Pending)
            .await
            .unwrap();
        self.service
            .transition_status(&self.freelancer, contract.id, ContractStatus::Active)
            .await
            .unwrap();
        contract.id
    }
}

// ===== Contract creation =====

#[tokio::test]
async fn creation_defaults_and_round_trip() {
    let fixture = Fixture::new();
    let new = fixture.new_contract(false);

    let created = fixture
        .service
        .create_contract(&fixture.investor, new.clone())
        .await
        .unwrap();

    assert_eq!(created.status, ContractStatus::Draft);
    assert_eq!(created.investor_id, new.investor_id);
    assert_eq!(created.freelancer_id, new.freelancer_id);
    assert_eq!(created.title, new.title);
    assert_eq!(created.description, new.description);
    assert_eq!(created.value, 5000);
    assert_eq!(created.terms, new.terms);
    assert!(created.linkage.is_none());
    assert!(!created.verified);
    assert!(created.completed_at.is_none());

    let fetched = fixture
        .service
        .get_contract(&fixture.investor, created.id)
        .await
        .unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn creation_input_validation() {
    let fixture = Fixture::new();

    let mut equal_parties = fixture.new_contract(false);
    equal_parties.freelancer_id = fixture.investor.id.clone();
    // The caller must match the investor of record for the malformed input
    // to even be inspected, so keep the caller as the investor.
    assert!(matches!(
        fixture
            .service
            .create_contract(&fixture.investor, equal_parties)
            .await,
        Err(EscrowError::InvalidArgument { .. })
    ));

    let mut empty_title = fixture.new_contract(false);
    empty_title.title = "   ".to_string();
    assert!(matches!(
        fixture
            .service
            .create_contract(&fixture.investor, empty_title)
            .await,
        Err(EscrowError::InvalidArgument { .. })
    ));

    let mut negative_value = fixture.new_contract(false);
    negative_value.value = -1;
    assert!(matches!(
        fixture
            .service
            .create_contract(&fixture.investor, negative_value)
            .await,
        Err(EscrowError::InvalidArgument { .. })
    ));

    let mut missing_address = fixture.new_contract(false);
    missing_address.on_ledger = true;
    assert!(matches!(
        fixture
            .service
            .create_contract(&fixture.investor, missing_address)
            .await,
        Err(EscrowError::InvalidArgument { .. })
    ));
}

#[tokio::test]
async fn creation_requires_the_investor_of_record() {
    let fixture = Fixture::new();

    // Freelancer cannot create
    assert!(matches!(
        fixture
            .service
            .create_contract(&fixture.freelancer, fixture.new_contract(false))
            .await,
        Err(EscrowError::Forbidden { .. })
    ));

    // Another investor cannot create on someone else's behalf
    assert!(matches!(
        fixture
            .service
            .create_contract(&fixture.outsider, fixture.new_contract(false))
            .await,
        Err(EscrowError::Forbidden { .. })
    ));
}

// ===== Status transitions =====

#[tokio::test]
async fn acceptance_flow_with_party_restrictions() {
    let fixture = Fixture::new();
    let contract = fixture
        .service
        .create_contract(&fixture.investor, fixture.new_contract(false))
        .await
        .unwrap();

    // Investor submits the draft
    let contract = fixture
        .service
        .transition_status(&fixture.investor, contract.id, ContractStatus::Pending)
        .await
        .unwrap();
    assert_eq!(contract.status, ContractStatus::Pending);

    // Only the freelancer may accept
    assert!(matches!(
        fixture
            .service
            .transition_status(&fixture.investor, contract.id, ContractStatus::Active)
            .await,
        Err(EscrowError::Forbidden { .. })
    ));

    let unchanged = fixture
        .service
        .get_contract(&fixture.investor, contract.id)
        .await
        .unwrap();
    assert_eq!(unchanged, contract);

    let accepted = fixture
        .service
        .transition_status(&fixture.freelancer, contract.id, ContractStatus::Active)
        .await
        .unwrap();
    assert_eq!(accepted.status, ContractStatus::Active);
}

#[tokio::test]
async fn invalid_edges_leave_the_record_unchanged() {
    let fixture = Fixture::new();
    let contract = fixture
        .service
        .create_contract(&fixture.investor, fixture.new_contract(false))
        .await
        .unwrap();

    // Draft cannot jump straight to active
    let result = fixture
        .service
        .transition_status(&fixture.freelancer, contract.id, ContractStatus::Active)
        .await;
    assert!(matches!(
        result,
        Err(EscrowError::InvalidTransition {
            from: ContractStatus::Draft,
            to: ContractStatus::Active,
        })
    ));

    let unchanged = fixture
        .service
        .get_contract(&fixture.investor, contract.id)
        .await
        .unwrap();
    assert_eq!(unchanged, contract);
}

#[tokio::test]
async fn terminal_states_accept_no_transition() {
    let fixture = Fixture::new();
    let contract_id = fixture.active_contract().await;

    fixture
        .service
        .transition_status(&fixture.freelancer, contract_id, ContractStatus::Completed)
        .await
        .unwrap();

    for target in [
        ContractStatus::Draft,
        ContractStatus::Pending,
        ContractStatus::Active,
        ContractStatus::Cancelled,
    ] {
        assert!(matches!(
            fixture
                .service
                .transition_status(&fixture.freelancer, contract_id, target)
                .await,
            Err(EscrowError::InvalidTransition { .. })
        ));
    }
}

#[tokio::test]
async fn either_party_may_cancel() {
    let fixture = Fixture::new();

    let contract = fixture
        .service
        .create_contract(&fixture.investor, fixture.new_contract(false))
        .await
        .unwrap();
    let cancelled = fixture
        .service
        .transition_status(&fixture.freelancer, contract.id, ContractStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status, ContractStatus::Cancelled);

    let contract_id = fixture.active_contract().await;
    let cancelled = fixture
        .service
        .transition_status(&fixture.investor, contract_id, ContractStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status, ContractStatus::Cancelled);
}

#[tokio::test]
async fn completion_sets_completed_at() {
    let fixture = Fixture::new();
    let contract_id = fixture.active_contract().await;

    let completed = fixture
        .service
        .transition_status(&fixture.freelancer, contract_id, ContractStatus::Completed)
        .await
        .unwrap();
    assert_eq!(completed.status, ContractStatus::Completed);
    assert!(completed.completed_at.is_some());
}

// ===== Verify and release =====

#[tokio::test]
async fn only_the_investor_may_release() {
    let fixture = Fixture::new();
    let contract_id = fixture.active_contract().await;
    fixture
        .service
        .transition_status(&fixture.freelancer, contract_id, ContractStatus::Completed)
        .await
        .unwrap();

    let result = fixture
        .service
        .verify_and_release_payment(&fixture.freelancer, contract_id)
        .await;
    assert!(matches!(result, Err(EscrowError::Forbidden { .. })));

    let contract = fixture
        .service
        .get_contract(&fixture.investor, contract_id)
        .await
        .unwrap();
    assert!(!contract.verified);
}

#[tokio::test]
async fn release_requires_a_completed_contract() {
    let fixture = Fixture::new();
    let contract_id = fixture.active_contract().await;

    assert!(matches!(
        fixture
            .service
            .verify_and_release_payment(&fixture.investor, contract_id)
            .await,
        Err(EscrowError::InvalidState { .. })
    ));
}

#[tokio::test]
async fn release_is_terminal_and_never_runs_twice() {
    let (fixture, ledger) = Fixture::with_ledger(ScriptedLedger::succeeding());

    let contract = fixture
        .service
        .create_contract(&fixture.investor, fixture.new_contract(true))
        .await
        .unwrap();
    fixture
        .service
        .transition_status(&fixture.freelancer, contract.id, ContractStatus::Active)
        .await
        .unwrap();
    fixture
        .service
        .transition_status(&fixture.freelancer, contract.id, ContractStatus::Completed)
        .await
        .unwrap();

    let verified = fixture
        .service
        .verify_and_release_payment(&fixture.investor, contract.id)
        .await
        .unwrap();
    assert!(verified.verified);

    // Second call is a no-op; the escrowed value is not released again
    let again = fixture
        .service
        .verify_and_release_payment(&fixture.investor, contract.id)
        .await
        .unwrap();
    assert!(again.verified);

    let releases = ledger
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("release:"))
        .count();
    assert_eq!(releases, 1);
}

// ===== Ledger reconciliation =====

#[tokio::test]
async fn on_ledger_creation_stores_full_linkage() {
    let (fixture, ledger) = Fixture::with_ledger(ScriptedLedger::succeeding());

    let contract = fixture
        .service
        .create_contract(&fixture.investor, fixture.new_contract(true))
        .await
        .unwrap();

    assert_eq!(contract.status, ContractStatus::Pending);
    let linkage = contract.linkage.expect("linkage must be set as a unit");
    assert_eq!(linkage.ledger_contract_id, "7");
    assert!(!linkage.ledger_address.is_empty());
    assert!(!linkage.transaction_hash.is_empty());

    // The locked value is the contract value
    assert_eq!(
        ledger.calls(),
        vec!["register:0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266:5000".to_string()]
    );
}

#[tokio::test]
async fn failed_registration_marks_the_record_not_deletes_it() {
    let (fixture, _ledger) = Fixture::with_ledger(ScriptedLedger {
        register: Outcome::Reverted,
        ..ScriptedLedger::succeeding()
    });

    let contract = fixture
        .service
        .create_contract(&fixture.investor, fixture.new_contract(true))
        .await
        .unwrap();

    assert_eq!(contract.status, ContractStatus::Failed);
    assert!(contract
        .error_message
        .as_deref()
        .unwrap()
        .contains("reverted"));
    // No partial linkage on the failure path
    assert!(contract.linkage.is_none());

    // The record survives and accepts no transitions
    assert!(matches!(
        fixture
            .service
            .transition_status(&fixture.investor, contract.id, ContractStatus::Pending)
            .await,
        Err(EscrowError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn ledger_timeout_aborts_the_transition() {
    let (fixture, _ledger) = Fixture::with_ledger(ScriptedLedger {
        update: Outcome::Timeout,
        ..ScriptedLedger::succeeding()
    });

    let contract = fixture
        .service
        .create_contract(&fixture.investor, fixture.new_contract(true))
        .await
        .unwrap();

    let result = fixture
        .service
        .transition_status(&fixture.freelancer, contract.id, ContractStatus::Active)
        .await;
    assert!(matches!(
        result,
        Err(EscrowError::Ledger(LedgerError::Timeout { .. }))
    ));

    // Store untouched: status and version unchanged
    let unchanged = fixture
        .service
        .get_contract(&fixture.freelancer, contract.id)
        .await
        .unwrap();
    assert_eq!(unchanged.status, ContractStatus::Pending);
    assert_eq!(unchanged.version, contract.version);
    assert!(unchanged.completed_at.is_none());
}

#[tokio::test]
async fn completion_timeout_leaves_contract_active_without_timestamp() {
    let (fixture, _ledger) = Fixture::with_ledger(ScriptedLedger {
        update_on_completed: Some(Outcome::Timeout),
        ..ScriptedLedger::succeeding()
    });

    let contract = fixture
        .service
        .create_contract(&fixture.investor, fixture.new_contract(true))
        .await
        .unwrap();
    // Acceptance mirrors fine; only the completion mirror times out
    let active = fixture
        .service
        .transition_status(&fixture.freelancer, contract.id, ContractStatus::Active)
        .await
        .unwrap();

    let result = fixture
        .service
        .transition_status(&fixture.freelancer, contract.id, ContractStatus::Completed)
        .await;
    assert!(matches!(
        result,
        Err(EscrowError::Ledger(LedgerError::Timeout { .. }))
    ));

    let unchanged = fixture
        .service
        .get_contract(&fixture.freelancer, contract.id)
        .await
        .unwrap();
    assert_eq!(unchanged.status, ContractStatus::Active);
    assert!(unchanged.completed_at.is_none());
    assert_eq!(unchanged.version, active.version);
}

#[tokio::test]
async fn retry_guidance_distinguishes_user_rejection_from_infrastructure() {
    let (fixture, _ledger) = Fixture::with_ledger(ScriptedLedger {
        update: Outcome::UserRejected,
        ..ScriptedLedger::succeeding()
    });

    let contract = fixture
        .service
        .create_contract(&fixture.investor, fixture.new_contract(true))
        .await
        .unwrap();

    let err = fixture
        .service
        .transition_status(&fixture.freelancer, contract.id, ContractStatus::Active)
        .await
        .unwrap_err();
    assert!(!err.is_retryable());

    let timeout = EscrowError::Ledger(LedgerError::Timeout { seconds: 30 });
    assert!(timeout.is_retryable());
}

// ===== Deliverables =====

#[tokio::test]
async fn deliverable_review_flow() {
    let fixture = Fixture::new();
    let contract_id = fixture.active_contract().await;

    let deliverable = fixture
        .service
        .add_deliverable(
            &fixture.freelancer,
            contract_id,
            NewDeliverable {
                title: "Logo v1".to_string(),
                description: None,
                file_url: Some("https://files.example/logo-v1.svg".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(deliverable.status, DeliverableStatus::Pending);

    let approved = fixture
        .service
        .update_deliverable_status(&fixture.investor, deliverable.id, DeliverableStatus::Approved)
        .await
        .unwrap();
    assert_eq!(approved.status, DeliverableStatus::Approved);

    // No transition out of a terminal verdict
    let result = fixture
        .service
        .update_deliverable_status(&fixture.investor, deliverable.id, DeliverableStatus::Rejected)
        .await;
    assert!(matches!(result, Err(EscrowError::InvalidState { .. })));

    let deliverables = fixture
        .service
        .list_deliverables(&fixture.investor, contract_id)
        .await
        .unwrap();
    assert_eq!(deliverables.len(), 1);
    assert_eq!(deliverables[0].status, DeliverableStatus::Approved);
}

#[tokio::test]
async fn deliverable_authorization_and_gating() {
    let fixture = Fixture::new();
    let contract_id = fixture.active_contract().await;

    let new = NewDeliverable {
        title: "Logo v1".to_string(),
        description: None,
        file_url: None,
    };

    // Only the freelancer adds deliverables
    assert!(matches!(
        fixture
            .service
            .add_deliverable(&fixture.investor, contract_id, new.clone())
            .await,
        Err(EscrowError::Forbidden { .. })
    ));

    let deliverable = fixture
        .service
        .add_deliverable(&fixture.freelancer, contract_id, new.clone())
        .await
        .unwrap();

    // Only the investor reviews them
    assert!(matches!(
        fixture
            .service
            .update_deliverable_status(
                &fixture.freelancer,
                deliverable.id,
                DeliverableStatus::Approved
            )
            .await,
        Err(EscrowError::Forbidden { .. })
    ));

    // Pending is not a reviewable verdict
    assert!(matches!(
        fixture
            .service
            .update_deliverable_status(
                &fixture.investor,
                deliverable.id,
                DeliverableStatus::Pending
            )
            .await,
        Err(EscrowError::InvalidArgument { .. })
    ));

    // Review is gated on the parent contract still being active
    fixture
        .service
        .transition_status(&fixture.freelancer, contract_id, ContractStatus::Completed)
        .await
        .unwrap();
    assert!(matches!(
        fixture
            .service
            .update_deliverable_status(
                &fixture.investor,
                deliverable.id,
                DeliverableStatus::Approved
            )
            .await,
        Err(EscrowError::InvalidState { .. })
    ));

    // And so is adding new ones
    assert!(matches!(
        fixture
            .service
            .add_deliverable(&fixture.freelancer, contract_id, new)
            .await,
        Err(EscrowError::InvalidState { .. })
    ));
}

#[tokio::test]
async fn deliverables_require_an_active_contract() {
    let fixture = Fixture::new();
    let contract = fixture
        .service
        .create_contract(&fixture.investor, fixture.new_contract(false))
        .await
        .unwrap();

    let result = fixture
        .service
        .add_deliverable(
            &fixture.freelancer,
            contract.id,
            NewDeliverable {
                title: "Too early".to_string(),
                description: None,
                file_url: None,
            },
        )
        .await;
    assert!(matches!(result, Err(EscrowError::InvalidState { .. })));
}

#[tokio::test]
async fn deliverable_ledger_failure_is_swallowed() {
    let (fixture, ledger) = Fixture::with_ledger(ScriptedLedger {
        deliverable: Outcome::Timeout,
        ..ScriptedLedger::succeeding()
    });

    let contract = fixture
        .service
        .create_contract(&fixture.investor, fixture.new_contract(true))
        .await
        .unwrap();
    fixture
        .service
        .transition_status(&fixture.freelancer, contract.id, ContractStatus::Active)
        .await
        .unwrap();

    // The ledger reference fails, but the deliverable itself succeeds:
    // the store is authoritative, the ledger reference is advisory.
    let deliverable = fixture
        .service
        .add_deliverable(
            &fixture.freelancer,
            contract.id,
            NewDeliverable {
                title: "Logo v1".to_string(),
                description: None,
                file_url: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(deliverable.status, DeliverableStatus::Pending);
    assert!(deliverable.ledger_uri.is_none());
    assert!(ledger
        .calls()
        .iter()
        .any(|c| c.starts_with("deliverable:7:")));
}

#[tokio::test]
async fn deliverable_ledger_reference_recorded_on_success() {
    let (fixture, _ledger) = Fixture::with_ledger(ScriptedLedger::succeeding());

    let contract = fixture
        .service
        .create_contract(&fixture.investor, fixture.new_contract(true))
        .await
        .unwrap();
    fixture
        .service
        .transition_status(&fixture.freelancer, contract.id, ContractStatus::Active)
        .await
        .unwrap();

    let deliverable = fixture
        .service
        .add_deliverable(
            &fixture.freelancer,
            contract.id,
            NewDeliverable {
                title: "Logo v1".to_string(),
                description: None,
                file_url: Some("https://files.example/logo-v1.svg".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(
        deliverable.ledger_uri.as_deref(),
        Some("https://files.example/logo-v1.svg")
    );
}

// ===== Concurrency =====

#[tokio::test]
async fn stale_version_updates_conflict_and_change_nothing() {
    use escrow::{ContractChanges, ContractStore};

    let fixture = Fixture::new();
    let contract = fixture
        .service
        .create_contract(&fixture.investor, fixture.new_contract(false))
        .await
        .unwrap();

    // A concurrent writer commits first
    fixture
        .store
        .update_contract(
            contract.id,
            contract.version,
            ContractChanges {
                status: Some(ContractStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // The stale writer loses with Conflict
    let result = fixture
        .store
        .update_contract(
            contract.id,
            contract.version,
            ContractChanges {
                status: Some(ContractStatus::Cancelled),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(EscrowError::Conflict { .. })));

    let current = fixture
        .service
        .get_contract(&fixture.investor, contract.id)
        .await
        .unwrap();
    assert_eq!(current.status, ContractStatus::Pending);
}

// ===== Queries =====

#[tokio::test]
async fn queries_are_restricted_to_the_parties() {
    let fixture = Fixture::new();
    let contract_id = fixture.active_contract().await;

    assert!(matches!(
        fixture
            .service
            .get_contract(&fixture.outsider, contract_id)
            .await,
        Err(EscrowError::Forbidden { .. })
    ));
    assert!(matches!(
        fixture
            .service
            .list_deliverables(&fixture.outsider, contract_id)
            .await,
        Err(EscrowError::Forbidden { .. })
    ));
}

#[tokio::test]
async fn listing_filters_by_party_and_status() {
    let fixture = Fixture::new();

    let first = fixture
        .service
        .create_contract(&fixture.investor, fixture.new_contract(false))
        .await
        .unwrap();
    let second_id = fixture.active_contract().await;

    let all = fixture
        .service
        .list_contracts(&fixture.freelancer, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let drafts = fixture
        .service
        .list_contracts(&fixture.investor, Some(ContractStatus::Draft))
        .await
        .unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].id, first.id);

    let active = fixture
        .service
        .list_contracts(&fixture.investor, Some(ContractStatus::Active))
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, second_id);

    let none = fixture
        .service
        .list_contracts(&fixture.outsider, None)
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn contract_detail_joins_party_profiles() {
    use escrow::ContractStore;

    let fixture = Fixture::new();
    let contract_id = fixture.active_contract().await;

    fixture
        .store
        .upsert_party_profile(PartyProfileSummary {
            id: fixture.investor.id.clone(),
            display_name: "Ada".to_string(),
            role: PartyRole::Investor,
            ledger_address: None,
        })
        .await
        .unwrap();

    let detail = fixture
        .service
        .get_contract_detail(&fixture.investor, contract_id)
        .await
        .unwrap();

    assert_eq!(detail.contract.id, contract_id);
    assert_eq!(detail.investor.unwrap().display_name, "Ada");
    // Unknown profiles default to None rather than failing the query
    assert!(detail.freelancer.is_none());
}
