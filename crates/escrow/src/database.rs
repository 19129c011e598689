//! Database connection and the SeaORM store implementation
//!
//! All records crossing this boundary go through an explicit mapping step;
//! rows with unknown status strings or partial ledger linkage are rejected
//! as `InvalidRecord` instead of leaking loosely-typed data upward.

use async_trait::async_trait;
use sea_orm::{
    entity::*, query::*, Database as SeaOrmDatabase, DatabaseConnection, QueryOrder,
    TransactionTrait,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::entity::{contracts, deliverables, party_profiles};
use crate::error::{EscrowError, EscrowResult};
use crate::store::{ContractChanges, ContractStore, DeliverableChanges};
use crate::types::{
    Contract, ContractStatus, Deliverable, DeliverableStatus, LedgerLinkage, PartyProfileSummary,
    PartyRole,
};

/// Database connection wrapper
pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    /// Create a new database connection with tuned pool settings
    pub async fn new(database_url: &str) -> EscrowResult<Self> {
        info!("Connecting to database: {}", mask_url(database_url));

        let mut opt = sea_orm::ConnectOptions::new(database_url.to_string());
        opt.max_connections(50)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(3600))
            .sqlx_logging(true)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        let connection = SeaOrmDatabase::connect(opt).await?;
        connection.ping().await?;
        info!("Database connection established");

        Ok(Self { connection })
    }

    /// Get a reference to the database connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// Build the store backed by this connection
    pub fn store(&self) -> SeaOrmStore {
        SeaOrmStore {
            conn: Arc::new(self.connection.clone()),
        }
    }
}

/// Mask sensitive parts of a database URL for logging
fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(double_slash_pos) = url.find("//") {
            let prefix = &url[..double_slash_pos + 2];
            let suffix = &url[at_pos..];
            return format!("{}****{}", prefix, suffix);
        }
    }
    url.to_string()
}

/// SeaORM-backed `ContractStore`
#[derive(Clone)]
pub struct SeaOrmStore {
    conn: Arc<DatabaseConnection>,
}

impl SeaOrmStore {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }
}

/// Map a contracts row into the typed domain record, enforcing the
/// all-or-nothing linkage invariant.
fn contract_from_model(m: contracts::Model) -> EscrowResult<Contract> {
    let status = ContractStatus::parse(&m.status).ok_or_else(|| {
        EscrowError::invalid_record(format!("unknown contract status '{}'", m.status))
    })?;

    let linkage = match (m.ledger_contract_id, m.ledger_address, m.transaction_hash) {
        (Some(ledger_contract_id), Some(ledger_address), Some(transaction_hash)) => {
            Some(LedgerLinkage {
                ledger_contract_id,
                ledger_address,
                transaction_hash,
            })
        }
        (None, None, None) => None,
        _ => {
            return Err(EscrowError::invalid_record(format!(
                "contract {} has partial ledger linkage",
                m.id
            )))
        }
    };

    Ok(Contract {
        id: m.id,
        investor_id: m.investor_id,
        freelancer_id: m.freelancer_id,
        title: m.title,
        description: m.description,
        value: m.value,
        terms: m.terms,
        status,
        linkage,
        verified: m.verified,
        error_message: m.error_message,
        version: m.version,
        created_at: m.created_at,
        updated_at: m.updated_at,
        completed_at: m.completed_at,
    })
}

fn contract_to_active_model(c: &Contract) -> contracts::ActiveModel {
    contracts::ActiveModel {
        id: Set(c.id),
        investor_id: Set(c.investor_id.clone()),
        freelancer_id: Set(c.freelancer_id.clone()),
        title: Set(c.title.clone()),
        description: Set(c.description.clone()),
        value: Set(c.value),
        terms: Set(c.terms.clone()),
        status: Set(c.status.as_str().to_string()),
        error_message: Set(c.error_message.clone()),
        ledger_contract_id: Set(c.linkage.as_ref().map(|l| l.ledger_contract_id.clone())),
        ledger_address: Set(c.linkage.as_ref().map(|l| l.ledger_address.clone())),
        transaction_hash: Set(c.linkage.as_ref().map(|l| l.transaction_hash.clone())),
        verified: Set(c.verified),
        version: Set(c.version),
        created_at: Set(c.created_at),
        updated_at: Set(c.updated_at),
        completed_at: Set(c.completed_at),
    }
}

fn deliverable_from_model(m: deliverables::Model) -> EscrowResult<Deliverable> {
    let status = DeliverableStatus::parse(&m.status).ok_or_else(|| {
        EscrowError::invalid_record(format!("unknown deliverable status '{}'", m.status))
    })?;

    Ok(Deliverable {
        id: m.id,
        contract_id: m.contract_id,
        title: m.title,
        description: m.description,
        file_url: m.file_url,
        status,
        ledger_uri: m.ledger_uri,
        version: m.version,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn deliverable_to_active_model(d: &Deliverable) -> deliverables::ActiveModel {
    deliverables::ActiveModel {
        id: Set(d.id),
        contract_id: Set(d.contract_id),
        title: Set(d.title.clone()),
        description: Set(d.description.clone()),
        file_url: Set(d.file_url.clone()),
        status: Set(d.status.as_str().to_string()),
        ledger_uri: Set(d.ledger_uri.clone()),
        version: Set(d.version),
        created_at: Set(d.created_at),
        updated_at: Set(d.updated_at),
    }
}

fn profile_from_model(m: party_profiles::Model) -> EscrowResult<PartyProfileSummary> {
    let role = PartyRole::parse(&m.role).ok_or_else(|| {
        EscrowError::invalid_record(format!("unknown party role '{}'", m.role))
    })?;

    Ok(PartyProfileSummary {
        id: m.id,
        display_name: m.display_name,
        role,
        ledger_address: m.ledger_address,
    })
}

#[async_trait]
impl ContractStore for SeaOrmStore {
    async fn insert_contract(&self, contract: Contract) -> EscrowResult<Contract> {
        contract_to_active_model(&contract)
            .insert(self.conn.as_ref())
            .await?;
        Ok(contract)
    }

    async fn get_contract(&self, id: Uuid) -> EscrowResult<Option<Contract>> {
        contracts::Entity::find_by_id(id)
            .one(self.conn.as_ref())
            .await?
            .map(contract_from_model)
            .transpose()
    }

    async fn update_contract(
        &self,
        id: Uuid,
        expected_version: i64,
        changes: ContractChanges,
    ) -> EscrowResult<Contract> {
        let txn = self.conn.begin().await?;

        let current = contracts::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| EscrowError::not_found("contract", id))?;

        if current.version != expected_version {
            txn.rollback().await?;
            return Err(EscrowError::conflict(format!(
                "contract {} changed underneath the caller: expected version {}, found {}",
                id, expected_version, current.version
            )));
        }

        let mut contract = contract_from_model(current)?;
        changes.apply(&mut contract);

        contract_to_active_model(&contract).update(&txn).await?;
        txn.commit().await?;

        Ok(contract)
    }

    async fn list_contracts_for_party(
        &self,
        party_id: &str,
        status: Option<ContractStatus>,
    ) -> EscrowResult<Vec<Contract>> {
        let mut query = contracts::Entity::find()
            .filter(
                Condition::any()
                    .add(contracts::Column::InvestorId.eq(party_id))
                    .add(contracts::Column::FreelancerId.eq(party_id)),
            )
            .order_by_asc(contracts::Column::CreatedAt);

        if let Some(status) = status {
            query = query.filter(contracts::Column::Status.eq(status.as_str()));
        }

        query
            .all(self.conn.as_ref())
            .await?
            .into_iter()
            .map(contract_from_model)
            .collect()
    }

    async fn insert_deliverable(&self, deliverable: Deliverable) -> EscrowResult<Deliverable> {
        deliverable_to_active_model(&deliverable)
            .insert(self.conn.as_ref())
            .await?;
        Ok(deliverable)
    }

    async fn get_deliverable(&self, id: Uuid) -> EscrowResult<Option<Deliverable>> {
        deliverables::Entity::find_by_id(id)
            .one(self.conn.as_ref())
            .await?
            .map(deliverable_from_model)
            .transpose()
    }

    async fn update_deliverable(
        &self,
        id: Uuid,
        expected_version: i64,
        changes: DeliverableChanges,
    ) -> EscrowResult<Deliverable> {
        let txn = self.conn.begin().await?;

        let current = deliverables::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| EscrowError::not_found("deliverable", id))?;

        if current.version != expected_version {
            txn.rollback().await?;
            return Err(EscrowError::conflict(format!(
                "deliverable {} changed underneath the caller: expected version {}, found {}",
                id, expected_version, current.version
            )));
        }

        let mut deliverable = deliverable_from_model(current)?;
        changes.apply(&mut deliverable);

        deliverable_to_active_model(&deliverable).update(&txn).await?;
        txn.commit().await?;

        Ok(deliverable)
    }

    async fn list_deliverables(&self, contract_id: Uuid) -> EscrowResult<Vec<Deliverable>> {
        deliverables::Entity::find()
            .filter(deliverables::Column::ContractId.eq(contract_id))
            .order_by_asc(deliverables::Column::CreatedAt)
            .all(self.conn.as_ref())
            .await?
            .into_iter()
            .map(deliverable_from_model)
            .collect()
    }

    async fn get_party_profile(
        &self,
        party_id: &str,
    ) -> EscrowResult<Option<PartyProfileSummary>> {
        party_profiles::Entity::find_by_id(party_id)
            .one(self.conn.as_ref())
            .await?
            .map(profile_from_model)
            .transpose()
    }

    async fn upsert_party_profile(&self, profile: PartyProfileSummary) -> EscrowResult<()> {
        let now = chrono::Utc::now();
        let existing = party_profiles::Entity::find_by_id(&profile.id)
            .one(self.conn.as_ref())
            .await?;

        match existing {
            Some(model) => {
                let mut active: party_profiles::ActiveModel = model.into();
                active.display_name = Set(profile.display_name);
                active.role = Set(profile.role.as_str().to_string());
                active.ledger_address = Set(profile.ledger_address);
                active.updated_at = Set(now);
                active.update(self.conn.as_ref()).await?;
            }
            None => {
                let active = party_profiles::ActiveModel {
                    id: Set(profile.id),
                    display_name: Set(profile.display_name),
                    role: Set(profile.role.as_str().to_string()),
                    ledger_address: Set(profile.ledger_address),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                active.insert(self.conn.as_ref()).await?;
            }
        }

        Ok(())
    }
}
