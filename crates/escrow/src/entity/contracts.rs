//! contracts entity
//! Aggregate root for the escrow lifecycle

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "contracts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub investor_id: String,
    pub freelancer_id: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Escrowed amount in minor units
    pub value: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub terms: Option<String>,

    // Status (maps to SQL ENUM)
    pub status: String, // DRAFT, PENDING, ACTIVE, COMPLETED, CANCELLED, FAILED
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>, // For FAILED status

    // Ledger linkage; either all three set or none (checked at the
    // mapping boundary, not by the schema)
    pub ledger_contract_id: Option<String>,
    pub ledger_address: Option<String>,
    pub transaction_hash: Option<String>,

    pub verified: bool,

    /// Optimistic concurrency token
    pub version: i64,

    // Metadata timestamps
    #[sea_orm(column_type = "TimestampWithTimeZone")]
    pub created_at: DateTimeUtc,
    #[sea_orm(column_type = "TimestampWithTimeZone")]
    pub updated_at: DateTimeUtc,
    #[sea_orm(column_type = "TimestampWithTimeZone", nullable)]
    pub completed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::deliverables::Entity")]
    Deliverables,
}

impl Related<super::deliverables::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deliverables.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
