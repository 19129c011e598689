//! Sea-ORM entities for the marketplace escrow tables

pub mod contracts;
pub mod deliverables;
pub mod party_profiles;

// Re-export entities for convenience
pub use contracts::Entity as Contracts;
pub use deliverables::Entity as Deliverables;
pub use party_profiles::Entity as PartyProfiles;
