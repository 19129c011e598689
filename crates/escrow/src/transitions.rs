//! Contract lifecycle state machine
//!
//! The transition table is the single source of truth for which status
//! edges exist and which party may drive them. Anything not in the table
//! is an invalid transition and must leave the stored record untouched.

use crate::error::{EscrowError, EscrowResult};
use crate::types::{ContractStatus, PartyRole};

/// Who may drive a given transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRule {
    /// Either the investor or the freelancer of the contract
    EitherParty,
    /// Only the freelancer (acceptance, marking work done)
    FreelancerOnly,
}

/// Look up the rule for a status edge, or `None` when the edge does not
/// exist. `Completed`, `Cancelled` and `Failed` are terminal.
pub fn transition_rule(from: ContractStatus, to: ContractStatus) -> Option<TransitionRule> {
    use ContractStatus::*;
    match (from, to) {
        (Draft, Pending) => Some(TransitionRule::EitherParty),
        (Draft, Cancelled) => Some(TransitionRule::EitherParty),
        (Pending, Active) => Some(TransitionRule::FreelancerOnly),
        (Pending, Cancelled) => Some(TransitionRule::EitherParty),
        (Active, Completed) => Some(TransitionRule::FreelancerOnly),
        (Active, Cancelled) => Some(TransitionRule::EitherParty),
        _ => None,
    }
}

/// Validate a transition for the given party of the contract.
///
/// Edge legality is checked before party restriction: a request for a
/// nonexistent edge is `InvalidTransition` regardless of who asks, while
/// an existing edge driven by the wrong party is `Forbidden`.
pub fn check_transition(
    from: ContractStatus,
    to: ContractStatus,
    party: PartyRole,
) -> EscrowResult<()> {
    match transition_rule(from, to) {
        None => Err(EscrowError::InvalidTransition { from, to }),
        Some(TransitionRule::EitherParty) => Ok(()),
        Some(TransitionRule::FreelancerOnly) => match party {
            PartyRole::Freelancer => Ok(()),
            PartyRole::Investor => Err(EscrowError::forbidden(format!(
                "only the freelancer may transition {} -> {}",
                from, to
            ))),
        },
    }
}
