//! Mutation commands consumed by the Lifecycle Manager.
//!
//! Every write the manager performs goes through one of these, so mutations
//! stay auditable and loggable as values.

use uuid::Uuid;

use super::model::{ParticipantType, Surface};
use crate::profile::SignupCompleteness;

/// Create a fresh current-generation account.
#[derive(Debug, Clone)]
pub struct CreateAccount {
    /// Normalized 10-digit phone number.
    pub phone_number: String,
    pub surface: Surface,
    pub participant_type: ParticipantType,
    pub notification_address: Option<String>,
}

/// Bring a soft-deleted account back to active.
#[derive(Debug, Clone)]
pub struct ReactivateAccount {
    pub account_id: Uuid,
    /// Participant type after reactivation: `unset` for vendor non-delivery
    /// history, `customer` on the customer surface, `delivery` stays.
    pub reset_to: ParticipantType,
}

/// Promote an account to a document-gated commerce role (or delivery).
///
/// Issued only by the external signup-completion step; it must carry the
/// Completeness Evaluator's report as proof, and the manager re-checks it.
#[derive(Debug, Clone)]
pub struct AssignParticipantType {
    pub account_id: Uuid,
    pub target: ParticipantType,
    pub completeness: SignupCompleteness,
}

/// Union of all lifecycle mutations.
#[derive(Debug, Clone)]
pub enum Command {
    CreateAccount(CreateAccount),
    ReactivateAccount(ReactivateAccount),
    AssignParticipantType(AssignParticipantType),
}
