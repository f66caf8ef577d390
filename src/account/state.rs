//! Account state machine — every login outcome is a pure transition.
//!
//! The nested participant-type / generation / surface conditionals live here
//! as one tagged-union state plus a transition function
//! `(state, event) -> (next state, effect)`. The Lifecycle Manager executes
//! the returned effect; nothing in this module touches storage.

use super::model::{Account, Generation, JoinType, ParticipantType, Surface};
use crate::error::ConflictError;

/// Where an account sits in its lifecycle, as seen by a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    /// No reusable record exists for this (phone, surface).
    NonExistent,
    /// Vendor-surface record created, no role chosen yet.
    Unset,
    /// Customer-surface participant.
    Customer,
    Business,
    Retail,
    BusinessAndRetail,
    Delivery,
    /// Admin/web operator — never reachable through the phone flow.
    Operator,
    /// Soft-deleted, remembering the role it held before deletion.
    SoftDeleted { previous: ParticipantType },
}

impl AccountState {
    /// Map a resolved store row (or its absence) onto the state machine.
    pub fn from_account(account: Option<&Account>) -> Self {
        let Some(account) = account else {
            return Self::NonExistent;
        };
        if account.is_soft_deleted() {
            return Self::SoftDeleted {
                previous: account.participant_type,
            };
        }
        match account.participant_type {
            ParticipantType::Unset => Self::Unset,
            ParticipantType::Customer => Self::Customer,
            ParticipantType::Business => Self::Business,
            ParticipantType::Retail => Self::Retail,
            ParticipantType::BusinessAndRetail => Self::BusinessAndRetail,
            ParticipantType::Delivery => Self::Delivery,
            ParticipantType::AdminOperator | ParticipantType::WebOperator => Self::Operator,
        }
    }

    fn participant_type(&self) -> Option<ParticipantType> {
        match self {
            Self::Unset => Some(ParticipantType::Unset),
            Self::Customer => Some(ParticipantType::Customer),
            Self::Business => Some(ParticipantType::Business),
            Self::Retail => Some(ParticipantType::Retail),
            Self::BusinessAndRetail => Some(ParticipantType::BusinessAndRetail),
            Self::Delivery => Some(ParticipantType::Delivery),
            Self::NonExistent | Self::Operator | Self::SoftDeleted { .. } => None,
        }
    }
}

/// A successful phone verification hitting the state machine.
#[derive(Debug, Clone, Copy)]
pub struct Verification {
    pub surface: Surface,
    pub join_type: Option<JoinType>,
}

/// Mutation the Lifecycle Manager must execute for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Create a fresh current-generation record with this participant type.
    Create { participant_type: ParticipantType },
    /// Flip the record back to active, resetting its participant type.
    Reactivate { reset_to: ParticipantType },
}

/// Result of a transition: the state after the login plus the effect to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: AccountState,
    pub effect: Option<Effect>,
}

/// Whether a join intent may coexist with an already-held participant type.
///
/// Current-generation accounts enforce the delivery / business-or-retail
/// wall; `Unset` is compatible with every intent.
fn join_compatible(existing: ParticipantType, join: JoinType) -> bool {
    if existing.is_delivery() && !join.is_delivery() {
        return false;
    }
    if existing.is_commerce() && join.is_delivery() {
        return false;
    }
    true
}

/// Apply one successful verification to the current state.
///
/// # Errors
///
/// `AdminLoginRequired` for operator accounts, `IncompatibleParticipantType`
/// when a current-generation account's held type and the join intent sit on
/// opposite sides of the delivery wall. Legacy-generation accounts are exempt
/// from the wall.
pub fn transition(
    state: AccountState,
    generation: Option<Generation>,
    event: Verification,
) -> Result<Transition, ConflictError> {
    match state {
        AccountState::Operator => Err(ConflictError::AdminLoginRequired),

        AccountState::NonExistent => {
            let participant_type = match event.surface {
                Surface::Customer => ParticipantType::Customer,
                // The join intent routes the signup flow only; the new record
                // is always unset (deferred assignment).
                Surface::Vendor => ParticipantType::Unset,
            };
            Ok(Transition {
                next: AccountState::from_participant(participant_type),
                effect: Some(Effect::Create { participant_type }),
            })
        }

        AccountState::SoftDeleted { previous } => {
            if previous.is_operator() {
                return Err(ConflictError::AdminLoginRequired);
            }
            let reset_to = match (event.surface, previous) {
                (Surface::Customer, _) => ParticipantType::Customer,
                // Delivery has no document-gated signup, so a deleted
                // delivery account comes back as delivery.
                (Surface::Vendor, ParticipantType::Delivery) => ParticipantType::Delivery,
                (Surface::Vendor, _) => ParticipantType::Unset,
            };
            if let Some(join) = event.join_type {
                if generation == Some(Generation::Current) && !join_compatible(reset_to, join) {
                    return Err(ConflictError::IncompatibleParticipantType {
                        requested: join.to_string(),
                        existing: reset_to.to_string(),
                    });
                }
            }
            Ok(Transition {
                next: AccountState::from_participant(reset_to),
                effect: Some(Effect::Reactivate { reset_to }),
            })
        }

        _ => {
            let existing = state
                .participant_type()
                .unwrap_or(ParticipantType::Unset);
            if let Some(join) = event.join_type {
                if generation == Some(Generation::Current) && !join_compatible(existing, join) {
                    return Err(ConflictError::IncompatibleParticipantType {
                        requested: join.to_string(),
                        existing: existing.to_string(),
                    });
                }
            }
            Ok(Transition {
                next: state,
                effect: None,
            })
        }
    }
}

impl AccountState {
    fn from_participant(participant_type: ParticipantType) -> Self {
        match participant_type {
            ParticipantType::Unset => Self::Unset,
            ParticipantType::Customer => Self::Customer,
            ParticipantType::Business => Self::Business,
            ParticipantType::Retail => Self::Retail,
            ParticipantType::BusinessAndRetail => Self::BusinessAndRetail,
            ParticipantType::Delivery => Self::Delivery,
            ParticipantType::AdminOperator | ParticipantType::WebOperator => Self::Operator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor_event(join: Option<JoinType>) -> Verification {
        Verification {
            surface: Surface::Vendor,
            join_type: join,
        }
    }

    #[test]
    fn nonexistent_vendor_creates_unset_regardless_of_join() {
        for join in [
            None,
            Some(JoinType::Business),
            Some(JoinType::Retail),
            Some(JoinType::BusinessAndRetail),
            Some(JoinType::Delivery),
        ] {
            let t = transition(AccountState::NonExistent, None, vendor_event(join)).unwrap();
            assert_eq!(t.next, AccountState::Unset);
            assert_eq!(
                t.effect,
                Some(Effect::Create {
                    participant_type: ParticipantType::Unset
                })
            );
        }
    }

    #[test]
    fn nonexistent_customer_creates_customer_participant() {
        let t = transition(
            AccountState::NonExistent,
            None,
            Verification {
                surface: Surface::Customer,
                join_type: None,
            },
        )
        .unwrap();
        assert_eq!(t.next, AccountState::Customer);
        assert_eq!(
            t.effect,
            Some(Effect::Create {
                participant_type: ParticipantType::Customer
            })
        );
    }

    #[test]
    fn soft_deleted_vendor_reactivates_to_unset() {
        for previous in [
            ParticipantType::Unset,
            ParticipantType::Business,
            ParticipantType::Retail,
            ParticipantType::BusinessAndRetail,
        ] {
            let t = transition(
                AccountState::SoftDeleted { previous },
                Some(Generation::Current),
                vendor_event(None),
            )
            .unwrap();
            assert_eq!(t.next, AccountState::Unset);
            assert_eq!(
                t.effect,
                Some(Effect::Reactivate {
                    reset_to: ParticipantType::Unset
                })
            );
        }
    }

    #[test]
    fn soft_deleted_delivery_reactivates_to_delivery() {
        let t = transition(
            AccountState::SoftDeleted {
                previous: ParticipantType::Delivery,
            },
            Some(Generation::Current),
            vendor_event(Some(JoinType::Delivery)),
        )
        .unwrap();
        assert_eq!(t.next, AccountState::Delivery);
        assert_eq!(
            t.effect,
            Some(Effect::Reactivate {
                reset_to: ParticipantType::Delivery
            })
        );
    }

    #[test]
    fn soft_deleted_delivery_rejects_commerce_join() {
        let err = transition(
            AccountState::SoftDeleted {
                previous: ParticipantType::Delivery,
            },
            Some(Generation::Current),
            vendor_event(Some(JoinType::Business)),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConflictError::IncompatibleParticipantType { .. }
        ));
    }

    #[test]
    fn soft_deleted_customer_reactivates_to_customer() {
        let t = transition(
            AccountState::SoftDeleted {
                previous: ParticipantType::Customer,
            },
            Some(Generation::Current),
            Verification {
                surface: Surface::Customer,
                join_type: None,
            },
        )
        .unwrap();
        assert_eq!(t.next, AccountState::Customer);
        assert_eq!(
            t.effect,
            Some(Effect::Reactivate {
                reset_to: ParticipantType::Customer
            })
        );
    }

    #[test]
    fn current_delivery_rejects_commerce_join() {
        let err = transition(
            AccountState::Delivery,
            Some(Generation::Current),
            vendor_event(Some(JoinType::Business)),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConflictError::IncompatibleParticipantType { .. }
        ));
    }

    #[test]
    fn current_commerce_rejects_delivery_join() {
        for state in [
            AccountState::Business,
            AccountState::Retail,
            AccountState::BusinessAndRetail,
        ] {
            let err = transition(
                state,
                Some(Generation::Current),
                vendor_event(Some(JoinType::Delivery)),
            )
            .unwrap_err();
            assert!(matches!(
                err,
                ConflictError::IncompatibleParticipantType { .. }
            ));
        }
    }

    #[test]
    fn legacy_accounts_are_exempt_from_the_wall() {
        let t = transition(
            AccountState::Retail,
            Some(Generation::Legacy),
            vendor_event(Some(JoinType::Delivery)),
        )
        .unwrap();
        assert_eq!(t.next, AccountState::Retail);
        assert_eq!(t.effect, None);
    }

    #[test]
    fn unset_accepts_every_join() {
        for join in [
            JoinType::Business,
            JoinType::Retail,
            JoinType::BusinessAndRetail,
            JoinType::Delivery,
        ] {
            let t = transition(
                AccountState::Unset,
                Some(Generation::Current),
                vendor_event(Some(join)),
            )
            .unwrap();
            assert_eq!(t.next, AccountState::Unset);
            assert_eq!(t.effect, None, "join {join} must not mutate an unset account");
        }
    }

    #[test]
    fn operators_never_pass() {
        assert!(matches!(
            transition(
                AccountState::Operator,
                Some(Generation::Current),
                vendor_event(None)
            ),
            Err(ConflictError::AdminLoginRequired)
        ));
        assert!(matches!(
            transition(
                AccountState::SoftDeleted {
                    previous: ParticipantType::AdminOperator
                },
                Some(Generation::Current),
                vendor_event(None)
            ),
            Err(ConflictError::AdminLoginRequired)
        ));
    }

    #[test]
    fn matching_join_on_typed_account_is_a_plain_login() {
        let t = transition(
            AccountState::Business,
            Some(Generation::Current),
            vendor_event(Some(JoinType::Business)),
        )
        .unwrap();
        assert_eq!(t.next, AccountState::Business);
        assert_eq!(t.effect, None);
    }
}
