//! Account lifecycle manager — executes state-machine effects against the
//! store.
//!
//! Every mutation goes through a command object, and the concurrency rules
//! live here: conditional create keyed on (phone, surface, current
//! generation), lose-and-adopt on conflict, one internal retry on a
//! transient store failure.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{ConflictError, Error, Result, StoreError};
use crate::store::{AccountStore, CreateOutcome};

use super::commands::{AssignParticipantType, CreateAccount, ReactivateAccount};
use super::model::{Account, Generation, JoinType, LifecycleState, ParticipantType, Surface};
use super::resolver::{PhoneDirectoryResolver, normalize_phone};
use super::state::{AccountState, Effect, Verification, transition};

/// Coordinates account creation, reactivation, and type assignment.
pub struct LifecycleManager {
    store: Arc<dyn AccountStore>,
    resolver: PhoneDirectoryResolver,
}

impl LifecycleManager {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        let resolver = PhoneDirectoryResolver::new(Arc::clone(&store));
        Self { store, resolver }
    }

    pub fn resolver(&self) -> &PhoneDirectoryResolver {
        &self.resolver
    }

    /// Apply one successful verification: return the matching account,
    /// reactivating or creating as the state machine dictates.
    ///
    /// Repeated calls with the same (phone, surface, join type) before type
    /// assignment return the same record; duplicates are never created.
    pub async fn resolve_or_create(
        &self,
        phone_number: &str,
        surface: Surface,
        join_type: Option<JoinType>,
    ) -> Result<Account> {
        let normalized = normalize_phone(phone_number)?;
        let existing = self.resolver.resolve_reusable(&normalized, surface).await?;

        let state = AccountState::from_account(existing.as_ref());
        let generation = existing.as_ref().map(|a| a.generation);
        let step = transition(state, generation, Verification { surface, join_type })?;

        match (step.effect, existing) {
            (None, Some(account)) => Ok(account),

            (Some(Effect::Reactivate { reset_to }), Some(account)) => {
                self.execute_reactivate(ReactivateAccount {
                    account_id: account.id,
                    reset_to,
                })
                .await
            }

            (Some(Effect::Create { participant_type }), _) => {
                self.execute_create(CreateAccount {
                    phone_number: normalized,
                    surface,
                    participant_type,
                    notification_address: None,
                })
                .await
            }

            // The resolver and the state machine disagree about existence;
            // treat it as a transient read and let the caller retry.
            (None, None) | (Some(Effect::Reactivate { .. }), None) => Err(StoreError::Transient(
                "account disappeared between resolution and transition".to_string(),
            )
            .into()),
        }
    }

    /// Reactivate a soft-deleted account for a login on `surface`.
    ///
    /// Vendor non-delivery history resets to `unset`, customer logins to
    /// `customer`; delivery accounts come back as `delivery`. Already-active
    /// accounts pass through unchanged.
    pub async fn reactivate(&self, account: &Account, surface: Surface) -> Result<Account> {
        if !account.is_soft_deleted() {
            return Ok(account.clone());
        }
        let step = transition(
            AccountState::SoftDeleted {
                previous: account.participant_type,
            },
            Some(account.generation),
            Verification {
                surface,
                join_type: None,
            },
        )?;
        match step.effect {
            Some(Effect::Reactivate { reset_to }) => {
                self.execute_reactivate(ReactivateAccount {
                    account_id: account.id,
                    reset_to,
                })
                .await
            }
            _ => Ok(account.clone()),
        }
    }

    /// Promote an account to the target role. Issued by the external signup
    /// completion step only; the completeness report it carries is
    /// re-checked here, as is the delivery / commerce wall.
    pub async fn assign_participant_type(&self, cmd: AssignParticipantType) -> Result<Account> {
        let Some(mut account) = self.store.get_account(cmd.account_id).await? else {
            return Err(StoreError::NotFound {
                entity: "account".to_string(),
                id: cmd.account_id.to_string(),
            }
            .into());
        };

        if account.is_soft_deleted() || account.participant_type.is_operator() {
            return Err(incompatible(cmd.target, account.participant_type));
        }

        let complete = match cmd.target {
            ParticipantType::Business => cmd.completeness.business_complete,
            ParticipantType::Retail => cmd.completeness.retail_complete,
            ParticipantType::BusinessAndRetail => {
                cmd.completeness.business_complete && cmd.completeness.retail_complete
            }
            ParticipantType::Delivery => true,
            // Unset, customer, and operator roles are not assignment targets.
            _ => return Err(incompatible(cmd.target, account.participant_type)),
        };
        if !complete {
            return Err(ConflictError::SignupIncomplete {
                target: cmd.target.to_string(),
            }
            .into());
        }

        if account.generation == Generation::Current {
            let existing = account.participant_type;
            let crosses = (existing.is_delivery() && cmd.target.is_commerce())
                || (existing.is_commerce() && cmd.target.is_delivery());
            if crosses {
                return Err(incompatible(cmd.target, existing));
            }
        }

        account.participant_type = cmd.target;
        account.updated_at = Utc::now();
        self.store.update_account(&account).await?;
        info!(
            account_id = %account.id,
            participant_type = %account.participant_type,
            "Participant type assigned"
        );
        Ok(account)
    }

    // ── Command execution ───────────────────────────────────────────

    async fn execute_reactivate(&self, cmd: ReactivateAccount) -> Result<Account> {
        let Some(mut account) = self.store.get_account(cmd.account_id).await? else {
            return Err(StoreError::NotFound {
                entity: "account".to_string(),
                id: cmd.account_id.to_string(),
            }
            .into());
        };
        account.lifecycle_state = LifecycleState::Active;
        account.participant_type = cmd.reset_to;
        account.updated_at = Utc::now();
        self.store.update_account(&account).await?;
        info!(
            account_id = %account.id,
            reset_to = %cmd.reset_to,
            "Account reactivated"
        );
        Ok(account)
    }

    async fn execute_create(&self, cmd: CreateAccount) -> Result<Account> {
        let mut account = Account::new_current(
            &cmd.phone_number,
            cmd.surface,
            cmd.participant_type,
            Utc::now(),
        );
        account.notification_address = cmd.notification_address.clone();

        match self.store.create_if_absent(&account).await {
            Ok(CreateOutcome::Created) => {
                info!(
                    account_id = %account.id,
                    surface = %cmd.surface,
                    participant_type = %cmd.participant_type,
                    "Account created"
                );
                Ok(account)
            }
            Ok(CreateOutcome::Conflict) => self.adopt_winner(&cmd.phone_number, cmd.surface).await,
            Err(StoreError::Transient(reason)) => {
                warn!(
                    phone = %cmd.phone_number,
                    %reason,
                    "Transient store failure on conditional create; retrying once"
                );
                // Re-resolve first: the write may have landed.
                if let Some(winner) = self
                    .resolver
                    .resolve_reusable(&cmd.phone_number, cmd.surface)
                    .await?
                {
                    return Ok(winner);
                }
                match self.store.create_if_absent(&account).await? {
                    CreateOutcome::Created => Ok(account),
                    CreateOutcome::Conflict => {
                        self.adopt_winner(&cmd.phone_number, cmd.surface).await
                    }
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// We lost a concurrent first-time create. Re-resolve and return the
    /// winner's record, tolerating one eventually-consistent miss.
    async fn adopt_winner(&self, phone_number: &str, surface: Surface) -> Result<Account> {
        if let Some(winner) = self.resolver.resolve(phone_number, surface).await? {
            return Ok(winner);
        }
        if let Some(winner) = self.resolver.resolve(phone_number, surface).await? {
            return Ok(winner);
        }
        Err(StoreError::Transient(
            "conditional create lost the race but the winning record is not yet visible"
                .to_string(),
        )
        .into())
    }
}

fn incompatible(requested: ParticipantType, existing: ParticipantType) -> Error {
    ConflictError::IncompatibleParticipantType {
        requested: requested.to_string(),
        existing: existing.to_string(),
    }
    .into()
}
