//! Phone directory resolver — maps (phone number, surface) to an account.
//!
//! Pure reads against the store's two indices. A multi-candidate result is a
//! data anomaly: the resolver picks deterministically and logs a warning,
//! never errors.

use std::sync::Arc;

use tracing::warn;

use crate::error::{Result, ValidationError};
use crate::store::AccountStore;

use super::model::{Account, ParticipantType, Surface};

/// Strip non-digits and require exactly 10 digits.
pub fn normalize_phone(raw: &str) -> std::result::Result<String, ValidationError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 10 {
        return Err(ValidationError::InvalidPhoneNumber);
    }
    Ok(digits)
}

/// Read-only account lookup by phone number and surface.
#[derive(Clone)]
pub struct PhoneDirectoryResolver {
    store: Arc<dyn AccountStore>,
}

impl PhoneDirectoryResolver {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Find the active account for this login, if one exists.
    ///
    /// Primary: exact-surface index. Fallback: the phone-only index filtered
    /// by surface affinity (untagged legacy rows serve either surface).
    /// Soft-deleted rows never resolve here.
    pub async fn resolve(&self, phone_number: &str, surface: Surface) -> Result<Option<Account>> {
        let normalized = normalize_phone(phone_number)?;

        let primary: Vec<Account> = self
            .store
            .find_by_phone_and_surface(&normalized, surface)
            .await?
            .into_iter()
            .filter(|a| !a.is_soft_deleted())
            .collect();
        if !primary.is_empty() {
            return Ok(pick_one(primary, &normalized, surface));
        }

        let fallback: Vec<Account> = self
            .store
            .find_by_phone(&normalized)
            .await?
            .into_iter()
            .filter(|a| !a.is_soft_deleted() && surface_affinity(a, surface))
            .collect();
        Ok(pick_one(fallback, &normalized, surface))
    }

    /// Like [`resolve`](Self::resolve), but soft-deleted rows qualify too so
    /// the lifecycle manager can reactivate them. Active rows win over
    /// soft-deleted ones.
    pub async fn resolve_reusable(
        &self,
        phone_number: &str,
        surface: Surface,
    ) -> Result<Option<Account>> {
        let normalized = normalize_phone(phone_number)?;

        let primary = self
            .store
            .find_by_phone_and_surface(&normalized, surface)
            .await?;
        if let Some(account) = pick_preferring_active(primary, &normalized, surface) {
            return Ok(Some(account));
        }

        let fallback: Vec<Account> = self
            .store
            .find_by_phone(&normalized)
            .await?
            .into_iter()
            .filter(|a| surface_affinity(a, surface))
            .collect();
        Ok(pick_preferring_active(fallback, &normalized, surface))
    }
}

/// Fallback-scan surface rules: customer logins want customer participants
/// on a customer-tagged or untagged-legacy row; vendor logins want any
/// non-customer participant on a vendor-tagged or untagged-legacy row.
fn surface_affinity(account: &Account, surface: Surface) -> bool {
    if !account.serves_surface(surface) {
        return false;
    }
    match surface {
        Surface::Customer => account.participant_type == ParticipantType::Customer,
        Surface::Vendor => account.participant_type != ParticipantType::Customer,
    }
}

/// Deterministic choice among candidates: most-recently-updated wins, with a
/// consistency warning when more than one qualifies.
fn pick_one(mut candidates: Vec<Account>, phone_number: &str, surface: Surface) -> Option<Account> {
    if candidates.len() > 1 {
        warn!(
            phone = %phone_number,
            surface = %surface,
            count = candidates.len(),
            "Multiple accounts qualify for one login; choosing most recently updated"
        );
    }
    candidates.sort_by_key(|a| std::cmp::Reverse(a.updated_at));
    candidates.into_iter().next()
}

fn pick_preferring_active(
    candidates: Vec<Account>,
    phone_number: &str,
    surface: Surface,
) -> Option<Account> {
    let (active, deleted): (Vec<Account>, Vec<Account>) =
        candidates.into_iter().partition(|a| !a.is_soft_deleted());
    if !active.is_empty() {
        return pick_one(active, phone_number, surface);
    }
    pick_one(deleted, phone_number, surface)
}
