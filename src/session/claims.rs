//! Session claim contract.
//!
//! The claim carries identity only: account id, phone number, participant
//! type, and validity window. Profile data and credential secrets are
//! deliberately unrepresentable here.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::model::{Account, ParticipantType};

/// Signed session contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaim {
    pub account_id: Uuid,
    pub phone_number: String,
    pub participant_type: ParticipantType,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl SessionClaim {
    /// Build a claim for an account, valid for `ttl` from `now`.
    pub fn for_account(account: &Account, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            account_id: account.id,
            phone_number: account.phone_number.clone(),
            participant_type: account.participant_type,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
