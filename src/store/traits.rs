//! Persistence contracts for accounts, profiles, and login challenges.
//!
//! The resolver and lifecycle manager are written against these explicit
//! index lookups — by id, by (phone, surface), and by phone alone — never
//! against a full-table scan.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::account::model::{Account, Surface};
use crate::error::StoreError;
use crate::profile::Profile;

/// Outcome of a conditional create keyed on
/// (phone_number, surface, generation = current).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The row was inserted.
    Created,
    /// Another writer holds the key; the caller must re-resolve and adopt
    /// the winner's record.
    Conflict,
}

/// Account persistence with the index contract the core requires.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Exact-surface index: rows tagged with this surface, any lifecycle
    /// state. Untagged legacy rows are not covered here.
    async fn find_by_phone_and_surface(
        &self,
        phone_number: &str,
        surface: Surface,
    ) -> Result<Vec<Account>, StoreError>;

    /// Phone-only index: every row sharing the number, tagged or not.
    async fn find_by_phone(&self, phone_number: &str) -> Result<Vec<Account>, StoreError>;

    /// Insert unless an active-key conflict exists. Never clobbers the
    /// winner of a concurrent create.
    async fn create_if_absent(&self, account: &Account) -> Result<CreateOutcome, StoreError>;

    async fn update_account(&self, account: &Account) -> Result<(), StoreError>;
}

/// Profile persistence, keyed by account id.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, account_id: Uuid) -> Result<Option<Profile>, StoreError>;

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StoreError>;
}

/// Login challenge persistence. One live challenge per (phone, surface);
/// issuing a new one replaces it.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    async fn put_challenge(
        &self,
        phone_number: &str,
        surface: Surface,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Consume the challenge if `code` matches and it has not expired.
    /// Returns whether it matched; the row is deleted on success.
    async fn take_challenge(
        &self,
        phone_number: &str,
        surface: Surface,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}
