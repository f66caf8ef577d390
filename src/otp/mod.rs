//! Login challenge generation and verification.
//!
//! The challenge value itself is an opaque collaborator concern; this module
//! provides the store-backed implementation used in production and the trait
//! seam the auth service consumes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::Rng;

use crate::account::model::Surface;
use crate::error::StoreError;
use crate::store::ChallengeStore;

/// Generates and verifies one-time login challenges.
#[async_trait]
pub trait ChallengeGate: Send + Sync {
    /// Issue a fresh challenge code, replacing any live one for this
    /// (phone, surface).
    async fn issue(&self, phone_number: &str, surface: Surface) -> Result<String, StoreError>;

    /// Check and consume a presented code. A matching unexpired code
    /// verifies exactly once.
    async fn verify(
        &self,
        phone_number: &str,
        surface: Surface,
        code: &str,
    ) -> Result<bool, StoreError>;
}

/// Store-backed challenge gate: random numeric codes with a TTL.
pub struct StoredChallengeGate {
    store: Arc<dyn ChallengeStore>,
    ttl: Duration,
    code_digits: usize,
}

impl StoredChallengeGate {
    pub fn new(store: Arc<dyn ChallengeStore>, ttl: Duration, code_digits: usize) -> Self {
        Self {
            store,
            ttl,
            code_digits,
        }
    }

    fn generate_code(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.code_digits)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }
}

#[async_trait]
impl ChallengeGate for StoredChallengeGate {
    async fn issue(&self, phone_number: &str, surface: Surface) -> Result<String, StoreError> {
        let code = self.generate_code();
        let expires_at = Utc::now() + self.ttl;
        self.store
            .put_challenge(phone_number, surface, &code, expires_at)
            .await?;
        Ok(code)
    }

    async fn verify(
        &self,
        phone_number: &str,
        surface: Surface,
        code: &str,
    ) -> Result<bool, StoreError> {
        let trimmed = code.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Ok(false);
        }
        self.store
            .take_challenge(phone_number, surface, trimmed, Utc::now())
            .await
    }
}
