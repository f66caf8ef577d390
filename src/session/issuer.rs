//! Session issuing — fixes the claim contract, delegates the signature.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};

use crate::account::model::Account;
use crate::error::SessionError;

use super::claims::SessionClaim;

/// The external signing primitive. The core never touches key material
/// beyond handing the claim to an implementation of this trait.
pub trait TokenSigner: Send + Sync {
    fn sign(&self, claim: &SessionClaim) -> Result<String, SessionError>;

    fn verify(&self, token: &str) -> Result<SessionClaim, SessionError>;
}

/// HS256 signer over a shared secret.
pub struct JwtSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtSigner {
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }
}

impl TokenSigner for JwtSigner {
    fn sign(&self, claim: &SessionClaim) -> Result<String, SessionError> {
        encode(&Header::new(Algorithm::HS256), claim, &self.encoding).map_err(|e| {
            SessionError::Signing {
                account_id: claim.account_id,
                reason: e.to_string(),
            }
        })
    }

    fn verify(&self, token: &str) -> Result<SessionClaim, SessionError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<SessionClaim>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| SessionError::Verification(e.to_string()))
    }
}

/// An issued session: the signed token plus its decoded claim.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claim: SessionClaim,
}

/// Issues session claims for verified accounts.
pub struct SessionIssuer {
    signer: Arc<dyn TokenSigner>,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(signer: Arc<dyn TokenSigner>, ttl: Duration) -> Self {
        Self { signer, ttl }
    }

    /// Issue a session for the account.
    pub fn issue(&self, account: &Account) -> Result<IssuedSession, SessionError> {
        let claim = SessionClaim::for_account(account, Utc::now(), self.ttl);
        let token = self.signer.sign(&claim)?;
        Ok(IssuedSession { token, claim })
    }

    /// Verify a presented token and return its claim.
    pub fn verify(&self, token: &str) -> Result<SessionClaim, SessionError> {
        self.signer.verify(token)
    }
}
