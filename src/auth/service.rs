//! AuthService — the two login entry points.
//!
//! `request_challenge` answers "who would this login be", issues a challenge
//! code, and never mutates accounts. `verify_challenge` runs the full
//! sequence: challenge check, lifecycle resolution, completeness, dashboard
//! projection, session issue, and the detached notification-address update.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::account::model::{AccountView, JoinType, ParticipantType, Surface};
use crate::account::resolver::normalize_phone;
use crate::account::LifecycleManager;
use crate::dashboard::{Dashboard, DashboardProjection, project};
use crate::error::{ConflictError, Result, ValidationError};
use crate::notify::NotificationAddressUpdater;
use crate::otp::ChallengeGate;
use crate::profile::Profile;
use crate::session::{SessionClaim, SessionIssuer};
use crate::store::ProfileStore;

/// Response to a challenge request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeResponse {
    /// The issued code. Delivery to the phone is the SMS collaborator's
    /// job; the core only mints the value.
    pub challenge_code: String,
    pub is_new_account: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_type: Option<ParticipantType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
}

/// Response to a successful verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub account: AccountView,
    pub session_token: String,
    #[serde(flatten)]
    pub dashboards: DashboardProjection,
}

/// Orchestrates the login flow over its collaborators.
pub struct AuthService {
    lifecycle: LifecycleManager,
    profiles: Arc<dyn ProfileStore>,
    challenges: Arc<dyn ChallengeGate>,
    issuer: SessionIssuer,
    notifier: NotificationAddressUpdater,
}

impl AuthService {
    pub fn new(
        lifecycle: LifecycleManager,
        profiles: Arc<dyn ProfileStore>,
        challenges: Arc<dyn ChallengeGate>,
        issuer: SessionIssuer,
        notifier: NotificationAddressUpdater,
    ) -> Self {
        Self {
            lifecycle,
            profiles,
            challenges,
            issuer,
            notifier,
        }
    }

    /// Start a login: resolve the identity and issue a challenge code.
    pub async fn request_challenge(
        &self,
        phone_number: &str,
        surface: Surface,
    ) -> Result<ChallengeResponse> {
        let normalized = normalize_phone(phone_number)?;

        let account = self
            .lifecycle
            .resolver()
            .resolve(&normalized, surface)
            .await?;
        if let Some(account) = &account {
            if account.participant_type.is_operator() {
                return Err(ConflictError::AdminLoginRequired.into());
            }
        }

        let challenge_code = self.challenges.issue(&normalized, surface).await?;
        info!(
            phone = %normalized,
            surface = %surface,
            is_new = account.is_none(),
            "Challenge issued"
        );

        Ok(ChallengeResponse {
            challenge_code,
            is_new_account: account.is_none(),
            participant_type: account.as_ref().map(|a| a.participant_type),
            account_id: account.as_ref().map(|a| a.id),
        })
    }

    /// Complete a login: consume the challenge, resolve or create the
    /// account, and issue a session.
    pub async fn verify_challenge(
        &self,
        phone_number: &str,
        code: &str,
        surface: Surface,
        join_type: Option<JoinType>,
        notification_address: Option<String>,
        requested_dashboard: Option<Dashboard>,
    ) -> Result<VerifyResponse> {
        let normalized = normalize_phone(phone_number)?;

        if !self.challenges.verify(&normalized, surface, code).await? {
            return Err(ValidationError::InvalidChallengeCode.into());
        }

        let account = self
            .lifecycle
            .resolve_or_create(&normalized, surface, join_type)
            .await?;

        let profile = self
            .load_profile_if_relevant(account.participant_type, account.id)
            .await?;
        let dashboards = project(&account, profile.as_ref(), requested_dashboard);
        let session = self.issuer.issue(&account)?;

        if let Some(address) = notification_address {
            self.notifier.update_detached(&account, address);
        }

        info!(
            account_id = %account.id,
            surface = %surface,
            participant_type = %account.participant_type,
            "Login verified"
        );

        Ok(VerifyResponse {
            account: AccountView::from(&account),
            session_token: session.token,
            dashboards,
        })
    }

    /// Validate a presented session token and echo its claim.
    pub fn verify_session(&self, token: &str) -> Result<SessionClaim> {
        Ok(self.issuer.verify(token)?)
    }

    async fn load_profile_if_relevant(
        &self,
        participant: ParticipantType,
        account_id: Uuid,
    ) -> Result<Option<Profile>> {
        // Customer, delivery, and operator logins never read a profile.
        if participant.is_commerce() || participant == ParticipantType::Unset {
            Ok(self.profiles.get_profile(account_id).await?)
        } else {
            Ok(None)
        }
    }
}
