//! Dashboard/permission projection — which dashboards a login may open.
//!
//! Pure function over the resolved account and its profile. Completeness is
//! always consulted before the stored approval flag so a stale `approved`
//! never surfaces on an incomplete profile.

use serde::{Deserialize, Serialize};

use crate::account::model::{Account, ParticipantType};
use crate::profile::{ApprovalState, Profile, SignupCompleteness, evaluate};

/// Vendor-surface dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dashboard {
    Business,
    Retail,
    Delivery,
}

impl std::fmt::Display for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Business => write!(f, "business"),
            Self::Retail => write!(f, "retail"),
            Self::Delivery => write!(f, "delivery"),
        }
    }
}

/// Where a business registration stands, as shown to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessOnboardingStatus {
    /// No profile yet, or the business section is incomplete.
    NewAccount,
    Pending,
    Approved,
    Rejected,
}

/// Result of projecting an account onto its dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardProjection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_dashboard: Option<Dashboard>,
    pub allowed_dashboards: Vec<Dashboard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_onboarding_status: Option<BusinessOnboardingStatus>,
}

impl DashboardProjection {
    fn empty() -> Self {
        Self {
            active_dashboard: None,
            allowed_dashboards: Vec::new(),
            business_onboarding_status: None,
        }
    }
}

/// Dashboards an assigned type may ever open, business before retail.
fn type_dashboards(participant: ParticipantType) -> &'static [Dashboard] {
    match participant {
        ParticipantType::Business => &[Dashboard::Business],
        ParticipantType::Retail => &[Dashboard::Retail],
        ParticipantType::BusinessAndRetail => &[Dashboard::Business, Dashboard::Retail],
        ParticipantType::Delivery => &[Dashboard::Delivery],
        _ => &[],
    }
}

fn onboarding_status(
    profile: Option<&Profile>,
    completeness: SignupCompleteness,
) -> BusinessOnboardingStatus {
    // Completeness first: a stale approval on an incomplete profile must not
    // show through.
    if !completeness.business_complete {
        return BusinessOnboardingStatus::NewAccount;
    }
    match profile.map(|p| p.approval_state) {
        Some(ApprovalState::Pending) | None => BusinessOnboardingStatus::Pending,
        Some(ApprovalState::Approved) => BusinessOnboardingStatus::Approved,
        Some(ApprovalState::Rejected) => BusinessOnboardingStatus::Rejected,
    }
}

/// Compute the dashboards this login may see.
pub fn project(
    account: &Account,
    profile: Option<&Profile>,
    requested: Option<Dashboard>,
) -> DashboardProjection {
    match account.participant_type {
        // Customer-surface and operator logins have no dashboards.
        ParticipantType::Customer
        | ParticipantType::AdminOperator
        | ParticipantType::WebOperator => DashboardProjection::empty(),

        ParticipantType::Delivery => DashboardProjection {
            active_dashboard: Some(Dashboard::Delivery),
            allowed_dashboards: vec![Dashboard::Delivery],
            business_onboarding_status: None,
        },

        // No role yet: the client shows the signup flow for the requested
        // dashboard (retail by default); nothing is accessible.
        ParticipantType::Unset => DashboardProjection {
            active_dashboard: Some(requested.unwrap_or(Dashboard::Retail)),
            allowed_dashboards: Vec::new(),
            business_onboarding_status: None,
        },

        ParticipantType::Business
        | ParticipantType::Retail
        | ParticipantType::BusinessAndRetail => {
            let completeness = profile
                .map(|p| evaluate(account, p))
                .unwrap_or_default();

            let type_allowed = type_dashboards(account.participant_type);
            let allowed: Vec<Dashboard> = type_allowed
                .iter()
                .copied()
                .filter(|d| match d {
                    Dashboard::Business => completeness.business_complete,
                    Dashboard::Retail => completeness.retail_complete,
                    Dashboard::Delivery => false,
                })
                .collect();

            let active = requested
                .filter(|d| allowed.contains(d))
                .or_else(|| allowed.first().copied())
                .or_else(|| type_allowed.first().copied());

            let business_onboarding_status = if matches!(
                account.participant_type,
                ParticipantType::Business | ParticipantType::BusinessAndRetail
            ) {
                Some(onboarding_status(profile, completeness))
            } else {
                None
            };

            DashboardProjection {
                active_dashboard: active,
                allowed_dashboards: allowed,
                business_onboarding_status,
            }
        }
    }
}
