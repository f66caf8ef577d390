//! Vendor registration profile — the data gating commerce-role assignment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Review state of a submitted business registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// The four documents a business registration must upload.
///
/// Each field holds the stored object key, or `None`/blank while missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequiredDocuments {
    pub business_registration: Option<String>,
    pub tax_certificate: Option<String>,
    pub bank_passbook: Option<String>,
    pub storefront_photo: Option<String>,
}

/// Extended registration data for vendor-surface accounts holding (or
/// working toward) a business/retail role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub account_id: Uuid,

    // Business section.
    pub company_name: Option<String>,
    pub tax_id: Option<String>,
    pub documents: RequiredDocuments,

    // Retail section.
    pub display_name: Option<String>,
    pub display_address: Option<String>,
    pub contact: Option<String>,
    pub identity_document: Option<String>,

    pub approval_state: ApprovalState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Empty profile shell for a freshly created account.
    pub fn empty(account_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            account_id,
            company_name: None,
            tax_id: None,
            documents: RequiredDocuments::default(),
            display_name: None,
            display_address: None,
            contact: None,
            identity_document: None,
            approval_state: ApprovalState::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
