//! Account data model — surfaces, generations, participant types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Client application family an account is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Customer,
    Vendor,
}

impl std::fmt::Display for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Vendor => write!(f, "vendor"),
        }
    }
}

/// Account generation. `Legacy` rows predate the current type-exclusivity
/// rules and are exempt from them; `Current` rows are fully constrained.
/// Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generation {
    Legacy,
    Current,
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Current => write!(f, "current"),
        }
    }
}

/// The account's registered role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantType {
    /// Created but no role chosen yet (vendor surface only).
    Unset,
    Business,
    Retail,
    BusinessAndRetail,
    Delivery,
    /// Customer-surface participant.
    Customer,
    /// Back-office operator; never authenticates through the phone flow.
    AdminOperator,
    /// Web console operator; never authenticates through the phone flow.
    WebOperator,
}

impl ParticipantType {
    /// Whether this is one of the document-gated commerce roles.
    pub fn is_commerce(&self) -> bool {
        matches!(self, Self::Business | Self::Retail | Self::BusinessAndRetail)
    }

    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery)
    }

    /// Operator roles are excluded from the phone login flow entirely.
    pub fn is_operator(&self) -> bool {
        matches!(self, Self::AdminOperator | Self::WebOperator)
    }
}

impl std::fmt::Display for ParticipantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unset => "unset",
            Self::Business => "business",
            Self::Retail => "retail",
            Self::BusinessAndRetail => "business_and_retail",
            Self::Delivery => "delivery",
            Self::Customer => "customer",
            Self::AdminOperator => "admin_operator",
            Self::WebOperator => "web_operator",
        };
        write!(f, "{s}")
    }
}

/// Join intent supplied at login. Routes the client to the matching signup
/// flow; never assigns a participant type by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    Business,
    Retail,
    BusinessAndRetail,
    Delivery,
}

impl JoinType {
    /// The participant type this intent eventually leads to once signup
    /// completes.
    pub fn target_type(&self) -> ParticipantType {
        match self {
            Self::Business => ParticipantType::Business,
            Self::Retail => ParticipantType::Retail,
            Self::BusinessAndRetail => ParticipantType::BusinessAndRetail,
            Self::Delivery => ParticipantType::Delivery,
        }
    }

    /// Whether this intent sits on the delivery side of the
    /// delivery / business-or-retail wall.
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery)
    }
}

impl std::fmt::Display for JoinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Business => "business",
            Self::Retail => "retail",
            Self::BusinessAndRetail => "business_and_retail",
            Self::Delivery => "delivery",
        };
        write!(f, "{s}")
    }
}

/// Whether the account is live or soft-deleted. Soft-deleted rows are never
/// physically removed and stay reusable for reactivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Active,
    SoftDeleted,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::SoftDeleted => write!(f, "soft_deleted"),
        }
    }
}

/// A stored account.
///
/// `surface` is `None` only on legacy rows that were written before surface
/// tagging existed; current-generation rows are always tagged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    /// Normalized 10-digit phone number.
    pub phone_number: String,
    pub generation: Generation,
    pub surface: Option<Surface>,
    pub participant_type: ParticipantType,
    pub lifecycle_state: LifecycleState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_address: Option<String>,
}

impl Account {
    /// Build a fresh current-generation account.
    pub fn new_current(
        phone_number: &str,
        surface: Surface,
        participant_type: ParticipantType,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            phone_number: phone_number.to_string(),
            generation: Generation::Current,
            surface: Some(surface),
            participant_type,
            lifecycle_state: LifecycleState::Active,
            created_at: now,
            updated_at: now,
            notification_address: None,
        }
    }

    pub fn is_soft_deleted(&self) -> bool {
        self.lifecycle_state == LifecycleState::SoftDeleted
    }

    /// Whether this row may serve the given surface: tagged rows serve their
    /// own surface only, untagged legacy rows serve either.
    pub fn serves_surface(&self, surface: Surface) -> bool {
        match self.surface {
            Some(s) => s == surface,
            None => self.generation == Generation::Legacy,
        }
    }
}

/// Secret-free account representation returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountView {
    pub id: Uuid,
    pub phone_number: String,
    pub generation: Generation,
    pub surface: Option<Surface>,
    pub participant_type: ParticipantType,
    pub lifecycle_state: LifecycleState,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            phone_number: account.phone_number.clone(),
            generation: account.generation,
            surface: account.surface,
            participant_type: account.participant_type,
            lifecycle_state: account.lifecycle_state,
            created_at: account.created_at,
        }
    }
}
