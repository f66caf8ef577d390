//! Signup completeness evaluation — the single source of truth for whether a
//! profile qualifies for a commerce role.
//!
//! Pure function; type promotion happens elsewhere and must consult this
//! output rather than re-deriving completeness ad hoc.

use crate::account::model::Account;

use super::model::Profile;

/// Evaluation result: which role sections of the profile are filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct SignupCompleteness {
    pub business_complete: bool,
    pub retail_complete: bool,
}

fn present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Evaluate a profile against its account.
///
/// Business completeness requires company name, tax id, and all four
/// required documents; retail completeness requires display name, address,
/// contact, and identity document. All checks trim whitespace first.
/// Accounts outside the vendor commerce flow always evaluate incomplete.
pub fn evaluate(account: &Account, profile: &Profile) -> SignupCompleteness {
    let participant = account.participant_type;
    if participant.is_operator() || participant.is_delivery() {
        return SignupCompleteness::default();
    }

    let docs = &profile.documents;
    let business_complete = present(profile.company_name.as_deref())
        && present(profile.tax_id.as_deref())
        && present(docs.business_registration.as_deref())
        && present(docs.tax_certificate.as_deref())
        && present(docs.bank_passbook.as_deref())
        && present(docs.storefront_photo.as_deref());

    let retail_complete = present(profile.display_name.as_deref())
        && present(profile.display_address.as_deref())
        && present(profile.contact.as_deref())
        && present(profile.identity_document.as_deref());

    SignupCompleteness {
        business_complete,
        retail_complete,
    }
}
