//! Vendor profile data and signup completeness evaluation.

pub mod completeness;
pub mod model;

pub use completeness::{SignupCompleteness, evaluate};
pub use model::{ApprovalState, Profile, RequiredDocuments};
