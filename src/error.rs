//! Error types for the identity core.

use uuid::Uuid;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Conflict: {0}")]
    Conflict(#[from] ConflictError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// User-facing input validation errors.
///
/// Messages describe the violated rule, never internal state.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Phone number must contain exactly 10 digits")]
    InvalidPhoneNumber,

    #[error("Challenge code is invalid or expired")]
    InvalidChallengeCode,
}

/// User-facing rule conflicts.
#[derive(Debug, thiserror::Error)]
pub enum ConflictError {
    #[error(
        "Requested participant type {requested} is incompatible with the account's {existing} registration"
    )]
    IncompatibleParticipantType { requested: String, existing: String },

    #[error("Operator accounts must sign in through the admin console")]
    AdminLoginRequired,

    #[error("Signup profile for {target} is not complete")]
    SignupIncomplete { target: String },
}

/// Persistence errors. `NotFound` is internal only — the resolver self-heals
/// via its fallback scan and callers never surface it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Transient store failure: {0}")]
    Transient(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Session issuing/verification errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to sign session claim for account {account_id}: {reason}")]
    Signing { account_id: Uuid, reason: String },

    #[error("Session token rejected: {0}")]
    Verification(String),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
