//! Configuration types.

use chrono::Duration;

use crate::error::ConfigError;

/// Identity service configuration.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Service name for identification.
    pub name: String,
    /// HTTP listen port.
    pub listen_port: u16,
    /// Path to the local database file.
    pub db_path: String,
    /// How long an issued session stays valid.
    pub session_ttl: Duration,
    /// How long a login challenge stays valid.
    pub challenge_ttl: Duration,
    /// Number of digits in a challenge code.
    pub challenge_digits: usize,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: "market-identity".to_string(),
            listen_port: 8080,
            db_path: "./data/market-identity.db".to_string(),
            session_ttl: Duration::hours(12),
            challenge_ttl: Duration::minutes(5),
            challenge_digits: 6,
        }
    }
}

impl IdentityConfig {
    /// Build a config from `MARKET_IDENTITY_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(port) = std::env::var("MARKET_IDENTITY_PORT") {
            config.listen_port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "MARKET_IDENTITY_PORT".to_string(),
                message: format!("not a port number: {port}"),
            })?;
        }
        if let Ok(path) = std::env::var("MARKET_IDENTITY_DB_PATH") {
            config.db_path = path;
        }
        if let Ok(hours) = std::env::var("MARKET_IDENTITY_SESSION_TTL_HOURS") {
            let hours: i64 = hours.parse().map_err(|_| ConfigError::InvalidValue {
                key: "MARKET_IDENTITY_SESSION_TTL_HOURS".to_string(),
                message: format!("not a number of hours: {hours}"),
            })?;
            config.session_ttl = Duration::hours(hours);
        }

        Ok(config)
    }
}
