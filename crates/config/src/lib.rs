//! Configuration module for the SRS backend.

use serde::Deserialize;
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// JWT secret for token signing
    pub jwt_secret: String,
    /// Address to bind the server to
    pub bind_address: String,
    /// Shared admin key for the audit endpoint. Empty disables it.
    pub admin_api_key: String,
    /// Decay factor applied per hop during credit propagation (spec §4.5).
    pub propagation_decay: f64,
    /// Minimum credit magnitude below which propagation stops (spec §4.5).
    pub propagation_min_credit: f64,
    /// Requests per second permitted on `/srs/reviews` per client.
    pub review_rate_limit_per_sec: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env_var("DATABASE_URL")?,
            jwt_secret: env_var("JWT_SECRET")?,
            bind_address: env_var_or("BIND_ADDRESS", "0.0.0.0:8080"),
            admin_api_key: env_var_or("ADMIN_API_KEY", ""),
            propagation_decay: env_var_parsed_or("PROPAGATION_DECAY", 0.5)?,
            propagation_min_credit: env_var_parsed_or("PROPAGATION_MIN_CREDIT", 0.01)?,
            review_rate_limit_per_sec: env_var_parsed_or("REVIEW_RATE_LIMIT_PER_SEC", 10)?,
        })
    }
}

fn env_var(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn env_var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_var_parsed_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_or_uses_default() {
        let val = env_var_or("NON_EXISTENT_VAR_12345", "default_value");
        assert_eq!(val, "default_value");
    }
}
