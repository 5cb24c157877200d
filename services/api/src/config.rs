//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// Shortest accepted token signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 16;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub cors_origin: String,
    pub openai_api_key: Option<String>,
    pub completion_model: String,
    pub court_portal_url: String,
    pub court_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_vars(&std::env::vars().collect())
    }

    /// Builds the configuration from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let var = |name: &str| vars.get(name).filter(|v| !v.trim().is_empty()).cloned();

        // --- Server and Database Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = var("DATABASE_URL");

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Authentication ---
        let jwt_secret =
            var("JWT_SECRET").ok_or_else(|| ConfigError::MissingVar("JWT_SECRET".to_string()))?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET".to_string(),
                format!("must be at least {} bytes long", MIN_SECRET_LEN),
            ));
        }

        let ttl_days = parse_number::<i64>(var("TOKEN_TTL_DAYS"), "TOKEN_TTL_DAYS", 7)?;
        if ttl_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "TOKEN_TTL_DAYS".to_string(),
                "must be a positive number of days".to_string(),
            ));
        }

        let cors_origin =
            var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        // --- External Services (API key optional) ---
        let openai_api_key = var("OPENAI_API_KEY");
        let completion_model =
            var("COMPLETION_MODEL").unwrap_or_else(|| "gpt-4.1-mini".to_string());
        let court_portal_url = var("COURT_PORTAL_URL").unwrap_or_else(|| {
            "https://pje-consultapublica.tjdft.jus.br/consultapublica".to_string()
        });
        let court_timeout_secs =
            parse_number::<u64>(var("COURT_TIMEOUT_SECS"), "COURT_TIMEOUT_SECS", 10)?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            jwt_secret,
            token_ttl: chrono::Duration::days(ttl_days),
            cors_origin,
            openai_api_key,
            completion_model,
            court_portal_url,
            court_timeout: Duration::from_secs(court_timeout_secs),
        })
    }
}

fn parse_number<T: std::str::FromStr>(
    raw: Option<String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse::<T>().map_err(|_| {
            ConfigError::InvalidValue(name.to_string(), format!("'{}' is not a number", value))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_only_the_secret_is_set() {
        let config = Config::from_vars(&vars(&[("JWT_SECRET", "0123456789abcdef")])).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert!(config.database_url.is_none());
        assert_eq!(config.token_ttl, chrono::Duration::days(7));
        assert_eq!(config.cors_origin, "http://localhost:5173");
        assert_eq!(config.court_timeout, Duration::from_secs(10));
        assert_eq!(config.completion_model, "gpt-4.1-mini");
    }

    #[test]
    fn missing_secret_is_reported() {
        let err = Config::from_vars(&HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(name) if name == "JWT_SECRET"));
    }

    #[test]
    fn short_secret_and_bad_numbers_are_rejected() {
        assert!(Config::from_vars(&vars(&[("JWT_SECRET", "short")])).is_err());
        let err = Config::from_vars(&vars(&[
            ("JWT_SECRET", "0123456789abcdef"),
            ("COURT_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "COURT_TIMEOUT_SECS"));
    }
}
