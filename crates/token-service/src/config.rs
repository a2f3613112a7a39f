//! Token service configuration.
//!
//! Configuration is loaded from environment variables. The API secret is
//! held as a `SecretString` and redacted in Debug output.

use common::jwt::DEFAULT_ROOM_TOKEN_TTL;
use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default bind address (the presenter client expects port 6080).
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:6080";

/// API key used when none is configured (media engine dev mode).
pub const DEFAULT_API_KEY: &str = "devkey";

/// Origins allowed when `CORS_ALLOWED_ORIGINS` is not set.
pub const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:5080",
    "http://localhost:6080",
    "http://192.168.69.129:5080",
];

/// Token service configuration.
pub struct Config {
    /// Server bind address (default: "0.0.0.0:6080").
    pub bind_address: String,

    /// API key; becomes the `iss` claim of issued tokens.
    pub api_key: String,

    /// Shared secret used to sign tokens.
    pub api_secret: SecretString,

    /// Lifetime of issued tokens.
    pub token_ttl: Duration,

    /// Browser origins allowed to request tokens.
    pub cors_allowed_origins: Vec<String>,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("TOKEN_SERVICE_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let api_key = vars
            .get("ROOM_API_KEY")
            .cloned()
            .unwrap_or_else(|| DEFAULT_API_KEY.to_string());

        let api_secret = vars
            .get("ROOM_API_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("ROOM_API_SECRET".to_string()))?;

        let token_ttl = match vars.get("ROOM_TOKEN_TTL_SECONDS") {
            Some(value_str) => {
                let secs: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidValue(format!(
                        "ROOM_TOKEN_TTL_SECONDS must be a positive integer, got '{value_str}': {e}"
                    ))
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue(
                        "ROOM_TOKEN_TTL_SECONDS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_ROOM_TOKEN_TTL,
        };

        let cors_allowed_origins = match vars.get("CORS_ALLOWED_ORIGINS") {
            Some(list) => parse_origins(list)?,
            None => DEFAULT_CORS_ORIGINS.iter().map(ToString::to_string).collect(),
        };

        Ok(Self {
            bind_address,
            api_key,
            api_secret: SecretString::from(api_secret.as_str()),
            token_ttl,
            cors_allowed_origins,
        })
    }
}

fn parse_origins(list: &str) -> Result<Vec<String>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            if origin.starts_with("http://") || origin.starts_with("https://") {
                Ok(origin.trim_end_matches('/').to_string())
            } else {
                Err(ConfigError::InvalidValue(format!(
                    "CORS_ALLOWED_ORIGINS entries must be http(s) origins, got '{origin}'"
                )))
            }
        })
        .collect()
}
