//! Room client configuration.
//!
//! Endpoints are passed in explicitly at construction time. When only a host
//! is known, [`ClientConfig::for_host`] derives the signaling and media URLs
//! the way the deployed client does (signaling on port 6080, media on 7880).

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Port the signaling-trust (token) service listens on.
pub const DEFAULT_SIGNALING_PORT: u16 = 6080;

/// Port the media engine accepts websocket connections on.
pub const DEFAULT_MEDIA_PORT: u16 = 7880;

/// Default HTTP timeout for credential and status requests.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default upper bound on transport disconnect during `leave()`.
pub const DEFAULT_DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Room client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the signaling-trust service (credential exchange).
    pub signaling_url: String,

    /// URL handed to the media engine's connector.
    pub media_url: String,

    /// Status update endpoint of the class-scheduling service.
    /// `None` disables status notifications.
    pub status_url: Option<String>,

    /// Timeout for credential and status HTTP requests.
    pub http_timeout: Duration,

    /// Upper bound on waiting for the transport to disconnect during leave.
    pub disconnect_timeout: Duration,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl ClientConfig {
    /// Derive endpoints from the host the client is served from.
    #[must_use]
    pub fn for_host(host: &str) -> Self {
        let host = if host.is_empty() { "localhost" } else { host };

        Self {
            signaling_url: format!("http://{host}:{DEFAULT_SIGNALING_PORT}"),
            media_url: format!("ws://{host}:{DEFAULT_MEDIA_PORT}"),
            status_url: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            disconnect_timeout: DEFAULT_DISCONNECT_TIMEOUT,
        }
    }

    /// Set the status update endpoint.
    #[must_use]
    pub fn with_status_url(mut self, url: impl Into<String>) -> Self {
        self.status_url = Some(url.into());
        self
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set the disconnect timeout.
    #[must_use]
    pub fn with_disconnect_timeout(mut self, timeout: Duration) -> Self {
        self.disconnect_timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let host = vars.get("ROOM_HOST").map_or("localhost", String::as_str);
        let derived = Self::for_host(host);

        let signaling_url = vars
            .get("ROOM_SIGNALING_URL")
            .cloned()
            .unwrap_or(derived.signaling_url);
        if !(signaling_url.starts_with("http://") || signaling_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(format!(
                "ROOM_SIGNALING_URL must be an http(s) URL, got {signaling_url}"
            )));
        }

        let media_url = vars
            .get("ROOM_MEDIA_URL")
            .cloned()
            .unwrap_or(derived.media_url);
        if !(media_url.starts_with("ws://") || media_url.starts_with("wss://")) {
            return Err(ConfigError::InvalidValue(format!(
                "ROOM_MEDIA_URL must be a ws(s) URL, got {media_url}"
            )));
        }

        let status_url = vars
            .get("ROOM_STATUS_URL")
            .filter(|url| !url.is_empty())
            .cloned();

        let http_timeout = parse_millis(vars, "ROOM_HTTP_TIMEOUT_MS")?.unwrap_or(DEFAULT_HTTP_TIMEOUT);
        let disconnect_timeout =
            parse_millis(vars, "ROOM_DISCONNECT_TIMEOUT_MS")?.unwrap_or(DEFAULT_DISCONNECT_TIMEOUT);

        Ok(Self {
            signaling_url: signaling_url.trim_end_matches('/').to_string(),
            media_url,
            status_url,
            http_timeout,
            disconnect_timeout,
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_host("localhost")
    }
}

fn parse_millis(
    vars: &HashMap<String, String>,
    name: &str,
) -> Result<Option<Duration>, ConfigError> {
    vars.get(name)
        .map(|raw| {
            raw.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| ConfigError::InvalidValue(format!("{name}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars_defaults() {
        let config = ClientConfig::from_vars(&HashMap::new()).expect("defaults should load");

        assert_eq!(config.signaling_url, "http://localhost:6080");
        assert_eq!(config.media_url, "ws://localhost:7880");
        assert_eq!(config.status_url, None);
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
        assert_eq!(config.disconnect_timeout, DEFAULT_DISCONNECT_TIMEOUT);
    }

    #[test]
    fn test_from_vars_derives_urls_from_host() {
        let vars = HashMap::from([("ROOM_HOST".to_string(), "192.168.69.129".to_string())]);

        let config = ClientConfig::from_vars(&vars).unwrap();
        assert_eq!(config.signaling_url, "http://192.168.69.129:6080");
        assert_eq!(config.media_url, "ws://192.168.69.129:7880");
    }

    #[test]
    fn test_explicit_urls_override_host() {
        let vars = HashMap::from([
            ("ROOM_HOST".to_string(), "classes.example.com".to_string()),
            (
                "ROOM_SIGNALING_URL".to_string(),
                "https://auth.example.com/".to_string(),
            ),
            (
                "ROOM_MEDIA_URL".to_string(),
                "wss://media.example.com".to_string(),
            ),
            (
                "ROOM_STATUS_URL".to_string(),
                "https://academy.example.com/live-class/status".to_string(),
            ),
            ("ROOM_HTTP_TIMEOUT_MS".to_string(), "2500".to_string()),
            ("ROOM_DISCONNECT_TIMEOUT_MS".to_string(), "750".to_string()),
        ]);

        let config = ClientConfig::from_vars(&vars).unwrap();
        assert_eq!(config.signaling_url, "https://auth.example.com");
        assert_eq!(config.media_url, "wss://media.example.com");
        assert_eq!(
            config.status_url.as_deref(),
            Some("https://academy.example.com/live-class/status")
        );
        assert_eq!(config.http_timeout, Duration::from_millis(2500));
        assert_eq!(config.disconnect_timeout, Duration::from_millis(750));
    }

    #[test]
    fn test_empty_status_url_disables_notifications() {
        let vars = HashMap::from([("ROOM_STATUS_URL".to_string(), String::new())]);
        let config = ClientConfig::from_vars(&vars).unwrap();
        assert_eq!(config.status_url, None);
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let vars = HashMap::from([("ROOM_HTTP_TIMEOUT_MS".to_string(), "soon".to_string())]);
        let result = ClientConfig::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidValue(msg)) if msg.contains("ROOM_HTTP_TIMEOUT_MS"))
        );
    }

    #[test]
    fn test_wrong_url_schemes_rejected() {
        let vars = HashMap::from([(
            "ROOM_MEDIA_URL".to_string(),
            "http://media.example.com".to_string(),
        )]);
        assert!(matches!(
            ClientConfig::from_vars(&vars),
            Err(ConfigError::InvalidValue(_))
        ));

        let vars = HashMap::from([(
            "ROOM_SIGNALING_URL".to_string(),
            "ws://auth.example.com".to_string(),
        )]);
        assert!(matches!(
            ClientConfig::from_vars(&vars),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_builder_methods() {
        let config = ClientConfig::for_host("localhost")
            .with_status_url("http://localhost:9000/status")
            .with_http_timeout(Duration::from_secs(1))
            .with_disconnect_timeout(Duration::from_millis(100));

        assert_eq!(config.status_url.as_deref(), Some("http://localhost:9000/status"));
        assert_eq!(config.http_timeout, Duration::from_secs(1));
        assert_eq!(config.disconnect_timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_for_host_empty_falls_back_to_localhost() {
        assert_eq!(ClientConfig::for_host(""), ClientConfig::default());
    }
}
