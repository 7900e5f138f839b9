//! Client configuration
//!
//! One [`ClientConfig`] wires up both transports: the HTTP endpoint for
//! queries and mutations, and the realtime endpoint for subscriptions.
//! Loaded from TOML; `validate()` runs before any request is made so a bad
//! deployment fails at startup, not on first use.

use agora_core::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

/// How requests authenticate against the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Shared API key. Carries no user identity: entry to the forum views
    /// is refused because comment ownership needs an authenticated user.
    ApiKey {
        /// The key sent in the `x-api-key` header.
        key: String,
    },
    /// Bearer token issued by the hosted auth service for one user.
    Bearer {
        /// Username the token was issued for.
        username: String,
        /// The token sent in the `Authorization` header.
        token: String,
    },
}

/// Configuration for the hosted-backend transports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// GraphQL HTTP endpoint (queries and mutations).
    pub api_url: String,
    /// Realtime WebSocket endpoint (subscriptions).
    pub realtime_url: String,
    /// Request authentication.
    pub auth: AuthMode,
    /// Per-request timeout for queries and mutations, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Connect + handshake timeout for the realtime socket, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl ClientConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&text)
    }

    /// Check that every field is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let api: Url = self
            .api_url
            .parse()
            .map_err(|e| ConfigError::invalid("api_url", format!("{e}")))?;
        if api.scheme() != "http" && api.scheme() != "https" {
            return Err(ConfigError::invalid("api_url", "expected http or https"));
        }

        let realtime: Url = self
            .realtime_url
            .parse()
            .map_err(|e| ConfigError::invalid("realtime_url", format!("{e}")))?;
        if realtime.scheme() != "ws" && realtime.scheme() != "wss" {
            return Err(ConfigError::invalid("realtime_url", "expected ws or wss"));
        }

        match &self.auth {
            AuthMode::ApiKey { key } if key.is_empty() => {
                return Err(ConfigError::invalid("auth.key", "must not be empty"));
            }
            AuthMode::Bearer { username, token } => {
                if username.is_empty() {
                    return Err(ConfigError::invalid("auth.username", "must not be empty"));
                }
                if token.is_empty() {
                    return Err(ConfigError::invalid("auth.token", "must not be empty"));
                }
            }
            _ => {}
        }

        if self.request_timeout_ms == 0 {
            return Err(ConfigError::invalid("request_timeout_ms", "must be > 0"));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::invalid("connect_timeout_ms", "must be > 0"));
        }
        Ok(())
    }

    /// Per-request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bearer_config() -> ClientConfig {
        ClientConfig {
            api_url: "https://forum.example.com/graphql".into(),
            realtime_url: "wss://forum.example.com/realtime".into(),
            auth: AuthMode::Bearer {
                username: "alice".into(),
                token: "tok".into(),
            },
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = ClientConfig::from_toml_str(
            r#"
            api_url = "https://forum.example.com/graphql"
            realtime_url = "wss://forum.example.com/realtime"

            [auth.bearer]
            username = "alice"
            token = "tok"
            "#,
        )
        .unwrap();
        assert_eq!(config.request_timeout_ms, 10_000);
        assert!(matches!(config.auth, AuthMode::Bearer { .. }));
    }

    #[test]
    fn test_validate_accepts_good_config() {
        assert!(bearer_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_schemes() {
        let mut config = bearer_config();
        config.api_url = "ftp://x".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "api_url", .. })
        ));

        let mut config = bearer_config();
        config.realtime_url = "https://not-a-socket".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "realtime_url", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_credentials() {
        let mut config = bearer_config();
        config.auth = AuthMode::ApiKey { key: String::new() };
        assert!(config.validate().is_err());

        let mut config = bearer_config();
        config.auth = AuthMode::Bearer {
            username: String::new(),
            token: "tok".into(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = bearer_config();
        config.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
