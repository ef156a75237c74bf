//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::api::ApiConfig;
use crate::error::ConfigError;
use crate::onboarding::SessionConfig;

const DEFAULT_API_URL: &str = "http://localhost:8010/api/v1";
const DEFAULT_API_KEY: &str = "SPARK_ALP25";
const DEFAULT_TYPING_DELAY_MS: u64 = 1200;
const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PORT: u16 = 8080;

/// Full application configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    /// Port for the client-facing HTTP server.
    pub port: u16,
}

impl AppConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("KAIROS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "KAIROS_API_URL".to_string(),
                message: format!("expected an http(s) URL, got {base_url:?}"),
            });
        }

        let api_key = lookup("KAIROS_API_KEY").unwrap_or_else(|| DEFAULT_API_KEY.to_string());

        let user_token = lookup("KAIROS_USER_TOKEN")
            .filter(|s| !s.trim().is_empty())
            .map(SecretString::from);

        let zip_code = lookup("KAIROS_USER_ZIP")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let typing_delay_ms: u64 = lookup("KAIROS_TYPING_DELAY_MS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TYPING_DELAY_MS);

        let timeout_secs: u64 = lookup("KAIROS_API_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_API_TIMEOUT_SECS);

        let port: u16 = lookup("KAIROS_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            api: ApiConfig {
                base_url,
                api_key: SecretString::from(api_key),
                user_token,
                timeout: Duration::from_secs(timeout_secs),
            },
            session: SessionConfig {
                typing_delay: Duration::from_millis(typing_delay_ms),
                zip_code,
            },
            port,
        })
    }
}
