//! Connection settings for the remote CRM API.
//!
//! # Design
//! `Config` is an explicit value handed to `Campaigner::new`; nothing in the
//! crate reads process-wide state after construction. `Config::from_env`
//! exists for binaries and reads `AC_BASE_URL` / `AC_API_TOKEN`.

use std::env;
use std::fmt;

pub const BASE_URL_ENV: &str = "AC_BASE_URL";
pub const API_TOKEN_ENV: &str = "AC_API_TOKEN";

/// Configuration errors. Reported before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("campaigner API token not set")]
    MissingApiToken,

    #[error("campaigner base URL not set")]
    MissingBaseUrl,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub api_token: String,
}

impl Config {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
        }
    }

    /// Read both settings from the environment. Unset variables become empty
    /// strings and are rejected by `validate`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            base_url: env::var(BASE_URL_ENV).unwrap_or_default(),
            api_token: env::var(API_TOKEN_ENV).unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_token.trim().is_empty() {
            return Err(ConfigError::MissingApiToken);
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        Ok(())
    }
}

// The token never appears in logs or debug output.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_rejected_first() {
        let config = Config::new("", "");
        assert_eq!(config.validate(), Err(ConfigError::MissingApiToken));
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let config = Config::new("  ", "secret");
        assert_eq!(config.validate(), Err(ConfigError::MissingBaseUrl));
    }

    #[test]
    fn complete_config_validates() {
        let config = Config::new("http://localhost:3000", "secret");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn debug_hides_the_token() {
        let config = Config::new("http://localhost:3000", "secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("localhost"));
    }
}
