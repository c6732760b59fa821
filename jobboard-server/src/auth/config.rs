use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::ConfigError;

/// Ten years
const MAX_TTL_SECS: u64 = 315_360_000;

/// Signing configuration for access and refresh tokens
#[derive(Debug, Deserialize)]
pub struct TokenConfig {
    /// HMAC secret for access tokens
    pub access_secret: SecretString,

    /// HMAC secret for refresh tokens. Must differ from `access_secret`.
    pub refresh_secret: SecretString,

    /// Access token lifetime in seconds (default: 900 = 15 minutes)
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,

    /// Refresh token lifetime in seconds (default: 2592000 = 30 days)
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: u64,

    /// JWT issuer claim
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

impl TokenConfig {
    /// # Errors
    ///
    /// Fails when a secret is empty, both secrets are equal, or a TTL is zero
    /// or longer than ten years.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let access = self.access_secret.expose_secret();
        let refresh = self.refresh_secret.expose_secret();

        if access.is_empty() || refresh.is_empty() {
            return Err(ConfigError::Invalid(
                "token.access_secret and token.refresh_secret must be set".to_string(),
            ));
        }
        if access == refresh {
            return Err(ConfigError::Invalid(
                "token.access_secret and token.refresh_secret must differ".to_string(),
            ));
        }
        if self.access_ttl_secs == 0 || self.refresh_ttl_secs == 0 {
            return Err(ConfigError::Invalid("token TTLs must be positive".to_string()));
        }
        if self.access_ttl_secs > MAX_TTL_SECS || self.refresh_ttl_secs > MAX_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "token TTLs must not exceed {MAX_TTL_SECS} seconds"
            )));
        }

        Ok(())
    }
}

/// `SameSite` attribute as written in configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    #[default]
    Lax,
    None,
}

/// Session cookie attributes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CookieConfig {
    /// Cookie domain; ignored unless it is a bare hostname
    #[serde(default)]
    pub domain: Option<String>,

    /// Defaults to true in production
    #[serde(default)]
    pub secure: Option<bool>,

    #[serde(default)]
    pub same_site: SameSitePolicy,
}

fn default_access_ttl_secs() -> u64 {
    900
}

fn default_refresh_ttl_secs() -> u64 {
    2_592_000
}

fn default_issuer() -> String {
    "jobboard".to_string()
}
