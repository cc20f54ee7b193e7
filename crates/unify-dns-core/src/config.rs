//! Provider configuration
//!
//! One `ProviderConfig` per deployment stack, immutable for the lifetime of
//! a provider instance. A new config requires a fresh provider. The API
//! token is never rendered by `Debug` and the config is deliberately not
//! serializable, so it cannot leak into persisted state.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use url::Url;

/// Bearer credential for the controller API
///
/// Wraps the secret so that derived `Debug` output on surrounding structs
/// stays redacted.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct ApiToken(String);

impl ApiToken {
    /// Create a token from a secret string (typically an env var lookup
    /// performed by the excluded config loader)
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Expose the secret for request signing
    ///
    /// The returned value must never be logged
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

/// Configuration for one controller endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// HTTPS endpoint of the controller (e.g. `https://unifi/`)
    pub base_url: Url,

    /// Bearer credential; sourced from an environment variable reference by
    /// the excluded config loader, never persisted in clear state
    pub api_token: ApiToken,

    /// Controller site the records live under
    #[serde(default = "default_site")]
    pub site: String,

    /// Verify the controller's TLS certificate. Defaults to false: private
    /// controllers commonly run with self-signed certificates.
    #[serde(default)]
    pub verify_ssl: bool,
}

impl ProviderConfig {
    /// Create a configuration with default site and TLS settings
    pub fn new(base_url: Url, api_token: ApiToken) -> Self {
        Self {
            base_url,
            api_token,
            site: default_site(),
            verify_ssl: false,
        }
    }

    /// Set the controller site
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    /// Enable or disable TLS certificate verification
    pub fn with_verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = verify_ssl;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_token.is_empty() {
            return Err(Error::config("API token cannot be empty"));
        }

        match self.base_url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(Error::config(format!(
                    "base_url must use http or https, got '{scheme}'"
                )));
            }
        }

        if self.site.is_empty() {
            return Err(Error::config("site cannot be empty"));
        }

        Ok(())
    }
}

fn default_site() -> String {
    "default".to_string()
}
