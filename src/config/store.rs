//! Store configuration

use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::environment::Environment;
use super::error::ValidationError;
use crate::adapters::pocketbase::{PocketBaseConfig, DEFAULT_ADMIN_COLLECTION};

/// PocketBase connection and admin credentials
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the PocketBase instance
    pub url: String,

    /// Admin identity used for provisioning and privileged reads
    #[serde(default)]
    pub admin_email: String,

    #[serde(default = "default_admin_password")]
    pub admin_password: SecretString,

    /// Auth collection holding the admin account
    #[serde(default = "default_admin_collection")]
    pub admin_collection: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl StoreConfig {
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parses the base URL. Only http and https are accepted.
    pub fn base_url(&self) -> Result<Url, ValidationError> {
        let url =
            Url::parse(&self.url).map_err(|e| ValidationError::InvalidStoreUrl(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ValidationError::InvalidStoreUrl(format!(
                "unsupported scheme '{}'",
                other
            ))),
        }
    }

    /// Whether admin credentials were supplied.
    pub fn has_admin_credentials(&self) -> bool {
        !self.admin_email.is_empty() && !self.admin_password.expose_secret().is_empty()
    }

    /// Client settings for [`crate::adapters::PocketBaseClient`].
    pub fn to_pocketbase_config(&self) -> Result<PocketBaseConfig, ValidationError> {
        Ok(PocketBaseConfig::new(self.base_url()?)
            .with_admin_collection(self.admin_collection.clone())
            .with_request_timeout(self.request_timeout()))
    }

    /// Validate store configuration
    ///
    /// In production, requires HTTPS for the store URL.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("STORE__URL"));
        }
        let url = self.base_url()?;

        if environment.is_production() && url.scheme() != "https" {
            return Err(ValidationError::StoreUrlMustBeHttps);
        }
        if self.admin_collection.is_empty() {
            return Err(ValidationError::MissingRequired("STORE__ADMIN_COLLECTION"));
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            admin_email: String::new(),
            admin_password: default_admin_password(),
            admin_collection: default_admin_collection(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_admin_password() -> SecretString {
    SecretString::new(String::new())
}

fn default_admin_collection() -> String {
    DEFAULT_ADMIN_COLLECTION.to_string()
}

fn default_request_timeout() -> u64 {
    10
}
