//! Application configuration module
//!
//! Configuration is loaded from environment variables with the `PB_AUTH`
//! prefix using the `config` and `dotenvy` crates. Nested values use double
//! underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use pocketbase_auth_adapter::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Store at {}", config.store.url);
//! ```

mod environment;
mod error;
mod logging;
mod store;

pub use environment::Environment;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use store::StoreConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Deployment environment
    #[serde(default)]
    pub environment: Environment,

    /// PocketBase connection
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PB_AUTH` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PB_AUTH__STORE__URL=https://pb.example.com` -> `store.url`
    /// - `PB_AUTH__LOGGING__JSON=true` -> `logging.json = true`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PB_AUTH")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.store.validate(&self.environment)?;
        self.logging.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("PB_AUTH__STORE__URL", "http://127.0.0.1:8090");
        env::set_var("PB_AUTH__STORE__ADMIN_EMAIL", "admin@example.com");
        env::set_var("PB_AUTH__STORE__ADMIN_PASSWORD", "correct-horse");
    }

    fn clear_env() {
        env::remove_var("PB_AUTH__STORE__URL");
        env::remove_var("PB_AUTH__STORE__ADMIN_EMAIL");
        env::remove_var("PB_AUTH__STORE__ADMIN_PASSWORD");
        env::remove_var("PB_AUTH__STORE__ADMIN_COLLECTION");
        env::remove_var("PB_AUTH__STORE__REQUEST_TIMEOUT_SECS");
        env::remove_var("PB_AUTH__ENVIRONMENT");
        env::remove_var("PB_AUTH__LOGGING__FILTER");
        env::remove_var("PB_AUTH__LOGGING__JSON");
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.store.url, "http://127.0.0.1:8090");
        assert_eq!(config.store.admin_email, "admin@example.com");
        assert_eq!(config.store.admin_password.expose_secret(), "correct-horse");
    }

    #[test]
    fn test_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.store.admin_collection, "_superusers");
        assert_eq!(config.store.request_timeout_secs, 10);
        assert_eq!(config.logging.filter, "info");
        assert!(!config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PB_AUTH__STORE__ADMIN_COLLECTION", "admins");
        env::set_var("PB_AUTH__STORE__REQUEST_TIMEOUT_SECS", "30");
        env::set_var("PB_AUTH__LOGGING__JSON", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.store.admin_collection, "admins");
        assert_eq!(config.store.request_timeout_secs, 30);
        assert!(config.logging.json);
    }

    #[test]
    fn test_missing_store_url_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn test_production_rejects_plain_http() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PB_AUTH__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
        assert_eq!(config.validate(), Err(ValidationError::StoreUrlMustBeHttps));
    }
}
