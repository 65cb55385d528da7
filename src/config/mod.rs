//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using
//! the `config` and `dotenvy` crates. Values are read with the
//! `SUSCRIBOT__` prefix and double underscores as section separators.
//!
//! # Example
//!
//! ```no_run
//! use suscribot_settlement::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod gateways;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use gateways::{
    CryptoSettings, GatewaysConfig, LocalGatewaySettings, StripeSettings,
};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Gateway credentials, rates, and the crypto discount
    pub gateways: GatewaysConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `SUSCRIBOT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `SUSCRIBOT__DATABASE__URL=...` -> `database.url = ...`
    /// - `SUSCRIBOT__GATEWAYS__CRYPTO__DISCOUNT_PERCENT=25` ->
    ///   `gateways.crypto.discount_percent = 25`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or a
    /// value cannot be parsed into its typed field.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SUSCRIBOT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.gateways.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
