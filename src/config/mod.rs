//! Application configuration
//!
//! Loaded from environment variables through the `config` and `dotenvy`
//! crates. Every variable carries the `POPUTCHIKI` prefix and nested values
//! are separated by double underscores:
//!
//! - `POPUTCHIKI__SERVER__PORT=8080` -> `server.port = 8080`
//! - `POPUTCHIKI__REALTIME__OVERFLOW_POLICY=disconnect` -> `realtime.overflow_policy`
//!
//! ```no_run
//! use poputchiki::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod realtime;
mod redis;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use realtime::RealtimeConfig;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// Broker channels and session tokens
    pub redis: RedisConfig,

    #[serde(default)]
    pub realtime: RealtimeConfig,
}

impl AppConfig {
    /// Loads `.env` if present, then reads `POPUTCHIKI__*` variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into their expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("POPUTCHIKI")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic validation of every section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.redis.validate()?;
        self.realtime.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
