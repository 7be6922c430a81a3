//! # Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MESA_HTTP_ADDR=127.0.0.1:9000                                      │
//! │     MESA_JWT_PRIVATE_KEY_PATH=/etc/mesa/private.pem                    │
//! │     (a .env file in the working directory is loaded first)             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ./mesa.toml (optional)                                             │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     0.0.0.0:8080, mesa.db, 36h tokens, 5 connections                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The two key paths have no default; startup fails without them.

use std::net::SocketAddr;
use std::path::PathBuf;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::auth::DEFAULT_TOKEN_LIFETIME_HOURS;

/// Name of the optional config file, without extension.
pub const CONFIG_FILE: &str = "mesa";

/// Prefix of every environment variable read by [`ServerConfig::load`].
pub const ENV_PREFIX: &str = "MESA";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub http_addr: SocketAddr,

    /// SQLite database file
    pub database_path: PathBuf,

    /// PEM file holding the RSA private key used to sign tokens
    pub jwt_private_key_path: PathBuf,

    /// PEM file holding the matching RSA public key
    pub jwt_public_key_path: PathBuf,

    /// Session token lifetime in hours
    pub jwt_lifetime_hours: i64,

    /// Connection pool size
    pub max_connections: u32,
}

impl ServerConfig {
    /// Loads defaults, then `mesa.toml`, then `MESA_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    /// Builds the configuration with a caller-supplied environment source.
    ///
    /// Tests pass `Environment::with_prefix(..).source(Some(map))` so they
    /// never touch the process environment.
    pub fn from_environment(env: Environment) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("http_addr", "0.0.0.0:8080")?
            .set_default("database_path", "mesa.db")?
            .set_default("jwt_lifetime_hours", DEFAULT_TOKEN_LIFETIME_HOURS)?
            .set_default("max_connections", 5)?
            .add_source(
                File::with_name(CONFIG_FILE)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(env.try_parsing(true))
            .build()?;

        let config: ServerConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_lifetime_hours <= 0 {
            return Err(ConfigError::InvalidValue("jwt_lifetime_hours".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        if self.jwt_private_key_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_private_key_path".to_string()));
        }
        if self.jwt_public_key_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_public_key_path".to_string()));
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_defaults_with_required_keys() {
        let config = ServerConfig::from_environment(env(&[
            ("MESA_JWT_PRIVATE_KEY_PATH", "keys/private.pem"),
            ("MESA_JWT_PUBLIC_KEY_PATH", "keys/public.pem"),
        ]))
        .unwrap();

        assert_eq!(config.http_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.database_path, PathBuf::from("mesa.db"));
        assert_eq!(config.jwt_lifetime_hours, 36);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.jwt_private_key_path, PathBuf::from("keys/private.pem"));
    }

    #[test]
    fn test_environment_overrides() {
        let config = ServerConfig::from_environment(env(&[
            ("MESA_JWT_PRIVATE_KEY_PATH", "a.pem"),
            ("MESA_JWT_PUBLIC_KEY_PATH", "b.pem"),
            ("MESA_HTTP_ADDR", "127.0.0.1:9000"),
            ("MESA_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();

        assert_eq!(config.http_addr.port(), 9000);
        assert_eq!(config.max_connections, 12);
    }

    #[test]
    fn test_key_paths_required() {
        let result = ServerConfig::from_environment(env(&[]));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_rejects_non_positive_lifetime() {
        let result = ServerConfig::from_environment(env(&[
            ("MESA_JWT_PRIVATE_KEY_PATH", "a.pem"),
            ("MESA_JWT_PUBLIC_KEY_PATH", "b.pem"),
            ("MESA_JWT_LIFETIME_HOURS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(result, ConfigError::InvalidValue(field) if field == "jwt_lifetime_hours"));
    }
}
