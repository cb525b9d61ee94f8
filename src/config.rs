//! Service configuration read from the environment.

use std::env::VarError;
use std::path::PathBuf;
use std::time::Duration;

use crate::cart::sessions::{DEFAULT_IDLE, DEFAULT_MAX_OPEN};
use crate::checkout::handoff::{DEFAULT_HOST, DEFAULT_NUMBER};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable `{0}`")]
    Missing(String),
    #[error("invalid value for `{var}`: {reason}")]
    Invalid { var: String, reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub database_max_connections: u32,
    pub whatsapp_number: String,
    pub whatsapp_host: String,
    /// Directory for persisted carts; carts live in memory when unset.
    pub cart_storage_dir: Option<PathBuf>,
    /// Most session carts kept open in memory at once.
    pub cart_max_sessions: usize,
    pub cart_idle_timeout: Duration,
    pub nats_url: Option<String>,
}

impl Config {
    /// Loads `.env` when present, then reads the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, ConfigError> { Self::build(|key| std::env::var(key)) }

    pub fn bind_addr(&self) -> String { format!("{}:{}", self.host, self.port) }

    fn build<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let optional = |var: &str| lookup(var).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or_default = |var: &str, default: &str| optional(var).unwrap_or_else(|| default.to_string());
        let invalid = |var: &str, reason: String| ConfigError::Invalid { var: var.to_string(), reason };

        let database_url = optional("DATABASE_URL").ok_or_else(|| ConfigError::Missing("DATABASE_URL".into()))?;
        let port = or_default("PORT", "8083").parse::<u16>().map_err(|e| invalid("PORT", e.to_string()))?;
        let database_max_connections = or_default("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .map_err(|e| invalid("DATABASE_MAX_CONNECTIONS", e.to_string()))?;
        if database_max_connections == 0 {
            return Err(invalid("DATABASE_MAX_CONNECTIONS", "must be at least 1".into()));
        }

        let cart_max_sessions = or_default("CART_MAX_SESSIONS", &DEFAULT_MAX_OPEN.to_string())
            .parse::<usize>()
            .map_err(|e| invalid("CART_MAX_SESSIONS", e.to_string()))?;
        if cart_max_sessions == 0 {
            return Err(invalid("CART_MAX_SESSIONS", "must be at least 1".into()));
        }
        let cart_idle_timeout = or_default("CART_IDLE_SECS", &DEFAULT_IDLE.as_secs().to_string())
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| invalid("CART_IDLE_SECS", e.to_string()))?;

        let whatsapp_number = or_default("WHATSAPP_NUMBER", DEFAULT_NUMBER);
        if !whatsapp_number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("WHATSAPP_NUMBER", "must contain digits only, in international format".into()));
        }

        Ok(Self {
            database_url,
            host: or_default("HOST", "0.0.0.0"),
            port,
            database_max_connections,
            whatsapp_number,
            whatsapp_host: or_default("WHATSAPP_HOST", DEFAULT_HOST),
            cart_storage_dir: optional("CART_STORAGE_DIR").map(PathBuf::from),
            cart_max_sessions,
            cart_idle_timeout,
            nats_url: optional("NATS_URL"),
        })
    }
}
